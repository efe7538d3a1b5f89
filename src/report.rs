//! Daily case report over converted ticket rows.

use chrono::{NaiveDate, NaiveDateTime};

use crate::convert::parse_date_time;
use crate::models::Row;
use crate::tickets::TicketLayout;

pub const CLIENT_FIELD: &str = "Client Name";
pub const MODULE_FIELD: &str = "Detail Module";
pub const CREATED_FIELD: &str = "Created At";

const UNRESOLVED: [&str; 5] = ["l1", "l2", "l3", "pending", "on hold"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyReport {
    pub total: usize,
    pub escalated_l1: usize,
    pub escalated_l2: usize,
    pub escalated_l3: usize,
    pub pending: usize,
    pub solved: usize,
    /// `Client Title Status` for open cases that name a client and a title.
    pub unresolved: Vec<String>,
    /// `Client Title` for solved cases that name a client and a title.
    pub solved_cases: Vec<String>,
    pub trending_client: Option<String>,
    /// Most frequent detail module among the trending client's rows.
    pub trending_case: Option<String>,
    pub latest_entry: Option<NaiveDateTime>,
}

/// Most frequent non-empty value of `field`; ties keep the value seen first.
fn most_frequent<'a>(rows: impl Iterator<Item = &'a Row>, field: &str) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in rows {
        let value = row.text_ci(field);
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value, 1)),
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (value, count) in counts {
        if best.as_ref().map_or(true, |(_, n)| count > *n) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

fn join_parts(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn daily_report(rows: &[Row], layout: &TicketLayout) -> DailyReport {
    let mut report = DailyReport {
        total: rows.len(),
        ..Default::default()
    };

    for row in rows {
        let status = row.text_ci(&layout.status_field);
        let lower = status.trim().to_lowercase();
        match lower.as_str() {
            "l1" => report.escalated_l1 += 1,
            "l2" => report.escalated_l2 += 1,
            "l3" => report.escalated_l3 += 1,
            "pending" | "on hold" => report.pending += 1,
            "solved" => report.solved += 1,
            _ => {}
        }

        let client = row.text_ci(CLIENT_FIELD);
        let title = row.text_ci(&layout.title_field);
        if client.is_empty() || title.is_empty() {
            continue;
        }
        if UNRESOLVED.contains(&lower.as_str()) {
            report.unresolved.push(join_parts(&[client.as_str(), title.as_str(), status.as_str()]));
        } else if lower == "solved" {
            report.solved_cases.push(join_parts(&[client.as_str(), title.as_str()]));
        }
    }

    report.trending_client = most_frequent(rows.iter(), CLIENT_FIELD);
    if let Some(client) = &report.trending_client {
        let own = rows.iter().filter(|r| r.text_ci(CLIENT_FIELD) == *client);
        report.trending_case = most_frequent(own, MODULE_FIELD);
    }
    report.latest_entry = rows
        .iter()
        .filter_map(|r| parse_date_time(&r.text_ci(CREATED_FIELD)))
        .max();
    report
}

fn numbered(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return empty.to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

impl DailyReport {
    /// Plain-text report dated `today`, ready to paste into a chat.
    pub fn render(&self, today: NaiveDate) -> String {
        let na = || "N/A".to_string();
        let latest = self
            .latest_entry
            .map(|t| t.format("%I:%M %p").to_string())
            .unwrap_or_else(na);
        format!(
            "Case report {} (update last entry time {latest})\n\n\
             Total cases: {}\n\
             Escalated L1: {}\n\
             Escalated L2: {}\n\
             Escalated L3: {}\n\
             Pending: {}\n\
             Solved: {}\n\
             Client Trend: {}\n\
             Case Trend: {}\n\n\
             Summary of unresolved case details:\n{}\n\n\
             Solved cases:\n{}",
            today.format("%d/%m/%Y"),
            self.total,
            self.escalated_l1,
            self.escalated_l2,
            self.escalated_l3,
            self.pending,
            self.solved,
            self.trending_client.clone().unwrap_or_else(na),
            self.trending_case.clone().unwrap_or_else(na),
            numbered(&self.unresolved, "No unresolved cases."),
            numbered(&self.solved_cases, "No solved cases yet."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(client: &str, title: &str, status: &str, module: &str, created: &str) -> Row {
        Row::from_pairs([
            ("Client Name", client),
            ("Title", title),
            ("Status", status),
            ("Detail Module", module),
            ("Created At", created),
        ])
    }

    fn sample() -> Vec<Row> {
        vec![
            ticket("Acme", "Printer #1", "L1", "Hardware", "2024-03-01 09:15"),
            ticket("Acme", "Login #2", "Solved", "Auth", "2024-03-01 14:40"),
            ticket("Beta", "Sync #3", "on hold", "Sync", "March 01, 2024, 11:05 AM"),
            ticket("Acme", "Scanner #4", "L3", "Hardware", "not a date"),
            ticket("", "Orphan #5", "L2", "", ""),
        ]
    }

    #[test]
    fn test_status_counts() {
        let report = daily_report(&sample(), &TicketLayout::default());
        assert_eq!(report.total, 5);
        assert_eq!(
            (report.escalated_l1, report.escalated_l2, report.escalated_l3),
            (1, 1, 1)
        );
        assert_eq!(report.pending, 1);
        assert_eq!(report.solved, 1);
    }

    #[test]
    fn test_case_lists_need_client_and_title() {
        let report = daily_report(&sample(), &TicketLayout::default());
        assert_eq!(
            report.unresolved,
            vec!["Acme Printer #1 L1", "Beta Sync #3 on hold", "Acme Scanner #4 L3"]
        );
        assert_eq!(report.solved_cases, vec!["Acme Login #2"]);
    }

    #[test]
    fn test_trends_and_latest_entry() {
        let report = daily_report(&sample(), &TicketLayout::default());
        assert_eq!(report.trending_client.as_deref(), Some("Acme"));
        assert_eq!(report.trending_case.as_deref(), Some("Hardware"));
        let latest = report.latest_entry.unwrap();
        assert_eq!(latest.format("%H:%M").to_string(), "14:40");
    }

    #[test]
    fn test_trend_ties_keep_first_seen() {
        let rows = vec![
            ticket("Beta", "A #1", "L1", "Sync", ""),
            ticket("Acme", "B #2", "L1", "Auth", ""),
        ];
        let report = daily_report(&rows, &TicketLayout::default());
        assert_eq!(report.trending_client.as_deref(), Some("Beta"));
        assert_eq!(report.trending_case.as_deref(), Some("Sync"));
        assert_eq!(report.latest_entry, None);
    }

    #[test]
    fn test_render_empty() {
        let report = daily_report(&[], &TicketLayout::default());
        let text = report.render(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(text.starts_with("Case report 01/03/2024 (update last entry time N/A)"));
        assert!(text.contains("Client Trend: N/A"));
        assert!(text.contains("Summary of unresolved case details:\nNo unresolved cases."));
        assert!(text.ends_with("Solved cases:\nNo solved cases yet."));
    }

    #[test]
    fn test_render_numbers_cases() {
        let report = daily_report(&sample(), &TicketLayout::default());
        let text = report.render(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(text.contains("(update last entry time 02:40 PM)"));
        assert!(text.contains("1. Acme Printer #1 L1\n2. Beta Sync #3 on hold"));
        assert!(text.contains("Solved cases:\n1. Acme Login #2"));
    }
}
