//! Ticket-export JSON to template-shaped rows.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDateTime};
use log::debug;
use serde_json::Value as Json;

use crate::error::{Result, WeaverError};
use crate::models::{Dataset, Row, Value};
use crate::tickets::ticket_number;

pub const DEFAULT_TEMPLATE: &str = "Client Name,Customer Name,Status,Kolom kosong1,Ticket Category,Module,Detail Module,Created At,Title,Kolom kosong2,Resolved At,Ticket OP";

/// Columns reformatted by [`DateFormat`].
pub const DATE_COLUMNS: [&str; 2] = ["Created At", "Resolved At"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// Leave values as exported.
    #[default]
    Origin,
    /// `07:05 PM`
    Time,
    /// `2024-03-01 19:05`
    Report,
}

fn scalar(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Text(b.to_string()),
        Json::Number(n) => n.as_f64().map(Value::Number).unwrap_or_else(|| Value::Text(n.to_string())),
        Json::String(s) => Value::Text(s.clone()),
        other => Value::Text(other.to_string()),
    }
}

/// Flatten one exported record into a single-level row.
///
/// Nested objects become dotted paths. An array under a `custom_fields`
/// path contributes one `name -> value` entry per element; any other array
/// is kept as its JSON text. A string holding a JSON object is spread into
/// top-level keys.
pub fn flatten_json(value: &Json) -> Row {
    let mut row = Row::new();
    flatten_into(value, "", &mut row);
    row
}

fn flatten_into(value: &Json, path: &str, row: &mut Row) {
    match value {
        Json::Object(map) => {
            for (key, inner) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                match inner {
                    Json::Object(_) | Json::Array(_) => flatten_into(inner, &child, row),
                    Json::String(s) if s.starts_with('{') && s.ends_with('}') => {
                        match serde_json::from_str::<Json>(s) {
                            Ok(Json::Object(embedded)) => {
                                for (k, v) in &embedded {
                                    row.set(k.clone(), scalar(v));
                                }
                            }
                            _ => row.set(child, scalar(inner)),
                        }
                    }
                    _ => row.set(child, scalar(inner)),
                }
            }
        }
        Json::Array(items) if path.ends_with("custom_fields") => {
            for item in items {
                let Some(name) = item.get("name").and_then(Json::as_str) else {
                    continue;
                };
                if let Some(v) = item.get("value") {
                    row.set(name, scalar(v));
                }
            }
        }
        _ if path.is_empty() => {}
        other => row.set(path, scalar(other)),
    }
}

pub fn parse_template(template: &str) -> Vec<String> {
    template.split(',').map(|h| h.trim().to_string()).collect()
}

fn map_status(value: &str) -> Option<&'static str> {
    match value.to_lowercase().as_str() {
        "resolved" => Some("Solved"),
        "open" => Some("L2"),
        "pending" => Some("L1"),
        "on hold" | "on-hold" => Some("L3"),
        _ => None,
    }
}

fn project(flat: &Row, headers: &[String]) -> Row {
    let mut row = Row::new();
    for header in headers {
        let lower = header.to_lowercase();
        if lower.starts_with("kolom kosong") {
            row.set(header.clone(), Value::from(""));
            continue;
        }
        let mut value = flat.get_ci(header).cloned().unwrap_or_else(|| Value::from(""));
        if lower == "status" {
            if let Value::Text(s) = &value {
                if let Some(mapped) = map_status(s) {
                    value = Value::from(mapped);
                }
            }
        }
        row.set(header.clone(), value);
    }
    row
}

fn ticket_order(a: &Row, b: &Row, title_field: &str) -> Ordering {
    let number = |row: &Row| ticket_number(&row.text(title_field)).and_then(|n| n.parse::<u64>().ok());
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Convert exported JSON (one object or an array of them) into rows shaped
/// by `template`, ordered by ticket number with unnumbered rows last.
pub fn convert_json(text: &str, template: &str, title_field: &str) -> Result<Dataset> {
    if text.trim().is_empty() {
        return Err(WeaverError::EmptyFile("JSON input".into()));
    }
    let parsed: Json = serde_json::from_str(text)?;
    let items = match parsed {
        Json::Array(items) => items,
        other => vec![other],
    };
    if items.is_empty() {
        return Err(WeaverError::EmptyFile("JSON array".into()));
    }

    let headers = parse_template(template);
    let mut rows: Vec<Row> = items.iter().map(|item| project(&flatten_json(item), &headers)).collect();
    rows.sort_by(|a, b| ticket_order(a, b, title_field));
    debug!("converted {} records onto {} columns", rows.len(), headers.len());
    Ok(Dataset::new("converted", headers, rows))
}

pub(crate) fn parse_date_time(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    const FORMATS: [&str; 5] = [
        "%B %d, %Y, %I:%M %p",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%m/%d/%Y %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value.trim(), f).ok())
}

/// Reformat a timestamp; values that do not parse are returned unchanged.
pub fn format_date_time(value: &str, format: DateFormat) -> String {
    if value.is_empty() || format == DateFormat::Origin {
        return value.to_string();
    }
    let Some(dt) = parse_date_time(value) else {
        return value.to_string();
    };
    match format {
        DateFormat::Report => dt.format("%Y-%m-%d %H:%M").to_string(),
        DateFormat::Time => dt.format("%I:%M %p").to_string(),
        DateFormat::Origin => value.to_string(),
    }
}

/// Apply `format` to the date columns of every row.
pub fn reformat_dates(dataset: &mut Dataset, format: DateFormat) {
    if format == DateFormat::Origin {
        return;
    }
    for row in &mut dataset.rows {
        for column in DATE_COLUMNS {
            if let Some(Value::Text(s)) = row.get(column) {
                let formatted = format_date_time(s, format);
                row.set(column, Value::from(formatted));
            }
        }
    }
}
