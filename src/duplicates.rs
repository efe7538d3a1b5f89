//! Student-number checks across class-list workbooks: numbers used by more
//! than one student, and students missing a number or a birth date.

use std::collections::HashMap;

use log::warn;

use crate::models::Grid;

/// Rows searched for the header row.
const HEADER_SCAN_ROWS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderInfo {
    pub row: usize,
    pub number: usize,
    pub name: usize,
    pub birth_date: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub number: Option<String>,
    pub name: String,
    pub file: String,
    pub sheet: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateReport {
    /// Student numbers used more than once, with every row using them, in
    /// order of first appearance.
    pub duplicates: Vec<(String, Vec<StudentRecord>)>,
    pub missing_number: Vec<StudentRecord>,
    pub missing_birth_date: Vec<StudentRecord>,
    /// `file / sheet` labels skipped because no header row was found.
    pub skipped_sheets: Vec<String>,
}

fn position(headers: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    headers.iter().position(|h| pred(h))
}

fn number_column(headers: &[String]) -> Option<usize> {
    position(headers, |h| h == "nis" || h == "no. induk")
        .or_else(|| position(headers, |h| h.contains("nis") && !h.contains("nisn")))
        .or_else(|| position(headers, |h| h.contains("nis")))
}

fn name_column(headers: &[String]) -> Option<usize> {
    const EXACT: [&str; 3] = ["nama", "nama siswa", "nama lengkap"];
    const NOT_STUDENT: [&str; 6] = ["kelas", "sekolah", "wali", "ayah", "ibu", "orang tua"];
    position(headers, |h| EXACT.contains(&h))
        .or_else(|| position(headers, |h| h.contains("nama") && !NOT_STUDENT.iter().any(|k| h.contains(k))))
        .or_else(|| position(headers, |h| h.contains("nama")))
}

fn birth_date_column(headers: &[String]) -> Option<usize> {
    position(headers, |h| h.contains("tanggal lahir") || h.contains("tgl lahir"))
}

/// First row among the top twenty that names a student-number, a name and
/// a birth-date column.
pub fn find_header_row(rows: &[Vec<String>]) -> Option<HeaderInfo> {
    rows.iter().take(HEADER_SCAN_ROWS).enumerate().find_map(|(i, row)| {
        let headers: Vec<String> = row.iter().map(|h| h.trim().to_lowercase()).collect();
        Some(HeaderInfo {
            row: i,
            number: number_column(&headers)?,
            name: name_column(&headers)?,
            birth_date: birth_date_column(&headers)?,
        })
    })
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.trim()).unwrap_or("")
}

#[derive(Default)]
pub struct DuplicateChecker {
    report: DuplicateReport,
    by_number: HashMap<String, usize>,
    numbered: Vec<(String, Vec<StudentRecord>)>,
}

impl DuplicateChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, file: &str, grid: &Grid) {
        if grid.rows.is_empty() {
            return;
        }
        let Some(header) = find_header_row(&grid.rows) else {
            warn!("no header row found in {file} / {}; skipped", grid.sheet_name);
            self.report.skipped_sheets.push(format!("{file} / {}", grid.sheet_name));
            return;
        };

        for row in grid.rows.iter().skip(header.row + 1) {
            if row.is_empty() {
                continue;
            }
            let number = cell(row, header.number);
            let name = cell(row, header.name);
            let birth_date = cell(row, header.birth_date);

            let number_missing = !number.chars().any(|c| c.is_ascii_digit());
            let name_present = !name.is_empty() && name.to_lowercase() != "nama";
            let birth_date_missing = birth_date.is_empty() || birth_date.starts_with('#');

            let record = |number: Option<&str>| StudentRecord {
                number: number.map(str::to_string),
                name: name.to_string(),
                file: file.to_string(),
                sheet: grid.sheet_name.clone(),
            };
            if name_present && birth_date_missing {
                self.report.missing_birth_date.push(record(None));
            }
            if number_missing {
                if name_present {
                    self.report.missing_number.push(record(None));
                }
                continue;
            }
            let slot = *self.by_number.entry(number.to_string()).or_insert_with(|| {
                self.numbered.push((number.to_string(), Vec::new()));
                self.numbered.len() - 1
            });
            self.numbered[slot].1.push(record(Some(number)));
        }
    }

    pub fn finish(mut self) -> DuplicateReport {
        self.report.duplicates = self
            .numbered
            .into_iter()
            .filter(|(_, records)| records.len() > 1)
            .collect();
        self.report
    }
}

impl DuplicateReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.missing_number.is_empty() && self.missing_birth_date.is_empty()
    }

    /// Plain-text summary suitable for pasting into a message.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if !self.duplicates.is_empty() {
            out.push_str("Duplicated student numbers:\n");
            for (number, records) in &self.duplicates {
                let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
                let mut sheets: Vec<&str> = Vec::new();
                for r in records {
                    if !sheets.contains(&r.sheet.as_str()) {
                        sheets.push(&r.sheet);
                    }
                }
                out.push_str(&format!(
                    "- {number} is used by {} in sheet {}\n",
                    names.join(" and "),
                    sheets.join(", ")
                ));
            }
            out.push('\n');
        }
        if !self.missing_number.is_empty() {
            out.push_str("Students without a number:\n");
            for r in &self.missing_number {
                out.push_str(&format!("- {} sheet {}\n", r.name, r.sheet));
            }
            out.push('\n');
        }
        if !self.missing_birth_date.is_empty() {
            out.push_str("Students without a birth date:\n");
            for r in &self.missing_birth_date {
                out.push_str(&format!("- {} sheet {}\n", r.name, r.sheet));
            }
        }
        let out = out.trim().to_string();
        if out.is_empty() {
            "No problems found.".to_string()
        } else {
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(sheet: &str, rows: &[&[&str]]) -> Grid {
        Grid {
            sheet_name: sheet.to_string(),
            rows: rows.iter().map(|r| r.iter().map(|s| s.to_string()).collect()).collect(),
        }
    }

    fn headers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_number_column_priorities() {
        assert_eq!(number_column(&headers(&["nisn", "no. induk"])), Some(1));
        assert_eq!(number_column(&headers(&["nisn", "nis lokal"])), Some(1));
        assert_eq!(number_column(&headers(&["no", "nisn"])), Some(1));
        assert_eq!(number_column(&headers(&["no", "nama"])), None);
    }

    #[test]
    fn test_name_column_priorities() {
        assert_eq!(name_column(&headers(&["nama ayah", "nama lengkap"])), Some(1));
        assert_eq!(name_column(&headers(&["nama sekolah", "nama peserta didik"])), Some(1));
        assert_eq!(name_column(&headers(&["nama ibu"])), Some(0));
    }

    #[test]
    fn test_find_header_row_below_title() {
        let rows = grid(
            "7A",
            &[&["DAFTAR SISWA"], &[], &["No", "NIS", "NISN", "Nama Siswa", "Tgl Lahir"], &["1", "101", "", "Jane", "2010-01-01"]],
        )
        .rows;
        let info = find_header_row(&rows).unwrap();
        assert_eq!(info, HeaderInfo { row: 2, number: 1, name: 3, birth_date: 4 });
    }

    #[test]
    fn test_report_across_sheets() {
        let header: &[&str] = &["NIS", "Nama", "Tanggal Lahir"];
        let mut checker = DuplicateChecker::new();
        checker.add_sheet(
            "kelas7.xlsx",
            &grid("7A", &[header, &["101", "Jane", "2010-01-01"], &["102", "Budi", ""], &["-", "Ahmad", "2010-02-02"]]),
        );
        checker.add_sheet(
            "kelas7.xlsx",
            &grid("7B", &[header, &["101", "Siti", "#VALUE!"], &["", "", ""], &["103", "nama", ""]]),
        );
        checker.add_sheet("kelas7.xlsx", &grid("Notes", &[&["hello"]]));
        let report = checker.finish();

        assert_eq!(report.duplicates.len(), 1);
        let (number, records) = &report.duplicates[0];
        assert_eq!(number, "101");
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Jane", "Siti"]);

        let missing: Vec<&str> = report.missing_number.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(missing, vec!["Ahmad"]);
        let no_dob: Vec<&str> = report.missing_birth_date.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(no_dob, vec!["Budi", "Siti"]);
        assert_eq!(report.skipped_sheets, vec!["kelas7.xlsx / Notes"]);
        assert!(!report.is_clean());

        let summary = report.summary();
        assert!(summary.starts_with("Duplicated student numbers:\n- 101 is used by Jane and Siti in sheet 7A, 7B"));
        assert!(summary.contains("Students without a number:\n- Ahmad sheet 7A"));
    }

    #[test]
    fn test_clean_report() {
        let mut checker = DuplicateChecker::new();
        checker.add_sheet(
            "a.xlsx",
            &grid("S", &[&["NIS", "Nama", "Tgl Lahir"], &["1", "Jane", "2010-01-01"]]),
        );
        let report = checker.finish();
        assert!(report.is_clean());
        assert_eq!(report.summary(), "No problems found.");
    }
}
