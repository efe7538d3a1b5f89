//! Spreadsheet share links and their CSV export.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, WeaverError};
use crate::models::{Dataset, Row, Value};

/// The document id inside a `.../spreadsheets/d/<id>/...` share link.
pub fn spreadsheet_id(link: &str) -> Result<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid regex"));
    re.captures(link)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| WeaverError::MalformedIdentifier(format!("not a spreadsheet share link: {link}")))
}

pub fn csv_export_url(link: &str) -> Result<String> {
    let id = spreadsheet_id(link)?;
    Ok(format!("https://docs.google.com/spreadsheets/d/{id}/export?format=csv"))
}

/// Parse a CSV export: first record is the header, quoted fields may hold
/// commas, values are trimmed and rows with no non-empty value dropped.
pub fn parse_csv_export(name: &str, text: &str) -> Result<Dataset> {
    if text.trim().is_empty() {
        return Err(WeaverError::EmptyFile(name.to_string()));
    }
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.trim().as_bytes());
    let mut records = rdr.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
        None => return Err(WeaverError::EmptyFile(name.to_string())),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record?;
        let row = Row::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), Value::from(record.get(i).unwrap_or("").trim()))),
        );
        if row.iter().any(|(_, v)| !v.is_blank()) {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        return Err(WeaverError::EmptyFile(format!("{name} has no data after the header row")));
    }
    Ok(Dataset::new(name, headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit#gid=0";

    #[test]
    fn test_spreadsheet_id() {
        assert_eq!(spreadsheet_id(LINK).unwrap(), "1AbC-d_9");
        assert!(matches!(
            spreadsheet_id("https://example.com/sheet"),
            Err(WeaverError::MalformedIdentifier(_))
        ));
    }

    #[test]
    fn test_csv_export_url() {
        assert_eq!(
            csv_export_url(LINK).unwrap(),
            "https://docs.google.com/spreadsheets/d/1AbC-d_9/export?format=csv"
        );
    }

    #[test]
    fn test_parse_quoted_commas() {
        let text = "No,Nama,Alamat\r\n1,Jane Doe,\"Jl. Merdeka, 5\"\r\n2, Budi ,\r\n";
        let ds = parse_csv_export("sheet", text).unwrap();
        assert_eq!(ds.headers, vec!["No", "Nama", "Alamat"]);
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0].text("Alamat"), "Jl. Merdeka, 5");
        assert_eq!(ds.rows[1].text("Nama"), "Budi");
        assert_eq!(ds.rows[1].text("Alamat"), "");
    }

    #[test]
    fn test_parse_drops_blank_rows() {
        let text = "A,B\n,\n1,2\n , \n";
        let ds = parse_csv_export("sheet", text).unwrap();
        assert_eq!(ds.rows.len(), 1);
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        assert!(matches!(parse_csv_export("s", "A,B\n"), Err(WeaverError::EmptyFile(_))));
        assert!(matches!(parse_csv_export("s", "\n"), Err(WeaverError::EmptyFile(_))));
    }
}
