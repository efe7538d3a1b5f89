use std::collections::HashMap;
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::{Result, WeaverError};
use crate::models::{Dataset, Grid, Row, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn fingerprint(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

fn is_spreadsheet(file_path: &Path) -> bool {
    file_path.extension().and_then(|e| e.to_str()).is_some_and(|e| {
        ["xlsx", "xlsm", "xlsb", "xls", "ods"]
            .iter()
            .any(|ext| e.eq_ignore_ascii_case(ext))
    })
}

fn display_name(file_path: &Path) -> String {
    file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Unique header names: blanks become `__EMPTY`, `__EMPTY_1`, ...; repeats
/// get `_1`, `_2`, ... suffixes.
pub fn unique_headers(raw: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.iter()
        .map(|h| {
            let base = if h.trim().is_empty() {
                "__EMPTY".to_string()
            } else {
                h.trim().to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base.clone()
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn is_empty_cell(value: &Value) -> bool {
    matches!(value, Value::Null) || matches!(value, Value::Text(s) if s.is_empty())
}

/// Header-keyed rows from a grid whose first row is the header. Empty
/// cells are left out of a row; rows with no cells at all are dropped.
fn rows_from_cells(name: &str, cells: Vec<Vec<Value>>) -> Option<Dataset> {
    let mut iter = cells.into_iter();
    let raw: Vec<String> = iter.next()?.iter().map(Value::as_text).collect();
    let headers = unique_headers(&raw);
    let mut rows = Vec::new();
    for record in iter {
        let mut row = Row::new();
        for (header, value) in headers.iter().zip(record) {
            if !is_empty_cell(&value) {
                row.set(header.clone(), value);
            }
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }
    if rows.is_empty() {
        return None;
    }
    Some(Dataset::new(name, headers, rows))
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

fn read_csv_cells(file_path: &Path) -> Result<Vec<Vec<Value>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(file_path)?;
    let mut cells = Vec::new();
    for record in rdr.records() {
        let record = record?;
        cells.push(record.iter().map(Value::from).collect());
    }
    Ok(cells)
}

#[cfg(feature = "xlsx")]
fn read_workbook_cells(file_path: &Path) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
    use calamine::{Data, Reader};

    let mut workbook = calamine::open_workbook_auto(file_path)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let cells = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        Data::Empty => Value::Null,
                        Data::Int(i) => Value::Number(*i as f64),
                        Data::Float(f) => Value::Number(*f),
                        Data::DateTime(dt) => Value::Number(dt.as_f64()),
                        Data::String(s) => Value::Text(s.clone()),
                        other => Value::Text(other.to_string()),
                    })
                    .collect()
            })
            .collect();
        sheets.push((name, cells));
    }
    Ok(sheets)
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook_cells(file_path: &Path) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
    Err(WeaverError::Other(format!(
        "{} is a spreadsheet; rebuild with the \"xlsx\" feature to read it",
        file_path.display()
    )))
}

fn read_sheets(file_path: &Path) -> Result<Vec<(String, Vec<Vec<Value>>)>> {
    if is_spreadsheet(file_path) {
        read_workbook_cells(file_path)
    } else {
        Ok(vec![(display_name(file_path), read_csv_cells(file_path)?)])
    }
}

/// Load the first sheet holding at least one data row as a dataset.
pub fn load_dataset(file_path: &Path) -> Result<Dataset> {
    for (sheet, cells) in read_sheets(file_path)? {
        if let Some(mut dataset) = rows_from_cells(&sheet, cells) {
            dataset.name = display_name(file_path);
            debug!(
                "{}: sheet \"{sheet}\", {} columns, {} rows",
                dataset.name,
                dataset.headers.len(),
                dataset.rows.len()
            );
            return Ok(dataset);
        }
    }
    Err(WeaverError::EmptyFile(file_path.display().to_string()))
}

/// Every sheet of the file as a raw grid of cell texts.
pub fn load_sheets(file_path: &Path) -> Result<Vec<Grid>> {
    Ok(read_sheets(file_path)?
        .into_iter()
        .map(|(sheet_name, cells)| Grid {
            sheet_name,
            rows: cells
                .iter()
                .map(|row| row.iter().map(Value::as_text).collect())
                .collect(),
        })
        .collect())
}

/// Load the first sheet with any non-empty cell as a raw grid.
pub fn load_grid(file_path: &Path) -> Result<Grid> {
    load_sheets(file_path)?
        .into_iter()
        .find(|grid| grid.rows.iter().flatten().any(|c| !c.trim().is_empty()))
        .ok_or_else(|| WeaverError::EmptyFile(file_path.display().to_string()))
}

/// Drop rows that already carry an identity value (anything other than
/// blank or `-`). Returns how many were removed.
pub fn drop_identified_rows(dataset: &mut Dataset, identity_field: &str) -> usize {
    let before = dataset.rows.len();
    dataset.rows.retain(|row| {
        let id = row.text_ci(identity_field);
        let id = id.trim();
        id.is_empty() || id == "-"
    });
    before - dataset.rows.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_unique_headers() {
        let raw: Vec<String> = ["Nama", "", "Nama", " ", "NISN", "Nama"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            unique_headers(&raw),
            vec!["Nama", "__EMPTY", "Nama_1", "__EMPTY_1", "NISN", "Nama_2"]
        );
    }

    #[test]
    fn test_load_csv_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "siswa.csv", "No,Nama,NISN\n1,Jane Doe,0012\n,,\n2,Budi,\n");
        let ds = load_dataset(&path).unwrap();
        assert_eq!(ds.name, "siswa.csv");
        assert_eq!(ds.headers, vec!["No", "Nama", "NISN"]);
        assert_eq!(ds.rows.len(), 2);
        assert_eq!(ds.rows[0].text("NISN"), "0012");
        assert!(ds.rows[1].get("NISN").is_none());
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "empty.csv", "No,Nama\n");
        assert!(matches!(load_dataset(&path), Err(WeaverError::EmptyFile(_))));
        let path = write_csv(dir.path(), "blank.csv", "");
        assert!(matches!(load_grid(&path), Err(WeaverError::EmptyFile(_))));
    }

    #[test]
    fn test_load_grid_keeps_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "grid.csv", "Daftar Siswa\n\nNo,NIS,Nama\n1,123,Jane\n");
        let grid = load_grid(&path).unwrap();
        assert_eq!(grid.sheet_name, "grid.csv");
        assert_eq!(grid.rows[0], vec!["Daftar Siswa"]);
        // csv skips blank lines
        assert_eq!(grid.rows[1], vec!["No", "NIS", "Nama"]);
        assert_eq!(grid.rows[2][2], "Jane");
    }

    #[test]
    fn test_drop_identified_rows() {
        let mut ds = Dataset::new(
            "b",
            vec!["nama".into(), "nisn".into()],
            vec![
                Row::from_pairs([("nama", "A"), ("nisn", "123")]),
                Row::from_pairs([("nama", "B"), ("nisn", "-")]),
                Row::from_pairs([("nama", "C"), ("nisn", " ")]),
                Row::from_pairs([("nama", "D")]),
            ],
        );
        assert_eq!(drop_identified_rows(&mut ds, "NISN"), 1);
        let names: Vec<String> = ds.rows.iter().map(|r| r.text("nama")).collect();
        assert_eq!(names, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_csv(dir.path(), "a.csv", "x\n1\n");
        let first = fingerprint(&a).unwrap();
        assert_eq!(first.len(), 64);
        std::fs::write(&a, "x\n2\n").unwrap();
        assert_ne!(fingerprint(&a).unwrap(), first);
    }
}
