use std::path::Path;

use crate::error::{Result, WeaverError};
use crate::session::Session;

const LABELLED: [&str; 3] = ["id", "name", "nisn"];

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The two header rows of an export. Identifier columns are lower-cased in
/// the first row and repeated capitalised in the second; every other column
/// keeps its name in the first row and is blank in the second.
pub fn header_rows(headers: &[String]) -> [Vec<String>; 2] {
    let first = headers
        .iter()
        .map(|h| {
            let lower = h.to_lowercase();
            if LABELLED.contains(&lower.as_str()) {
                lower
            } else {
                h.clone()
            }
        })
        .collect();
    let second = headers
        .iter()
        .map(|h| {
            if LABELLED.contains(&h.to_lowercase().as_str()) {
                capitalize(h)
            } else {
                String::new()
            }
        })
        .collect();
    [first, second]
}

/// Header rows followed by the session's matched rows projected onto `headers`.
pub fn export_grid(session: &Session, headers: &[String]) -> Result<Vec<Vec<String>>> {
    if session.matched.is_empty() {
        return Err(WeaverError::EmptyFile("no merged rows to export".into()));
    }
    let [first, second] = header_rows(headers);
    let mut grid = vec![first, second];
    grid.extend(session.result_table(headers));
    Ok(grid)
}

pub fn write_csv(path: &Path, grid: &[Vec<String>]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in grid {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, Row};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_header_rows() {
        let [first, second] = header_rows(&strings(&["No", "ID", "Nama", "nisn", "Name"]));
        assert_eq!(first, vec!["No", "id", "Nama", "nisn", "name"]);
        assert_eq!(second, vec!["", "ID", "", "Nisn", "Name"]);
    }

    fn session() -> Session {
        let reference = Dataset::new(
            "a",
            strings(&["Nama", "NISN"]),
            vec![Row::from_pairs([("Nama", "Jane Doe"), ("NISN", "1")])],
        );
        let incoming = Dataset::new(
            "b",
            strings(&["Nama", "ID"]),
            vec![Row::from_pairs([("Nama", "Jane Doe"), ("ID", "99")])],
        );
        Session::start(reference, incoming, "Nama", "NISN", "No").unwrap()
    }

    #[test]
    fn test_export_grid_and_write() {
        let s = session();
        let headers = strings(&["No", "ID", "Nama", "NISN"]);
        let grid = export_grid(&s, &headers).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2], vec!["1", "99", "Jane Doe", "1"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("merged.csv");
        write_csv(&path, &grid).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("No,id,Nama,nisn\n,ID,,NISN\n1,99,Jane Doe,1\n"));
    }

    #[test]
    fn test_export_without_matches_fails() {
        let mut s = session();
        s.matched.clear();
        assert!(matches!(export_grid(&s, &strings(&["No"])), Err(WeaverError::EmptyFile(_))));
    }
}
