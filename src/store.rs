//! Remote tabular store seam and the CSV-directory workbook the CLI writes to.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::a1::CellRange;
use crate::error::{Result, WeaverError};

/// How written strings are interpreted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Parsed as if typed by a user (numbers, dates, formulas).
    #[default]
    UserEntered,
    /// Stored verbatim.
    Raw,
}

impl InputMode {
    /// The cell text a store keeps for `value`. A leading apostrophe marks
    /// user-entered text as literal and is not stored.
    pub fn stored<'a>(&self, value: &'a str) -> &'a str {
        match self {
            InputMode::UserEntered => value.strip_prefix('\'').unwrap_or(value),
            InputMode::Raw => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeWrite {
    pub range: CellRange,
    pub values: Vec<Vec<String>>,
}

/// A batch of range writes executed as one call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WritePlan {
    pub mode: InputMode,
    pub writes: Vec<RangeWrite>,
}

impl WritePlan {
    pub fn push_cell(&mut self, range: CellRange, value: impl Into<String>) {
        self.writes.push(RangeWrite {
            range,
            values: vec![vec![value.into()]],
        });
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookInfo {
    pub id: String,
    pub title: String,
}

pub trait SheetStore {
    fn describe(&self) -> Result<WorkbookInfo>;

    /// Numeric id of the sheet named `name` (trimmed, case-insensitive).
    fn sheet_id(&self, name: &str) -> Result<Option<u32>>;

    fn read_range(&self, range: &CellRange) -> Result<Vec<Vec<String>>>;

    fn batch_write(&mut self, plan: &WritePlan) -> Result<()>;

    /// Append after the last non-empty row; returns the updated range in A1 notation.
    fn append_rows(&mut self, sheet: &str, rows: &[Vec<String>]) -> Result<String>;

    /// Delete rows `[start, end)`, zero-based.
    fn delete_rows(&mut self, sheet_id: u32, start: usize, end: usize) -> Result<()>;
}

fn map_io(e: io::Error, what: &Path) -> WeaverError {
    match e.kind() {
        io::ErrorKind::NotFound => WeaverError::NotFound(what.display().to_string()),
        io::ErrorKind::PermissionDenied => WeaverError::PermissionDenied(what.display().to_string()),
        _ => WeaverError::Io(e),
    }
}

/// A directory of `<sheet>.csv` files. Sheet ids are positions in name order.
pub struct CsvWorkbook {
    dir: PathBuf,
}

impl CsvWorkbook {
    pub fn open(dir: &Path) -> Result<Self> {
        let meta = std::fs::metadata(dir).map_err(|e| map_io(e, dir))?;
        if !meta.is_dir() {
            return Err(WeaverError::MalformedIdentifier(format!(
                "{} is not a workbook directory",
                dir.display()
            )));
        }
        Ok(Self { dir: dir.to_path_buf() })
    }

    fn sheet_names(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| map_io(e, &self.dir))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn resolve_name(&self, name: &str) -> Result<String> {
        let wanted = name.trim().to_lowercase();
        self.sheet_names()?
            .into_iter()
            .find(|n| n.trim().to_lowercase() == wanted)
            .ok_or_else(|| WeaverError::NotFound(format!("sheet \"{name}\" in {}", self.dir.display())))
    }

    fn sheet_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }

    fn load(&self, name: &str) -> Result<Vec<Vec<String>>> {
        let path = self.sheet_path(name);
        let file = std::fs::File::open(&path).map_err(|e| map_io(e, &path))?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(io::BufReader::new(file));
        let mut rows = Vec::new();
        for record in rdr.records() {
            rows.push(record?.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }

    fn store(&self, name: &str, rows: &[Vec<String>]) -> Result<()> {
        let path = self.sheet_path(name);
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&path)
            .map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(io) => map_io(io, &path),
                other => WeaverError::Other(format!("{other:?}")),
            })?;
        for row in rows {
            if row.is_empty() {
                // csv refuses zero-field records
                wtr.write_record([""])?;
            } else {
                wtr.write_record(row)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }
}

fn trim_trailing_empty(mut row: Vec<String>) -> Vec<String> {
    while row.last().is_some_and(|c| c.is_empty()) {
        row.pop();
    }
    row
}

impl SheetStore for CsvWorkbook {
    fn describe(&self) -> Result<WorkbookInfo> {
        self.sheet_names()?;
        let title = self
            .dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(WorkbookInfo {
            id: self.dir.display().to_string(),
            title,
        })
    }

    fn sheet_id(&self, name: &str) -> Result<Option<u32>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .sheet_names()?
            .iter()
            .position(|n| n.trim().to_lowercase() == wanted)
            .map(|i| i as u32))
    }

    fn read_range(&self, range: &CellRange) -> Result<Vec<Vec<String>>> {
        let name = self.resolve_name(&range.sheet)?;
        let rows = self.load(&name)?;
        let first = range.start_row.unwrap_or(1) - 1;
        let last = range.end_row.unwrap_or(rows.len()).min(rows.len());
        let mut out: Vec<Vec<String>> = rows
            .into_iter()
            .take(last)
            .skip(first)
            .map(|row| {
                let cells = row
                    .into_iter()
                    .skip(range.start_col)
                    .take(range.width())
                    .collect();
                trim_trailing_empty(cells)
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    fn batch_write(&mut self, plan: &WritePlan) -> Result<()> {
        let mut sheets: BTreeMap<String, Vec<Vec<String>>> = BTreeMap::new();
        for write in &plan.writes {
            let name = self.resolve_name(&write.range.sheet)?;
            if !sheets.contains_key(&name) {
                let rows = self.load(&name)?;
                sheets.insert(name.clone(), rows);
            }
            let Some(rows) = sheets.get_mut(&name) else {
                continue;
            };
            let top = write.range.start_row.unwrap_or(1) - 1;
            for (r, values) in write.values.iter().enumerate() {
                let row_idx = top + r;
                if rows.len() <= row_idx {
                    rows.resize(row_idx + 1, Vec::new());
                }
                let row = &mut rows[row_idx];
                for (c, value) in values.iter().enumerate() {
                    let col = write.range.start_col + c;
                    if row.len() <= col {
                        row.resize(col + 1, String::new());
                    }
                    row[col] = plan.mode.stored(value).to_string();
                }
            }
        }
        for (name, rows) in &sheets {
            self.store(name, rows)?;
        }
        debug!("batch write: {} ranges across {} sheets", plan.writes.len(), sheets.len());
        Ok(())
    }

    fn append_rows(&mut self, sheet: &str, rows: &[Vec<String>]) -> Result<String> {
        let name = self.resolve_name(sheet)?;
        let mut existing = self.load(&name)?;
        while existing.last().is_some_and(|r| r.iter().all(String::is_empty)) {
            existing.pop();
        }
        let start = existing.len() + 1;
        existing.extend(rows.iter().cloned());
        self.store(&name, &existing)?;

        let width = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let end = start + rows.len().saturating_sub(1);
        Ok(CellRange::rows(&name, 0, width - 1, start, end).to_string())
    }

    fn delete_rows(&mut self, sheet_id: u32, start: usize, end: usize) -> Result<()> {
        let names = self.sheet_names()?;
        let name = names
            .get(sheet_id as usize)
            .ok_or_else(|| WeaverError::NotFound(format!("sheet id {sheet_id}")))?
            .clone();
        let mut rows = self.load(&name)?;
        if start > end || end > rows.len() {
            return Err(WeaverError::InvalidRange(format!(
                "rows {start}..{end} of \"{name}\" ({} rows)",
                rows.len()
            )));
        }
        rows.drain(start..end);
        self.store(&name, &rows)?;
        debug!("deleted rows {start}..{end} from {name}");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn write_sheet(dir: &Path, name: &str, rows: &[&[&str]]) {
        let mut wtr = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(dir.join(format!("{name}.csv")))
            .unwrap();
        for row in rows {
            wtr.write_record(*row).unwrap();
        }
        wtr.flush().unwrap();
    }

    pub(crate) fn read_sheet(dir: &Path, name: &str) -> Vec<Vec<String>> {
        let wb = CsvWorkbook::open(dir).unwrap();
        wb.load(name).unwrap()
    }

    #[test]
    fn test_open_missing_dir_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvWorkbook::open(&dir.path().join("nope")).err().unwrap();
        assert!(matches!(err, WeaverError::NotFound(_)));
    }

    #[test]
    fn test_describe_and_sheet_ids() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "Summary", &[&["x"]]);
        write_sheet(dir.path(), "All Case", &[&["x"]]);
        let wb = CsvWorkbook::open(dir.path()).unwrap();
        assert!(!wb.describe().unwrap().title.is_empty());
        assert_eq!(wb.sheet_id("all case ").unwrap(), Some(0));
        assert_eq!(wb.sheet_id("Summary").unwrap(), Some(1));
        assert_eq!(wb.sheet_id("Other").unwrap(), None);
    }

    #[test]
    fn test_read_range_slices_columns() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "S", &[&["a", "b", "c", "d"], &["e", "f"], &["", "", "", ""]]);
        let wb = CsvWorkbook::open(dir.path()).unwrap();
        let out = wb.read_range(&CellRange::parse("S!B:C").unwrap()).unwrap();
        assert_eq!(out, vec![vec!["b", "c"], vec!["f"]]);
        let out = wb.read_range(&CellRange::parse("S!A2:D2").unwrap()).unwrap();
        assert_eq!(out, vec![vec!["e", "f"]]);
    }

    #[test]
    fn test_batch_write_extends_grid() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "S", &[&["a"]]);
        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        let mut plan = WritePlan::default();
        plan.push_cell(CellRange::cell("S", 2, 3), "z");
        plan.push_cell(CellRange::cell("S", 0, 1), "A1");
        wb.batch_write(&plan).unwrap();
        let rows = read_sheet(dir.path(), "S");
        assert_eq!(rows[0][0], "A1");
        assert_eq!(rows[2], vec!["", "", "z"]);
    }

    #[test]
    fn test_input_mode_apostrophe() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "S", &[&["a", "b"]]);
        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        let mut plan = WritePlan::default();
        plan.push_cell(CellRange::cell("S", 0, 1), "'007");
        wb.batch_write(&plan).unwrap();
        plan.mode = InputMode::Raw;
        plan.writes.clear();
        plan.push_cell(CellRange::cell("S", 1, 1), "'007");
        wb.batch_write(&plan).unwrap();
        assert_eq!(read_sheet(dir.path(), "S")[0], vec!["007", "'007"]);
    }

    #[test]
    fn test_batch_write_unknown_sheet_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "S", &[&["a"]]);
        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        let mut plan = WritePlan::default();
        plan.push_cell(CellRange::cell("S", 0, 1), "changed");
        plan.push_cell(CellRange::cell("Missing", 0, 1), "x");
        assert!(matches!(wb.batch_write(&plan), Err(WeaverError::NotFound(_))));
        assert_eq!(read_sheet(dir.path(), "S")[0][0], "a");
    }

    #[test]
    fn test_append_reports_range() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "All Case", &[&["h1", "h2"], &["r1", "x"]]);
        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        let range = wb
            .append_rows("All Case", &[vec!["n1".into(), "y".into(), "z".into()], vec!["n2".into()]])
            .unwrap();
        assert_eq!(range, "'All Case'!A3:C4");
        let rows = read_sheet(dir.path(), "All Case");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[3], vec!["n2"]);
    }

    #[test]
    fn test_delete_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_sheet(dir.path(), "S", &[&["0"], &["1"], &["2"], &["3"]]);
        let mut wb = CsvWorkbook::open(dir.path()).unwrap();
        wb.delete_rows(0, 1, 3).unwrap();
        assert_eq!(read_sheet(dir.path(), "S"), vec![vec!["0"], vec!["3"]]);
        assert!(matches!(wb.delete_rows(0, 1, 9), Err(WeaverError::InvalidRange(_))));
        assert!(matches!(wb.delete_rows(5, 0, 1), Err(WeaverError::NotFound(_))));
    }
}
