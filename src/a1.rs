//! A1 cell-reference notation: `'All Case'!G5`, `Sheet1!G:T`, `Data!A2:T9`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Result, WeaverError};

/// Zero-based column index to letters: 0 → A, 25 → Z, 26 → AA.
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Column letters to a zero-based index, case-insensitive.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let mut n = 0usize;
    for c in letters.chars() {
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        n = n.checked_mul(26)?.checked_add(digit)?;
    }
    Some(n - 1)
}

/// A rectangular range. Columns are zero-based; rows are one-based, and a
/// missing row means the whole column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: String,
    pub start_col: usize,
    pub start_row: Option<usize>,
    pub end_col: usize,
    pub end_row: Option<usize>,
}

impl CellRange {
    pub fn cell(sheet: &str, col: usize, row: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            start_col: col,
            start_row: Some(row),
            end_col: col,
            end_row: Some(row),
        }
    }

    pub fn columns(sheet: &str, start_col: usize, end_col: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            start_col,
            start_row: None,
            end_col,
            end_row: None,
        }
    }

    pub fn rows(sheet: &str, start_col: usize, end_col: usize, start_row: usize, end_row: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            start_col,
            start_row: Some(start_row),
            end_col,
            end_row: Some(end_row),
        }
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || WeaverError::InvalidRange(raw.to_string());
        let (sheet, cells) = raw.rsplit_once('!').ok_or_else(invalid)?;
        let sheet = sheet
            .strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .map(|s| s.replace("''", "'"))
            .unwrap_or_else(|| sheet.to_string());
        if sheet.is_empty() {
            return Err(invalid());
        }
        let (start, end) = match cells.split_once(':') {
            Some((s, e)) => (s, e),
            None => (cells, cells),
        };
        let (start_col, start_row) = parse_ref(start).ok_or_else(invalid)?;
        let (end_col, end_row) = parse_ref(end).ok_or_else(invalid)?;
        if end_col < start_col || start_row.is_some() != end_row.is_some() {
            return Err(invalid());
        }
        Ok(Self {
            sheet,
            start_col,
            start_row,
            end_col,
            end_row,
        })
    }
}

fn parse_ref(raw: &str) -> Option<(usize, Option<usize>)> {
    let split = raw.find(|c: char| c.is_ascii_digit()).unwrap_or(raw.len());
    let (letters, digits) = raw.split_at(split);
    let col = column_index(letters)?;
    let row = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<usize>().ok().filter(|&r| r > 0)?)
    };
    Some((col, row))
}

fn quote_sheet(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = |col: usize, row: Option<usize>| match row {
            Some(r) => format!("{}{r}", column_letter(col)),
            None => column_letter(col),
        };
        let start = cell(self.start_col, self.start_row);
        let end = cell(self.end_col, self.end_row);
        if start == end {
            write!(f, "{}!{start}", quote_sheet(&self.sheet))
        } else {
            write!(f, "{}!{start}:{end}", quote_sheet(&self.sheet))
        }
    }
}

/// Zero-based first row of an append result such as `'All Case'!A2414:T2416`.
pub fn append_start_index(updated_range: &str) -> Option<usize> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"!A(\d+):").expect("valid regex"));
    let row: usize = re.captures(updated_range)?.get(1)?.as_str().parse().ok()?;
    row.checked_sub(1)
}
