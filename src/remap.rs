//! Copy columns of one raw grid into another by Excel column letter.

use crate::a1::{column_index, column_letter};
use crate::error::{Result, WeaverError};
use crate::models::Grid;

/// Source column of A copied into target column of B, both zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source: usize,
    pub target: usize,
}

impl std::fmt::Display for ColumnMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", column_letter(self.source), column_letter(self.target))
    }
}

/// Parse `E:C, F:D` into mappings. Blank entries are skipped.
pub fn parse_mappings(raw: &str) -> Result<Vec<ColumnMapping>> {
    let mut mappings = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let invalid = || WeaverError::InvalidRange(format!("column mapping \"{entry}\""));
        let (source, target) = entry.split_once(':').ok_or_else(invalid)?;
        mappings.push(ColumnMapping {
            source: column_index(source.trim()).ok_or_else(invalid)?,
            target: column_index(target.trim()).ok_or_else(invalid)?,
        });
    }
    if mappings.is_empty() {
        return Err(WeaverError::Settings("no column mappings given".into()));
    }
    Ok(mappings)
}

/// Row `i` of `source` fills row `i` of `target` for each mapping. `target`
/// is padded with blank rows up to `source`'s length; cells past the end of
/// a source row are left alone.
pub fn remap_columns(source: &Grid, target: &Grid, mappings: &[ColumnMapping]) -> Grid {
    let mut rows = target.rows.clone();
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    if rows.len() < source.rows.len() {
        rows.resize(source.rows.len(), vec![String::new(); width]);
    }

    for (row_a, row_b) in source.rows.iter().zip(rows.iter_mut()) {
        for mapping in mappings {
            let Some(value) = row_a.get(mapping.source) else {
                continue;
            };
            if row_b.len() <= mapping.target {
                row_b.resize(mapping.target + 1, String::new());
            }
            row_b[mapping.target] = value.clone();
        }
    }

    Grid {
        sheet_name: format!("Normalized_{}", target.sheet_name),
        rows,
    }
}
