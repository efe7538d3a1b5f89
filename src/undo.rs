//! One-level undo for the last remote mutation.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::a1::CellRange;
use crate::error::{Result, WeaverError};
use crate::store::{InputMode, SheetStore, WritePlan};

/// One overwritten cell. `row` is one-based, `column` zero-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellChange {
    pub sheet: String,
    pub column: usize,
    pub row: usize,
    pub old_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum UndoRecord {
    /// Rows appended at zero-based `start_index`.
    Import {
        sheet_id: u32,
        sheet_name: String,
        start_index: usize,
        row_count: usize,
    },
    Update { changes: Vec<CellChange> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoEntry {
    pub workbook: String,
    pub record: UndoRecord,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoOutcome {
    RemovedRows(usize),
    RestoredRows(usize),
}

impl std::fmt::Display for UndoOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RemovedRows(n) => write!(f, "Undid import of {n} rows."),
            Self::RestoredRows(n) => write!(f, "Undid update of {n} rows."),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoLedger {
    last: Option<UndoEntry>,
}

impl UndoLedger {
    /// Replace whatever was recorded before.
    pub fn record(&mut self, workbook: &str, record: UndoRecord) {
        self.last = Some(UndoEntry {
            workbook: workbook.to_string(),
            record,
            recorded_at: Utc::now(),
        });
    }

    /// Note a mutation of `workbook`. A mutation that cannot be reversed
    /// still discards the previous record.
    pub fn record_mutation(&mut self, workbook: &str, record: Option<UndoRecord>) {
        match record {
            Some(record) => self.record(workbook, record),
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<&UndoEntry> {
        self.last.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Reverse the recorded mutation against `store`. The ledger is emptied
    /// only when the reversal succeeds.
    pub fn undo(&mut self, store: &mut dyn SheetStore) -> Result<UndoOutcome> {
        let entry = self.last.as_ref().ok_or(WeaverError::NothingToUndo)?;
        let workbook = store.describe()?.id;
        if entry.workbook != workbook {
            return Err(WeaverError::Other(format!(
                "The last change was made to {}, not {workbook}",
                entry.workbook
            )));
        }

        let outcome = match &entry.record {
            UndoRecord::Import {
                sheet_id,
                start_index,
                row_count,
                ..
            } => {
                store.delete_rows(*sheet_id, *start_index, start_index + row_count)?;
                UndoOutcome::RemovedRows(*row_count)
            }
            UndoRecord::Update { changes } => {
                let mut plan = WritePlan {
                    mode: InputMode::Raw,
                    ..WritePlan::default()
                };
                for change in changes {
                    plan.push_cell(CellRange::cell(&change.sheet, change.column, change.row), &change.old_value);
                }
                if !plan.is_empty() {
                    store.batch_write(&plan)?;
                }
                let rows: BTreeSet<(&str, usize)> = changes.iter().map(|c| (c.sheet.as_str(), c.row)).collect();
                UndoOutcome::RestoredRows(rows.len())
            }
        };
        self.last = None;
        info!("{outcome}");
        Ok(outcome)
    }

    pub fn load(path: &Path) -> Result<UndoLedger> {
        if !path.exists() {
            return Ok(UndoLedger::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(())
    }
}
