//! Ticket-status reconciliation against the case sheet, and appending new
//! tickets to it.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::a1::{append_start_index, column_index, CellRange};
use crate::error::{Result, WeaverError};
use crate::models::{Dataset, Row};
use crate::store::{InputMode, SheetStore, WritePlan};
use crate::undo::{CellChange, UndoRecord};

/// Where the case sheet keeps each field, and what local rows call them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketLayout {
    pub sheet_name: String,
    pub status_column: String,
    pub title_column: String,
    pub note_column: String,
    pub data_start_column: String,
    pub title_field: String,
    pub status_field: String,
    pub note_field: String,
}

impl Default for TicketLayout {
    fn default() -> Self {
        Self {
            sheet_name: "All Case".into(),
            status_column: "G".into(),
            title_column: "M".into(),
            note_column: "T".into(),
            data_start_column: "E".into(),
            title_field: "Title".into(),
            status_field: "Status".into(),
            note_field: "Ticket OP".into(),
        }
    }
}

/// Zero-based column indexes resolved from a [`TicketLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    status: usize,
    title: usize,
    note: usize,
    data_start: usize,
}

impl TicketLayout {
    fn columns(&self) -> Result<Columns> {
        let col = |letters: &str| {
            column_index(letters.trim())
                .ok_or_else(|| WeaverError::Settings(format!("invalid column \"{letters}\" in ticket layout")))
        };
        Ok(Columns {
            status: col(&self.status_column)?,
            title: col(&self.title_column)?,
            note: col(&self.note_column)?,
            data_start: col(&self.data_start_column)?,
        })
    }
}

/// The digits of the first `#<digits>` in `title`.
pub fn ticket_number(title: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"#(\d+)").expect("valid regex"));
    re.captures(title).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// A case-sheet row carrying a ticket number.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteTicket {
    /// One-based sheet row.
    pub row: usize,
    pub title: String,
    pub status: String,
    pub note: String,
}

/// Index the case sheet by ticket number. A number appearing on several
/// rows resolves to the last one.
pub fn index_remote(store: &dyn SheetStore, layout: &TicketLayout) -> Result<HashMap<String, RemoteTicket>> {
    let cols = layout.columns()?;
    let first = cols.status.min(cols.title).min(cols.note);
    let last = cols.status.max(cols.title).max(cols.note);
    let rows = store.read_range(&CellRange::columns(&layout.sheet_name, first, last))?;

    let cell = |row: &[String], col: usize| row.get(col - first).cloned().unwrap_or_default();
    let mut index = HashMap::new();
    for (i, row) in rows.iter().enumerate() {
        let title = cell(row, cols.title);
        let Some(number) = ticket_number(&title) else {
            continue;
        };
        let ticket = RemoteTicket {
            row: i + 1,
            status: cell(row, cols.status),
            note: cell(row, cols.note),
            title: title.clone(),
        };
        if let Some(prev) = index.insert(number.to_string(), ticket) {
            debug!("ticket #{number} on rows {} and {}, keeping the latter", prev.row, i + 1);
        }
    }
    debug!("indexed {} tickets from {}", index.len(), layout.sheet_name);
    Ok(index)
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub title: String,
    pub row: usize,
    pub old_status: String,
    pub new_status: String,
    pub old_note: String,
    pub new_note: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketDiff {
    pub changes: Vec<StatusChange>,
    /// Local rows whose title has no ticket number.
    pub without_number: usize,
    /// Local rows whose ticket number is not on the sheet.
    pub not_on_sheet: usize,
}

/// Compare local rows with the indexed sheet; only rows where the status or
/// note differs produce a change.
pub fn diff_tickets(local: &[Row], remote: &HashMap<String, RemoteTicket>, layout: &TicketLayout) -> TicketDiff {
    let mut diff = TicketDiff::default();
    for row in local {
        let title = row.text(&layout.title_field);
        let Some(number) = ticket_number(&title) else {
            diff.without_number += 1;
            continue;
        };
        let Some(ticket) = remote.get(number) else {
            diff.not_on_sheet += 1;
            continue;
        };
        let new_status = row.text(&layout.status_field);
        let new_note = row.text(&layout.note_field);
        if ticket.status != new_status || ticket.note != new_note {
            diff.changes.push(StatusChange {
                title: ticket.title.clone(),
                row: ticket.row,
                old_status: ticket.status.clone(),
                new_status,
                old_note: ticket.note.clone(),
                new_note,
            });
        }
    }
    if diff.without_number > 0 {
        warn!("{} rows have no #number in their title and were skipped", diff.without_number);
    }
    diff
}

/// Read the sheet and diff `local` against it.
pub fn preview(store: &dyn SheetStore, local: &[Row], layout: &TicketLayout) -> Result<TicketDiff> {
    if local.is_empty() {
        return Err(WeaverError::EmptyFile("no rows to compare".into()));
    }
    let remote = index_remote(store, layout)?;
    Ok(diff_tickets(local, &remote, layout))
}

/// One batched write covering both fields of every change, plus the record
/// that restores the previous values.
pub fn plan_status_update(changes: &[StatusChange], layout: &TicketLayout) -> Result<(WritePlan, UndoRecord)> {
    let cols = layout.columns()?;
    let mut plan = WritePlan {
        mode: InputMode::UserEntered,
        writes: Vec::with_capacity(changes.len() * 2),
    };
    let mut undo = Vec::with_capacity(changes.len() * 2);
    for change in changes {
        let cells = [
            (cols.status, &change.old_status, &change.new_status),
            (cols.note, &change.old_note, &change.new_note),
        ];
        for (col, old, new) in cells {
            plan.push_cell(CellRange::cell(&layout.sheet_name, col, change.row), new.as_str());
            undo.push(CellChange {
                sheet: layout.sheet_name.clone(),
                column: col,
                row: change.row,
                old_value: old.clone(),
                new_value: new.clone(),
            });
        }
    }
    Ok((plan, UndoRecord::Update { changes: undo }))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusUpdate {
    pub diff: TicketDiff,
    pub undo: Option<UndoRecord>,
}

/// Diff, then write every change in a single batch. Nothing is written and
/// no undo record is produced when nothing changed.
pub fn apply_status_update(store: &mut dyn SheetStore, local: &[Row], layout: &TicketLayout) -> Result<StatusUpdate> {
    let diff = preview(store, local, layout)?;
    if diff.changes.is_empty() {
        info!("status update: no changes");
        return Ok(StatusUpdate { diff, undo: None });
    }
    let (plan, undo) = plan_status_update(&diff.changes, layout)?;
    store.batch_write(&plan)?;
    info!("status update: {} rows written", diff.changes.len());
    Ok(StatusUpdate { diff, undo: Some(undo) })
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushPlan {
    pub rows: Vec<Vec<String>>,
    pub titles: Vec<String>,
    /// Titles already on the sheet.
    pub duplicates: Vec<String>,
    pub without_title: usize,
}

/// Lay out the rows of `dataset` whose title is not in `existing_titles`.
///
/// Columns before `data_start_column` stay blank, the dataset's headers
/// (minus the note field) follow in order, and the note lands in
/// `note_column`, or right after the data if the data reaches past it.
pub fn plan_push(dataset: &Dataset, existing_titles: &HashSet<String>, layout: &TicketLayout) -> Result<PushPlan> {
    let cols = layout.columns()?;
    let note_key = layout.note_field.to_lowercase();
    let main: Vec<&str> = dataset
        .headers
        .iter()
        .filter(|h| h.to_lowercase() != note_key)
        .map(String::as_str)
        .collect();
    let note_col = cols.note.max(cols.data_start + main.len());

    let mut plan = PushPlan::default();
    for row in &dataset.rows {
        let title = row.text(&layout.title_field);
        if title.is_empty() {
            plan.without_title += 1;
            continue;
        }
        if existing_titles.contains(&title) {
            plan.duplicates.push(title);
            continue;
        }
        let mut cells = vec![String::new(); note_col + 1];
        for (i, header) in main.iter().enumerate() {
            cells[cols.data_start + i] = row.text(header);
        }
        cells[note_col] = row.text(&layout.note_field);
        plan.rows.push(cells);
        plan.titles.push(title);
    }
    Ok(plan)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushOutcome {
    pub plan: PushPlan,
    pub updated_range: Option<String>,
    pub undo: Option<UndoRecord>,
}

/// Append the rows of `dataset` that are not yet on the case sheet.
pub fn push(store: &mut dyn SheetStore, dataset: &Dataset, layout: &TicketLayout) -> Result<PushOutcome> {
    let cols = layout.columns()?;
    let sheet_id = store
        .sheet_id(&layout.sheet_name)?
        .ok_or_else(|| WeaverError::NotFound(format!("sheet \"{}\"", layout.sheet_name)))?;

    let existing: HashSet<String> = store
        .read_range(&CellRange::columns(&layout.sheet_name, cols.title, cols.title))?
        .into_iter()
        .flatten()
        .collect();
    let plan = plan_push(dataset, &existing, layout)?;
    if plan.rows.is_empty() {
        info!("push: nothing new ({} duplicates)", plan.duplicates.len());
        return Ok(PushOutcome { plan, ..Default::default() });
    }

    let updated_range = store.append_rows(&layout.sheet_name, &plan.rows)?;
    let undo = match append_start_index(&updated_range) {
        Some(start_index) => Some(UndoRecord::Import {
            sheet_id,
            sheet_name: layout.sheet_name.clone(),
            start_index,
            row_count: plan.rows.len(),
        }),
        None => {
            warn!("could not read the start row from {updated_range}; push cannot be undone");
            None
        }
    };
    info!("push: {} rows appended at {updated_range}", plan.rows.len());
    Ok(PushOutcome {
        plan,
        updated_range: Some(updated_range),
        undo,
    })
}
