use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{load_ticket_rows, open_workbook};
use crate::error::Result;
use crate::fmt::truncate;
use crate::settings::load_settings;
use crate::store::SheetStore;
use crate::tickets::{apply_status_update, preview as preview_changes, StatusChange, TicketDiff};
use crate::undo::UndoLedger;

fn or_empty(s: &str) -> &str {
    if s.is_empty() {
        "(empty)"
    } else {
        s
    }
}

fn print_changes(changes: &[StatusChange]) {
    let mut table = Table::new();
    table.set_header(vec!["Row", "Title", "Status", "Ticket OP"]);
    for c in changes {
        let status = if c.old_status == c.new_status {
            c.new_status.clone()
        } else {
            format!("{} -> {}", or_empty(&c.old_status).strikethrough(), c.new_status.bold())
        };
        let note = if c.old_note == c.new_note {
            c.new_note.clone()
        } else {
            format!("{} -> {}", or_empty(&c.old_note).strikethrough(), c.new_note.bold())
        };
        table.add_row(vec![
            Cell::new(c.row),
            Cell::new(truncate(&c.title, 50)),
            Cell::new(status),
            Cell::new(note),
        ]);
    }
    println!("{table}");
}

fn print_skips(diff: &TicketDiff) {
    if diff.without_number > 0 {
        println!("{} rows have no #number in their title.", diff.without_number);
    }
    if diff.not_on_sheet > 0 {
        println!("{} tickets are not on the case sheet.", diff.not_on_sheet);
    }
}

pub fn preview(file: &str, workbook: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let store = open_workbook(workbook, &settings)?;
    let dataset = load_ticket_rows(file, &settings)?;
    let diff = preview_changes(&store, &dataset.rows, &settings.ticket_layout)?;

    if diff.changes.is_empty() {
        println!("No changes detected. Everything is up to date.");
    } else {
        println!("{} rows would change:", diff.changes.len());
        print_changes(&diff.changes);
    }
    print_skips(&diff);
    Ok(())
}

pub fn apply(file: &str, workbook: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let mut store = open_workbook(workbook, &settings)?;
    let dataset = load_ticket_rows(file, &settings)?;
    let update = apply_status_update(&mut store, &dataset.rows, &settings.ticket_layout)?;

    match update.undo {
        Some(record) => {
            let mut ledger = UndoLedger::load(&settings.ledger_path())?;
            ledger.record(&store.describe()?.id, record);
            ledger.save(&settings.ledger_path())?;
            println!("Updated {} rows:", update.diff.changes.len());
            print_changes(&update.diff.changes);
            println!("Run `weaver undo` to revert.");
        }
        None => println!("No changes detected. Everything is up to date."),
    }
    print_skips(&update.diff);
    Ok(())
}
