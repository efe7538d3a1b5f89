use std::path::Path;

use colored::Colorize;

use crate::error::Result;
use crate::importer::fingerprint;
use crate::session::Session;
use crate::settings::load_settings;
use crate::undo::{UndoLedger, UndoRecord};

pub fn run() -> Result<()> {
    let settings = load_settings();
    println!("Data dir:   {}", settings.data_path().display());
    println!(
        "Workbook:   {}",
        settings.default_workbook.as_deref().unwrap_or("(not set)")
    );

    match Session::load(&settings.session_path())? {
        Some(session) => {
            println!();
            println!("Session started {}", session.created_at.format("%Y-%m-%d %H:%M UTC"));
            for source in &session.sources {
                let changed = match fingerprint(Path::new(&source.path)) {
                    Ok(sum) => sum != source.checksum,
                    Err(_) => true,
                };
                if changed {
                    println!("  {}  {}", source.path, "(changed since merge)".yellow());
                } else {
                    println!("  {}", source.path);
                }
            }
            println!("Merge key:  {}", session.merge_key);
            println!("Matched:    {}", session.matched.len());
            println!("Unmatched:  {}", session.candidates.len());
            println!("Selected:   {}", session.selections.len());
        }
        None => {
            println!();
            println!("No session. Run `weaver merge <file_a> <file_b>` to start.");
        }
    }

    let ledger = UndoLedger::load(&settings.ledger_path())?;
    println!();
    match ledger.last() {
        Some(entry) => {
            let what = match &entry.record {
                UndoRecord::Import { row_count, sheet_name, .. } => {
                    format!("push of {row_count} rows to {sheet_name}")
                }
                UndoRecord::Update { changes } => format!("status update ({} cells)", changes.len()),
            };
            println!(
                "Last change: {what} at {} on {}",
                entry.recorded_at.format("%Y-%m-%d %H:%M UTC"),
                entry.workbook
            );
        }
        None => println!("Last change: (none)"),
    }
    Ok(())
}
