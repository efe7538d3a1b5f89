use crate::cli::{load_ticket_rows, open_workbook};
use crate::error::Result;
use crate::settings::load_settings;
use crate::store::SheetStore;
use crate::tickets::{push, PushOutcome};
use crate::undo::UndoLedger;

pub fn run(file: &str, workbook: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let mut store = open_workbook(workbook, &settings)?;
    let dataset = load_ticket_rows(file, &settings)?;
    let PushOutcome {
        plan,
        updated_range,
        undo,
    } = push(&mut store, &dataset, &settings.ticket_layout)?;

    match updated_range {
        None => println!("No new data to import."),
        Some(range) => {
            println!("Imported {} rows into {range}.", plan.rows.len());
            let undoable = undo.is_some();
            let mut ledger = UndoLedger::load(&settings.ledger_path())?;
            ledger.record_mutation(&store.describe()?.id, undo);
            ledger.save(&settings.ledger_path())?;
            if undoable {
                println!("Run `weaver undo` to remove them again.");
            } else {
                println!("The appended range could not be read; this import cannot be undone.");
            }
        }
    }
    if !plan.duplicates.is_empty() {
        println!("Skipped {} titles already on the sheet:", plan.duplicates.len());
        for title in &plan.duplicates {
            println!("  {title}");
        }
    }
    if plan.without_title > 0 {
        println!("Skipped {} rows without a title.", plan.without_title);
    }
    Ok(())
}
