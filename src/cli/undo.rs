use crate::cli::open_workbook;
use crate::error::Result;
use crate::settings::load_settings;
use crate::undo::UndoLedger;

pub fn run(workbook: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let path = settings.ledger_path();
    let mut ledger = UndoLedger::load(&path)?;
    let mut store = open_workbook(workbook, &settings)?;
    let outcome = ledger.undo(&mut store)?;
    ledger.save(&path)?;
    println!("{outcome}");
    Ok(())
}
