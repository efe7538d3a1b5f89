use crate::a1::CellRange;
use crate::cli::open_workbook;
use crate::error::Result;
use crate::settings::load_settings;
use crate::store::SheetStore;

pub fn info(workbook: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let store = open_workbook(workbook, &settings)?;
    let info = store.describe()?;
    println!("Title:      {}", info.title);
    println!("Location:   {}", info.id);

    let layout = &settings.ticket_layout;
    match store.sheet_id(&layout.sheet_name)? {
        Some(id) => {
            let rows = store.read_range(&CellRange::parse(&format!(
                "'{}'!{}:{}",
                layout.sheet_name.replace('\'', "''"),
                layout.title_column,
                layout.title_column
            ))?)?;
            println!("Case sheet: {} (id {id}, {} rows)", layout.sheet_name, rows.len());
        }
        None => println!("Case sheet: \"{}\" not found", layout.sheet_name),
    }
    Ok(())
}
