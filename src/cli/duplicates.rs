use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::duplicates::DuplicateChecker;
use crate::error::Result;
use crate::importer::load_sheets;

pub fn run(files: &[String]) -> Result<()> {
    let mut checker = DuplicateChecker::new();
    for file in files {
        let path = Path::new(file);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file.as_str());
        for grid in load_sheets(path)? {
            checker.add_sheet(name, &grid);
        }
    }
    let report = checker.finish();

    if !report.duplicates.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["NIS", "Name", "File", "Sheet"]);
        for (number, records) in &report.duplicates {
            for r in records {
                table.add_row(vec![
                    Cell::new(number.red()),
                    Cell::new(&r.name),
                    Cell::new(&r.file),
                    Cell::new(&r.sheet),
                ]);
            }
        }
        println!("Duplicated student numbers\n{table}");
    }
    for label in &report.skipped_sheets {
        println!("{} no header row in {label}", "skipped:".yellow());
    }

    println!("\n{}", report.summary());
    Ok(())
}
