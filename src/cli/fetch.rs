use std::path::Path;

use comfy_table::Table;

use crate::error::Result;
use crate::export::write_csv;
use crate::fetch::fetch_csv_export;
use crate::fmt::truncate;

const PREVIEW_ROWS: usize = 10;

pub fn run(link: &str, output: Option<&str>) -> Result<()> {
    let dataset = fetch_csv_export(link)?;
    let grid: Vec<Vec<String>> = std::iter::once(dataset.headers.clone())
        .chain(
            dataset
                .rows
                .iter()
                .map(|row| dataset.headers.iter().map(|h| row.text(h)).collect()),
        )
        .collect();

    match output {
        Some(path) => {
            write_csv(Path::new(path), &grid)?;
            println!("Saved {} rows to {path}", dataset.rows.len());
        }
        None => {
            let mut table = Table::new();
            table.set_header(dataset.headers.clone());
            for row in grid.iter().skip(1).take(PREVIEW_ROWS) {
                table.add_row(row.iter().map(|c| truncate(c, 30)).collect::<Vec<_>>());
            }
            println!("{} rows, {} columns\n{table}", dataset.rows.len(), dataset.headers.len());
            if dataset.rows.len() > PREVIEW_ROWS {
                println!("Pass --output <file> to save all rows.");
            }
        }
    }
    Ok(())
}
