use std::path::Path;

use comfy_table::Table;

use crate::cli::DateArg;
use crate::convert::{convert_json, reformat_dates};
use crate::error::Result;
use crate::export::write_csv;
use crate::fmt::truncate;
use crate::settings::load_settings;

pub fn run(file: &str, template: Option<&str>, dates: DateArg, output: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let text = std::fs::read_to_string(file)?;
    let template = template.unwrap_or(&settings.header_template);
    let mut dataset = convert_json(&text, template, &settings.ticket_layout.title_field)?;
    reformat_dates(&mut dataset, dates.into());

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
            println!("Converted {} records to {path}", dataset.rows.len());
        }
        None => {
            let mut table = Table::new();
            table.set_header(dataset.headers.clone());
            for row in grid.iter().skip(1) {
                table.add_row(row.iter().map(|c| truncate(c, 30)).collect::<Vec<_>>());
            }
            println!("Converted {} records\n{table}", dataset.rows.len());
        }
    }
    Ok(())
}
