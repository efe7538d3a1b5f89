use chrono::{Local, NaiveDate};

use crate::cli::load_ticket_rows;
use crate::error::Result;
use crate::report::daily_report;
use crate::settings::load_settings;

pub fn run(file: &str, date: Option<NaiveDate>) -> Result<()> {
    let settings = load_settings();
    let dataset = load_ticket_rows(file, &settings)?;
    let report = daily_report(&dataset.rows, &settings.ticket_layout);
    let today = date.unwrap_or_else(|| Local::now().date_naive());
    println!("{}", report.render(today));
    Ok(())
}
