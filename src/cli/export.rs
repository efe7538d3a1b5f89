use std::path::PathBuf;

use crate::cli::{load_session, split_list};
use crate::error::Result;
use crate::export::{export_grid, write_csv};
use crate::session::merged_headers;
use crate::settings::load_settings;

pub fn run(output: Option<&str>, headers: Option<&str>, all: bool) -> Result<()> {
    let settings = load_settings();
    let session = load_session(&settings)?;

    let columns = if all {
        merged_headers(&session.reference, &session.incoming, &session.sequence_field)
    } else {
        match headers {
            Some(raw) => split_list(raw),
            None => settings.default_headers.clone(),
        }
    };
    let grid = export_grid(&session, &columns)?;

    let path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.data_path().join("Merged_Data.csv"));
    write_csv(&path, &grid)?;
    println!("Exported {} rows to {}", session.matched.len(), path.display());
    Ok(())
}
