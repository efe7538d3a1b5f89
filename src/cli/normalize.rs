use std::path::{Path, PathBuf};

use crate::error::{Result, WeaverError};
use crate::export::write_csv;
use crate::importer::load_grid;
use crate::remap::{parse_mappings, remap_columns};
use crate::settings::{load_settings, save_settings};

pub fn run(file_a: &str, file_b: &str, map: Option<&str>, save: bool, output: Option<&str>) -> Result<()> {
    let mut settings = load_settings();
    let raw = map
        .or(settings.column_map.as_deref())
        .ok_or_else(|| WeaverError::Settings("no column mappings; pass --map, e.g. --map E:C,F:D".into()))?
        .to_string();
    let mappings = parse_mappings(&raw)?;
    if save {
        settings.column_map = Some(raw);
        save_settings(&settings)?;
    }

    let a = load_grid(Path::new(file_a))?;
    let b = load_grid(Path::new(file_b))?;
    let result = remap_columns(&a, &b, &mappings);

    let path = output.map(PathBuf::from).unwrap_or_else(|| {
        let stem = Path::new(file_b)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("data");
        settings.data_path().join(format!("Normalized_{stem}.csv"))
    });
    write_csv(&path, &result.rows)?;

    let applied: Vec<String> = mappings.iter().map(ToString::to_string).collect();
    println!(
        "Copied {} from {} rows into {} ({} rows)",
        applied.join(", "),
        a.rows.len(),
        path.display(),
        result.rows.len()
    );
    Ok(())
}
