use crate::cli::split_list;
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(
    merge_key: Option<&str>,
    headers: Option<&str>,
    workbook: Option<&str>,
    template: Option<&str>,
    data_dir: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings();
    let changing = merge_key.is_some() || headers.is_some() || workbook.is_some() || template.is_some() || data_dir.is_some();

    if let Some(key) = merge_key {
        settings.default_merge_key = Some(key.trim().to_string());
    }
    if let Some(raw) = headers {
        settings.default_headers = split_list(raw);
    }
    if let Some(dir) = workbook {
        settings.default_workbook = Some(shellexpand_path(dir));
    }
    if let Some(raw) = template {
        settings.header_template = raw.trim().to_string();
    }
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(dir);
    }
    if changing {
        save_settings(&settings)?;
        println!("Defaults saved.");
    }

    println!(
        "Merge key:  {}",
        settings.default_merge_key.as_deref().unwrap_or("(none)")
    );
    println!("Headers:    {}", settings.default_headers.join(", "));
    println!(
        "Workbook:   {}",
        settings.default_workbook.as_deref().unwrap_or("(not set)")
    );
    println!("Template:   {}", settings.header_template);
    println!("Data dir:   {}", settings.data_dir);
    Ok(())
}
