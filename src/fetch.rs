use std::time::Duration;

use log::debug;
use reqwest::StatusCode;

use crate::error::{Result, WeaverError};
use crate::links::{csv_export_url, parse_csv_export};
use crate::models::Dataset;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Download the CSV export behind a share link and parse it.
pub fn fetch_csv_export(link: &str) -> Result<Dataset> {
    let url = csv_export_url(link)?;
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?;

    debug!("GET {url}");
    let response = client.get(&url).send()?;
    match response.status() {
        StatusCode::NOT_FOUND => return Err(WeaverError::NotFound(link.to_string())),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            return Err(WeaverError::PermissionDenied(format!(
                "{link} (share it as \"Anyone with the link\")"
            )))
        }
        status if !status.is_success() => {
            return Err(WeaverError::Other(format!("fetching {link} failed with status {status}")))
        }
        _ => {}
    }
    let text = response.text()?;
    parse_csv_export("sheet", &text)
}
