use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::DEFAULT_TEMPLATE;
use crate::error::{Result, WeaverError};
use crate::tickets::TicketLayout;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: String,
    /// Merge key remembered from an earlier session.
    pub default_merge_key: Option<String>,
    pub preferred_merge_key: String,
    pub identity_field: String,
    pub sequence_field: String,
    pub default_headers: Vec<String>,
    pub header_template: String,
    pub ticket_layout: TicketLayout,
    /// Workbook that `tickets`, `push` and `undo` write to.
    pub default_workbook: Option<String>,
    /// Saved `normalize --map` mappings, e.g. `E:C,F:D`.
    pub column_map: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            default_merge_key: None,
            preferred_merge_key: "Nama".to_string(),
            identity_field: "NISN".to_string(),
            sequence_field: "No".to_string(),
            default_headers: ["No", "ID", "Nama", "NISN"].iter().map(|s| s.to_string()).collect(),
            header_template: DEFAULT_TEMPLATE.to_string(),
            ticket_layout: TicketLayout::default(),
            default_workbook: None,
            column_map: None,
        }
    }
}

fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("WEAVER_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("weaver")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("weaver")
}

fn load_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

fn save_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| WeaverError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn load_settings() -> Settings {
    load_from(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_to(&settings_path(), settings)
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.data_dir))
    }

    pub fn session_path(&self) -> PathBuf {
        self.data_path().join("session.json")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_path().join("undo.json")
    }
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            default_merge_key: Some("NISN".to_string()),
            ..Settings::default()
        };
        save_to(&path, &settings).unwrap();
        let loaded = load_from(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.preferred_merge_key, "Nama");
        assert_eq!(s.identity_field, "NISN");
        assert_eq!(s.default_headers, vec!["No", "ID", "Nama", "NISN"]);
        assert_eq!(s.ticket_layout.sheet_name, "All Case");
        assert!(s.default_workbook.is_none());
        assert!(s.column_map.is_none());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "ticket_layout": {"sheet_name": "Cases"}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.sequence_field, "No");
        assert_eq!(s.ticket_layout.sheet_name, "Cases");
        assert_eq!(s.ticket_layout.note_column, "T");
    }

    #[test]
    fn test_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(load_from(&path), Settings::default());
    }

    #[test]
    fn test_paths_under_data_dir() {
        let s = Settings {
            data_dir: "/tmp/weaver-data".to_string(),
            ..Settings::default()
        };
        assert!(s.session_path().ends_with("session.json"));
        assert!(s.ledger_path().ends_with("undo.json"));
    }
}
