use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeaverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[cfg(feature = "fetch")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Merge key \"{key}\" not found in {file}")]
    MissingMergeKey { key: String, file: &'static str },

    #[error("Required \"{0}\" header not found in File A")]
    MissingIdentityField(String),

    #[error("File B needs a column whose name contains \"id\"")]
    MissingIdColumn,

    #[error("The two files have no column in common")]
    NoCommonColumn,

    #[error("No data found in {0}")]
    EmptyFile(String),

    #[error("No unmatched row with key \"{0}\"")]
    UnknownCandidate(String),

    #[error("No eligible File A row with value \"{0}\"")]
    UnknownTarget(String),

    #[error("No merge session found. Run `weaver merge` first.")]
    NoSession,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, WeaverError>;
