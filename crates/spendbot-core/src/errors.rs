use std::path::PathBuf;

/// Core error type shared by the bot and its adapters.
///
/// Adapter crates map their specific errors into this type so the flow runner
/// can turn any failure into a single user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    /// Backend could not be reached or its response could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("report has no records")]
    EmptyReport,

    #[error("report error: {0}")]
    Report(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Status { status: 404, .. })
    }
}

impl From<rust_xlsxwriter::XlsxError> for Error {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Error::Report(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
