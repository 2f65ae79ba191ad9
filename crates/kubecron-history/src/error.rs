use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or writing history files.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Reading, creating or writing a history path failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The requested group/label is not in the report index.
    #[error("Report not found: {group}/{label}")]
    ReportNotFound { group: String, label: String },
}

impl HistoryError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| HistoryError::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
