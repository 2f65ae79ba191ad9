//! Error types for the kubecron-exec crate.

use thiserror::Error;

/// All errors that can originate from running a command.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The interpreter could not be started.
    #[error("Spawn error ({shell}): {reason}")]
    Spawn { shell: String, reason: String },

    /// Underlying I/O failure while collecting output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Command exceeded its time budget and was killed.
    #[error("Command timed out after {ms}ms")]
    Timeout { ms: u64 },
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ExecError>;
