use thiserror::Error;

#[derive(Debug, Error)]
pub enum KubecronError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl KubecronError {
    /// Short, stable error code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            KubecronError::Config(_) => "CONFIG_ERROR",
            KubecronError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, KubecronError>;
