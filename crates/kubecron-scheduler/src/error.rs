use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// An active job already uses the name, or its reports folder exists.
    #[error("Cron job with name '{name}' already exists or existed. Please choose another name.")]
    DuplicateJobName { name: String },

    /// The cron expression could not be parsed.
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// The job definition itself is unusable (e.g. a name that is not a
    /// single path component).
    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// No active job with the given name exists.
    #[error("Job not found: {name}")]
    JobNotFound { name: String },

    /// The job's reports folder could not be created.
    #[error("Cannot create reports folder {}: {source}", .path.display())]
    ReportsFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
