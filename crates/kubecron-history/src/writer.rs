use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use kubecron_core::config::ReportsConfig;
use tokio::sync::Mutex;
use tracing::debug;

use crate::entry::HistoryEntry;
use crate::error::{HistoryError, Result};

/// Prepends rendered history entries to per-day files.
///
/// Each append rewrites the whole day file while holding an async lock keyed
/// by its path. Share one writer (behind an `Arc`) between all jobs.
pub struct HistoryWriter {
    template: String,
    extension: String,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl HistoryWriter {
    pub fn new(template: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            extension: extension.into(),
            locks: DashMap::new(),
        }
    }

    pub fn from_config(config: &ReportsConfig) -> Self {
        Self::new(config.entry_template.clone(), config.extension.clone())
    }

    /// `<dir>/<YYYY-MM-DD>.<ext>`
    pub fn day_file(&self, dir: &Path, date: NaiveDate) -> PathBuf {
        dir.join(format!("{}.{}", date.format("%Y-%m-%d"), self.extension))
    }

    /// Render `entry` and put it in front of the existing content of its day
    /// file under `dir`, creating the folder and file when missing.
    ///
    /// Returns the path written.
    pub async fn append(&self, dir: &Path, entry: &HistoryEntry) -> Result<PathBuf> {
        let path = self.day_file(dir, entry.date());
        let lock = Arc::clone(&*self.locks.entry(path.clone()).or_default());
        let written = {
            let _guard = lock.lock().await;
            self.prepend(dir, &path, entry).await
        };
        drop(lock);
        // Nobody else holds or waits on this path's lock: forget it.
        self.locks
            .remove_if(&path, |_, lock| Arc::strong_count(lock) == 1);
        written
    }

    async fn prepend(&self, dir: &Path, path: &Path, entry: &HistoryEntry) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(HistoryError::io(dir))?;

        let existing = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
            Err(e) => return Err(HistoryError::io(path)(e)),
        };

        let mut content = entry.render(&self.template);
        content.push_str(&existing);
        tokio::fs::write(path, content)
            .await
            .map_err(HistoryError::io(path))?;

        debug!(path = %path.display(), "history entry written");
        Ok(path.to_path_buf())
    }
}
