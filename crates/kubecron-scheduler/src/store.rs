use std::path::Path;
use std::sync::Mutex;

use chrono::Local;
use rusqlite::Connection;
use tracing::{debug, info};

use crate::{
    db::init_db,
    error::Result,
    types::JobSpec,
};

/// A persisted job together with its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJob {
    pub spec: JobSpec,
    pub runs: u64,
    pub done: bool,
}

/// SQLite persistence for registered jobs, keyed by job name.
///
/// The connection sits behind a mutex so the store can be shared by the
/// scheduler's timer tasks.
pub struct JobStore {
    conn: Mutex<Connection>,
}

impl JobStore {
    pub fn new(conn: Connection) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    /// Insert `spec`, replacing any row with the same name.
    pub fn insert(&self, spec: &JobSpec) -> Result<()> {
        let conn = self.conn.lock().expect("job store poisoned");
        let now = Local::now().to_rfc3339();
        conn.execute(
            "INSERT OR REPLACE INTO scheduled_jobs
             (name, command, expression, description, email, shell,
              recurring, run_count, done, created_at, updated_at)
             VALUES (?1,?2,?3,?4,?5,?6,?7,0,0,?8,?8)",
            rusqlite::params![
                spec.name(),
                spec.command(),
                spec.expression(),
                spec.description(),
                spec.email(),
                spec.shell(),
                spec.recurring(),
                now
            ],
        )?;
        info!(job = %spec.name(), "job persisted");
        Ok(())
    }

    /// Record progress. The stored count never goes backwards, so runs that
    /// finish out of order keep the highest value.
    pub fn update_progress(&self, name: &str, runs: u64, done: bool) -> Result<()> {
        let conn = self.conn.lock().expect("job store poisoned");
        let runs = i64::try_from(runs).unwrap_or(i64::MAX);
        conn.execute(
            "UPDATE scheduled_jobs
             SET run_count = MAX(run_count, ?1), done = (done OR ?2), updated_at = ?3
             WHERE name = ?4",
            rusqlite::params![runs, done, Local::now().to_rfc3339(), name],
        )?;
        debug!(job = %name, runs, done, "job progress stored");
        Ok(())
    }

    /// Returns `false` when no row matched.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().expect("job store poisoned");
        let n = conn.execute("DELETE FROM scheduled_jobs WHERE name = ?1", [name])?;
        Ok(n > 0)
    }

    /// All stored jobs in name order.
    pub fn list(&self) -> Result<Vec<StoredJob>> {
        let conn = self.conn.lock().expect("job store poisoned");
        let mut stmt = conn.prepare(
            "SELECT name, command, expression, description, email, shell,
                    recurring, run_count, done
             FROM scheduled_jobs ORDER BY name",
        )?;
        let jobs = stmt
            .query_map([], |row| {
                let mut builder = JobSpec::builder(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                )
                .description(row.get::<_, String>(3)?)
                .recurring(row.get::<_, bool>(6)?);
                if let Some(email) = row.get::<_, Option<String>>(4)? {
                    builder = builder.email(email);
                }
                if let Some(shell) = row.get::<_, Option<String>>(5)? {
                    builder = builder.shell(shell);
                }
                Ok(StoredJob {
                    spec: builder.build(),
                    runs: u64::try_from(row.get::<_, i64>(7)?).unwrap_or(0),
                    done: row.get::<_, bool>(8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(jobs)
    }
}
