use rusqlite::Connection;

use crate::error::Result;

/// Initialise the scheduler schema in `conn`.
///
/// Creates the `scheduled_jobs` table (idempotent). Jobs are keyed by name,
/// the same key that names their reports folder.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scheduled_jobs (
            name        TEXT    NOT NULL PRIMARY KEY,
            command     TEXT    NOT NULL,
            expression  TEXT    NOT NULL,
            description TEXT    NOT NULL DEFAULT '',
            email       TEXT,
            shell       TEXT,               -- NULL means the configured default
            recurring   INTEGER NOT NULL DEFAULT 1,
            run_count   INTEGER NOT NULL DEFAULT 0,
            done        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT    NOT NULL,
            updated_at  TEXT    NOT NULL
        ) STRICT;
        ",
    )?;
    Ok(())
}
