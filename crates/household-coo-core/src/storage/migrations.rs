//! Schema migrations for the relational record store.
//!
//! Migrations are versioned and applied automatically when opening a
//! [`super::RecordDb`]. The `schema_version` table tracks the current version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: users, tasks, budget transactions and feedback.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id       TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id            TEXT PRIMARY KEY,
            title         TEXT NOT NULL,
            summary       TEXT NOT NULL,
            source_type   TEXT NOT NULL,
            received_at   TEXT NOT NULL,
            due_at        TEXT,
            savings_usd   REAL,
            importance    INTEGER NOT NULL DEFAULT 0,
            urgency       INTEGER NOT NULL DEFAULT 0,
            savings_score INTEGER NOT NULL DEFAULT 0,
            status        TEXT NOT NULL DEFAULT 'open'
        );

        CREATE TABLE IF NOT EXISTS budget_transactions (
            id         TEXT PRIMARY KEY,
            type       TEXT NOT NULL,
            amount_usd REAL NOT NULL,
            ts         TEXT NOT NULL,
            note       TEXT
        );

        CREATE TABLE IF NOT EXISTS feedback (
            id        TEXT PRIMARY KEY,
            task_id   TEXT NOT NULL,
            dimension TEXT NOT NULL,
            signal    INTEGER NOT NULL,
            ts        TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_feedback_task_id ON feedback(task_id);
        CREATE INDEX IF NOT EXISTS idx_budget_transactions_ts ON budget_transactions(ts);",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: action and citation links on tasks, stored as JSON text.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE tasks ADD COLUMN actions TEXT;
         ALTER TABLE tasks ADD COLUMN citations TEXT;",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}
