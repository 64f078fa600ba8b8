//! Relational record store: users, tasks, budget transactions, feedback.
//!
//! The key/value [`super::Database`] is what the app runs on; this store
//! keeps the same data in queryable tables. [`RecordDb::snapshot`] mirrors an
//! [`AppState`] into it.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;

use super::data_dir;
use super::migrations;
use crate::budget::{BudgetTx, TxType};
use crate::error::{DatabaseError, Result, ValidationError};
use crate::feedback::{FeedbackItem, Signal};
use crate::money::Usd;
use crate::store::AppState;
use crate::task::{Action, Citation, Dimension, SourceType, Task, TaskStatus};

// === Helper Functions ===

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_enum<T: std::str::FromStr>(value: &str, column: usize) -> Result<T, rusqlite::Error>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Links are stored as JSON text; unreadable text reads as no links.
fn parse_links<T: for<'de> Deserialize<'de>>(raw: Option<String>) -> Vec<T> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn links_json<T: Serialize>(links: &[T]) -> Result<Option<String>> {
    if links.is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::to_string(links)?))
    }
}

fn row_to_task(row: &rusqlite::Row) -> Result<Task, rusqlite::Error> {
    let source: String = row.get(3)?;
    let status: String = row.get(10)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        summary: row.get(2)?,
        source_type: parse_enum::<SourceType>(&source, 3)?,
        received_at: parse_datetime_fallback(&row.get::<_, String>(4)?),
        due_at: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_datetime_fallback(&s)),
        savings_usd: row.get(6)?,
        importance: row.get(7)?,
        urgency: row.get(8)?,
        savings_score: row.get(9)?,
        status: parse_enum::<TaskStatus>(&status, 10)?,
        actions: parse_links::<Action>(row.get(11)?),
        citations: parse_links::<Citation>(row.get(12)?),
    })
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Account row. Passwords are stored salted and hashed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
}

/// Stored feedback row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub id: String,
    #[serde(flatten)]
    pub item: FeedbackItem,
}

/// Row counts written by [`RecordDb::snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub tasks: usize,
    pub transactions: usize,
    pub feedback: usize,
}

/// SQLite database holding the relational schema.
pub struct RecordDb {
    conn: Connection,
}

impl RecordDb {
    /// Open the record database at `<data_dir>/records.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("records.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn schema_version(&self) -> i32 {
        migrations::get_schema_version(&self.conn)
    }

    // === Users ===

    /// Create a user with a unique username.
    pub fn create_user(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::MissingField("username".into()).into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("password".into()).into());
        }
        let taken: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        if taken.is_some() {
            return Err(ValidationError::InvalidValue {
                field: "username".into(),
                message: format!("'{username}' is already taken"),
            }
            .into());
        }

        let id = Uuid::new_v4().to_string();
        let salt = Uuid::new_v4().simple().to_string();
        let stored = format!("{salt}${}", hash_password(&salt, password));
        self.conn.execute(
            "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
            params![id, username, stored],
        )?;
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    /// Check a username/password pair.
    pub fn verify_user(&self, username: &str, password: &str) -> Result<Option<User>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT id, password FROM users WHERE username = ?1",
                params![username],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((id, stored)) = row else {
            return Ok(None);
        };
        let Some((salt, digest)) = stored.split_once('$') else {
            return Ok(None);
        };
        if hash_password(salt, password) == digest {
            Ok(Some(User {
                id,
                username: username.to_string(),
            }))
        } else {
            Ok(None)
        }
    }

    // === Tasks ===

    /// Insert or replace a task.
    pub fn upsert_task(&self, task: &Task) -> Result<()> {
        task.validate()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (
                id, title, summary, source_type, received_at, due_at, savings_usd,
                importance, urgency, savings_score, status, actions, citations
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                task.id,
                task.title,
                task.summary,
                task.source_type.as_str(),
                task.received_at.to_rfc3339(),
                task.due_at.map(|dt| dt.to_rfc3339()),
                task.savings_usd,
                task.importance,
                task.urgency,
                task.savings_score,
                task.status.as_str(),
                links_json(&task.actions)?,
                links_json(&task.citations)?,
            ],
        )?;
        Ok(())
    }

    pub fn get_task(&self, id: &str) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                "SELECT id, title, summary, source_type, received_at, due_at, savings_usd,
                        importance, urgency, savings_score, status, actions, citations
                 FROM tasks WHERE id = ?1",
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// All tasks, newest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, summary, source_type, received_at, due_at, savings_usd,
                    importance, urgency, savings_score, status, actions, citations
             FROM tasks ORDER BY received_at DESC, id ASC",
        )?;
        let tasks = stmt
            .query_map([], row_to_task)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    // === Budget transactions ===

    pub fn record_transaction(&self, tx: &BudgetTx) -> Result<()> {
        if !tx.amount_usd.is_positive() {
            return Err(ValidationError::InvalidValue {
                field: "amount_usd".into(),
                message: format!("{} must be greater than zero", tx.amount_usd),
            }
            .into());
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO budget_transactions (id, type, amount_usd, ts, note)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                tx.id,
                tx.tx_type.as_str(),
                tx.amount_usd.dollars(),
                tx.ts.to_rfc3339(),
                tx.note,
            ],
        )?;
        Ok(())
    }

    /// All transactions, newest first.
    pub fn list_transactions(&self) -> Result<Vec<BudgetTx>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, type, amount_usd, ts, note FROM budget_transactions ORDER BY ts DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let tx_type: String = row.get(1)?;
                Ok(BudgetTx {
                    id: row.get(0)?,
                    tx_type: match tx_type.as_str() {
                        "add" => TxType::Add,
                        _ => TxType::Spend,
                    },
                    amount_usd: Usd::from_dollars(row.get(2)?),
                    ts: parse_datetime_fallback(&row.get::<_, String>(3)?),
                    note: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // === Feedback ===

    pub fn record_feedback(&self, item: &FeedbackItem) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO feedback (id, task_id, dimension, signal, ts) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                item.task_id,
                item.dimension.as_str(),
                i8::from(item.signal),
                item.ts.to_rfc3339(),
            ],
        )?;
        Ok(id)
    }

    /// All feedback, oldest first.
    pub fn list_feedback(&self) -> Result<Vec<FeedbackRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, task_id, dimension, signal, ts FROM feedback ORDER BY ts ASC")?;
        let rows = stmt
            .query_map([], |row| {
                let dimension: String = row.get(2)?;
                let signal: i8 = row.get(3)?;
                Ok(FeedbackRecord {
                    id: row.get(0)?,
                    item: FeedbackItem {
                        task_id: row.get(1)?,
                        dimension: parse_enum::<Dimension>(&dimension, 2)?,
                        signal: Signal::try_from(signal).map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                3,
                                rusqlite::types::Type::Integer,
                                Box::new(e),
                            )
                        })?,
                        ts: parse_datetime_fallback(&row.get::<_, String>(4)?),
                    },
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // === Snapshot ===

    /// Mirror an app state into the tables.
    ///
    /// Tasks and transactions are upserted by id; the feedback table is
    /// replaced with the state's log. Runs in one transaction.
    pub fn snapshot(&self, state: &AppState) -> Result<SnapshotSummary> {
        let tx = self.conn.unchecked_transaction()?;

        for task in &state.tasks {
            self.upsert_task(task)?;
        }
        for entry in &state.budget.ledger {
            self.record_transaction(entry)?;
        }
        self.conn.execute("DELETE FROM feedback", [])?;
        for item in &state.feedback {
            self.record_feedback(item)?;
        }

        tx.commit()?;
        let summary = SnapshotSummary {
            tasks: state.tasks.len(),
            transactions: state.budget.ledger.len(),
            feedback: state.feedback.len(),
        };
        tracing::info!(?summary, "snapshot written");
        Ok(summary)
    }
}
