//! Thumbs-up/down feedback on task scores.
//!
//! Every signal is appended to a log kept under its own storage key. The log
//! is a record of what the user said; scoring only uses the immediate nudge
//! applied in [`crate::scoring::adjust_task_score`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::storage::{keys, Database};
use crate::task::Dimension;

/// Thumbs up (+1) or thumbs down (-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Signal {
    Up,
    Down,
}

impl Signal {
    pub fn value(self) -> i32 {
        match self {
            Signal::Up => 1,
            Signal::Down => -1,
        }
    }
}

impl TryFrom<i8> for Signal {
    type Error = ValidationError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Signal::Up),
            -1 => Ok(Signal::Down),
            other => Err(ValidationError::InvalidValue {
                field: "signal".into(),
                message: format!("{other} is not 1 or -1"),
            }),
        }
    }
}

impl From<Signal> for i8 {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Up => 1,
            Signal::Down => -1,
        }
    }
}

impl FromStr for Signal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "+1" | "1" | "+" => Ok(Signal::Up),
            "down" | "-1" | "-" => Ok(Signal::Down),
            other => Err(ValidationError::InvalidValue {
                field: "signal".into(),
                message: format!("'{other}' is not up or down"),
            }),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Up => f.write_str("up"),
            Signal::Down => f.write_str("down"),
        }
    }
}

/// One recorded feedback event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackItem {
    pub task_id: String,
    pub dimension: Dimension,
    pub signal: Signal,
    pub ts: DateTime<Utc>,
}

/// Append-only feedback log backed by the key/value store.
pub struct FeedbackLog<'a> {
    db: &'a Database,
}

impl<'a> FeedbackLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All recorded feedback, oldest first. Unreadable data yields an empty log.
    pub fn items(&self) -> Result<Vec<FeedbackItem>> {
        Ok(self
            .db
            .load_json::<Vec<FeedbackItem>>(keys::FEEDBACK)?
            .unwrap_or_default())
    }

    /// Append a signal stamped with the current time.
    pub fn submit(&self, task_id: &str, dimension: Dimension, signal: Signal) -> Result<FeedbackItem> {
        let item = FeedbackItem {
            task_id: task_id.to_string(),
            dimension,
            signal,
            ts: Utc::now(),
        };
        let mut items = self.items()?;
        items.push(item.clone());
        self.db.save_json(keys::FEEDBACK, &items)?;
        Ok(item)
    }

    pub fn clear(&self) -> Result<()> {
        self.db.kv_remove(keys::FEEDBACK)?;
        Ok(())
    }
}
