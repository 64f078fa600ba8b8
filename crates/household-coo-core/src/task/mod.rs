//! Household task model.
//!
//! A task is an actionable item extracted from an email or chat message and
//! scored on three independent dimensions. Tasks are never deleted; they move
//! from `open` to `done` or `dismissed`.

pub mod fixtures;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Highest value any dimension score may take.
pub const MAX_SCORE: u8 = 100;

/// Ranking axis for tasks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Importance,
    Urgency,
    Savings,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Importance, Dimension::Urgency, Dimension::Savings];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Importance => "importance",
            Dimension::Urgency => "urgency",
            Dimension::Savings => "savings",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "importance" | "important" => Ok(Dimension::Importance),
            "urgency" | "urgent" => Ok(Dimension::Urgency),
            "savings" | "saving" => Ok(Dimension::Savings),
            other => Err(ValidationError::InvalidValue {
                field: "dimension".into(),
                message: format!("'{other}' is not one of importance, urgency, savings"),
            }),
        }
    }
}

/// Where a task was extracted from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Gmail,
    Whatsapp,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Gmail => "gmail",
            SourceType::Whatsapp => "whatsapp",
        }
    }
}

impl FromStr for SourceType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gmail" => Ok(SourceType::Gmail),
            "whatsapp" => Ok(SourceType::Whatsapp),
            other => Err(ValidationError::InvalidValue {
                field: "source_type".into(),
                message: format!("'{other}' is not one of gmail, whatsapp"),
            }),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Open,
    Done,
    Dismissed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::Done => "done",
            TaskStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskStatus::Open),
            "done" => Ok(TaskStatus::Done),
            "dismissed" => Ok(TaskStatus::Dismissed),
            other => Err(ValidationError::InvalidValue {
                field: "status".into(),
                message: format!("'{other}' is not one of open, done, dismissed"),
            }),
        }
    }
}

/// Deep link that lets the user act on a task (open the email, the portal).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub label: String,
    pub url: String,
}

/// Reference shown alongside instructions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// A household task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub source_type: SourceType,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_at: Option<DateTime<Utc>>,
    /// Only set for savings opportunities; bills and expenses leave it empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_usd: Option<f64>,
    pub importance: u8,
    pub urgency: u8,
    /// Only meaningful when `savings_usd` is positive.
    pub savings_score: u8,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
}

impl Task {
    /// Raw score on a dimension.
    pub fn score(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::Importance => self.importance,
            Dimension::Urgency => self.urgency,
            Dimension::Savings => self.savings_score,
        }
    }

    pub(crate) fn score_mut(&mut self, dimension: Dimension) -> &mut u8 {
        match dimension {
            Dimension::Importance => &mut self.importance,
            Dimension::Urgency => &mut self.urgency,
            Dimension::Savings => &mut self.savings_score,
        }
    }

    /// True when the task carries a positive dollar saving.
    pub fn has_savings(&self) -> bool {
        self.savings_usd.is_some_and(|usd| usd > 0.0)
    }

    /// Score used for ordering.
    ///
    /// Tasks without a saving rank below every savings candidate (-1).
    pub fn ranking_score(&self, dimension: Dimension) -> i32 {
        match dimension {
            Dimension::Savings if !self.has_savings() => -1,
            _ => i32::from(self.score(dimension)),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }

    /// Check required fields and score ranges.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".into()));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingField("title".into()));
        }
        if self.summary.trim().is_empty() {
            return Err(ValidationError::MissingField("summary".into()));
        }
        for dimension in Dimension::ALL {
            let value = self.score(dimension);
            if value > MAX_SCORE {
                return Err(ValidationError::ScoreOutOfRange {
                    field: dimension.as_str().into(),
                    value: i64::from(value),
                });
            }
        }
        if let Some(usd) = self.savings_usd {
            if !usd.is_finite() || usd < 0.0 {
                return Err(ValidationError::InvalidValue {
                    field: "savings_usd".into(),
                    message: format!("{usd} is not a non-negative amount"),
                });
            }
        }
        Ok(())
    }
}

/// Partial update applied by [`crate::store::Store::update_task`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub status: Option<TaskStatus>,
    pub received_at: Option<DateTime<Utc>>,
    pub due_at: Option<DateTime<Utc>>,
    pub importance: Option<u8>,
    pub urgency: Option<u8>,
    pub savings_score: Option<u8>,
}

impl TaskPatch {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Apply the set fields to `task`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if let Some(ref summary) = self.summary {
            task.summary = summary.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(received_at) = self.received_at {
            task.received_at = received_at;
        }
        if let Some(due_at) = self.due_at {
            task.due_at = Some(due_at);
        }
        if let Some(v) = self.importance {
            task.importance = v.min(MAX_SCORE);
        }
        if let Some(v) = self.urgency {
            task.urgency = v.min(MAX_SCORE);
        }
        if let Some(v) = self.savings_score {
            task.savings_score = v.min(MAX_SCORE);
        }
    }
}
