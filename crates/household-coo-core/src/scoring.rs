//! Task ranking and spotlight selection.
//!
//! Each dimension is ranked independently, highest score first. The savings
//! dimension only admits tasks with a positive dollar saving. The spotlight
//! picks the top task of each dimension while trying not to show the same
//! task twice.
//!
//! | Dimension  | Candidates                  | Ranked by       |
//! |------------|-----------------------------|-----------------|
//! | importance | open tasks                  | `importance`    |
//! | urgency    | open tasks                  | `urgency`       |
//! | savings    | open tasks with savings > 0 | `savings_score` |

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::feedback::Signal;
use crate::task::{Dimension, Task, MAX_SCORE};

/// Points a single thumbs-up/down moves a score.
pub const FEEDBACK_STEP: u8 = 3;

/// Apply one feedback signal to a task's dimension score (±3, clamped to 0..=100).
pub fn adjust_task_score(task: &Task, dimension: Dimension, signal: Signal) -> Task {
    adjust_task_score_by(task, dimension, signal, FEEDBACK_STEP)
}

/// Like [`adjust_task_score`] with an explicit step size.
pub fn adjust_task_score_by(task: &Task, dimension: Dimension, signal: Signal, step: u8) -> Task {
    let mut updated = task.clone();
    let current = i32::from(task.score(dimension));
    let adjusted = (current + signal.value() * i32::from(step)).clamp(0, i32::from(MAX_SCORE));
    *updated.score_mut(dimension) = adjusted as u8;
    updated
}

/// Tasks ordered by descending ranking score on `dimension`.
///
/// The sort is stable: tasks with equal scores keep their input order.
pub fn sort_by_dimension(tasks: &[Task], dimension: Dimension) -> Vec<Task> {
    let mut sorted = tasks.to_vec();
    sorted.sort_by(|a, b| {
        b.ranking_score(dimension)
            .cmp(&a.ranking_score(dimension))
    });
    sorted
}

/// Whether a task may compete on `dimension`.
pub fn is_candidate(task: &Task, dimension: Dimension) -> bool {
    match dimension {
        Dimension::Savings => task.is_open() && task.has_savings(),
        _ => task.is_open(),
    }
}

/// Candidates for `dimension`, ranked.
pub fn ranked_candidates(tasks: &[Task], dimension: Dimension) -> Vec<Task> {
    let candidates: Vec<Task> = tasks
        .iter()
        .filter(|task| is_candidate(task, dimension))
        .cloned()
        .collect();
    sort_by_dimension(&candidates, dimension)
}

/// Highest-ranked candidate on a single dimension.
pub fn top_task_by_dimension(tasks: &[Task], dimension: Dimension) -> Option<Task> {
    ranked_candidates(tasks, dimension).into_iter().next()
}

/// The three spotlight picks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Spotlight {
    pub importance: Option<Task>,
    pub urgency: Option<Task>,
    pub savings: Option<Task>,
}

impl Spotlight {
    pub fn get(&self, dimension: Dimension) -> Option<&Task> {
        match dimension {
            Dimension::Importance => self.importance.as_ref(),
            Dimension::Urgency => self.urgency.as_ref(),
            Dimension::Savings => self.savings.as_ref(),
        }
    }

    /// Picks in display order, skipping empty slots.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Task)> {
        Dimension::ALL
            .into_iter()
            .filter_map(move |dimension| self.get(dimension).map(|task| (dimension, task)))
    }
}

/// Pick the top open task of each dimension, avoiding repeats.
///
/// Importance picks first, then urgency, then savings. A later dimension
/// skips tasks already picked; when every candidate is taken it falls back
/// to its own top task so that no slot is empty while candidates exist.
pub fn distinct_top_tasks(tasks: &[Task]) -> Spotlight {
    let mut used: HashSet<String> = HashSet::new();
    let mut spotlight = Spotlight::default();

    for dimension in Dimension::ALL {
        let ranked = ranked_candidates(tasks, dimension);
        let pick = ranked
            .iter()
            .find(|task| !used.contains(&task.id))
            .or_else(|| ranked.first())
            .cloned();

        if let Some(ref task) = pick {
            tracing::debug!(dimension = %dimension, task_id = %task.id, "spotlight pick");
            used.insert(task.id.clone());
        }

        match dimension {
            Dimension::Importance => spotlight.importance = pick,
            Dimension::Urgency => spotlight.urgency = pick,
            Dimension::Savings => spotlight.savings = pick,
        }
    }

    spotlight
}
