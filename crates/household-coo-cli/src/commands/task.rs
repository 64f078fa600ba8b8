//! Task inspection and triage commands.

use clap::Subcommand;
use household_coo_core::{Dimension, Signal, Task, TaskStatus};

use super::open_store;

#[derive(Subcommand)]
pub enum TaskAction {
    /// List tasks
    List {
        /// Filter by status (open, done or dismissed)
        #[arg(long)]
        status: Option<TaskStatus>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Get task details
    Get {
        /// Task ID
        id: String,
    },
    /// Mark a task done
    Done {
        /// Task ID
        id: String,
    },
    /// Dismiss a task
    Dismiss {
        /// Task ID
        id: String,
    },
    /// Nudge a task's score up or down on one dimension
    Feedback {
        /// Task ID
        id: String,
        /// importance, urgency or savings
        dimension: Dimension,
        /// up or down (also +1 or -1)
        #[arg(allow_hyphen_values = true)]
        signal: Signal,
    },
}

fn print_row(task: &Task) {
    let due = task
        .due_at
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".into());
    println!(
        "{:<6} {:<10} I{:>3} U{:>3} S{:>3}  due {:<16}  {}",
        task.id,
        task.status.as_str(),
        task.importance,
        task.urgency,
        task.savings_score,
        due,
        task.title
    );
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        TaskAction::List { status, json } => {
            let tasks: Vec<&Task> = store
                .tasks()
                .iter()
                .filter(|task| status.map_or(true, |s| task.status == s))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in tasks {
                    print_row(task);
                }
            }
        }
        TaskAction::Get { id } => {
            let task = store.task(&id)?;
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Done { id } => {
            let task = store.mark_task_done(&id)?;
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Dismiss { id } => {
            let task = store.dismiss_task(&id)?;
            println!("{}", serde_json::to_string_pretty(task)?);
        }
        TaskAction::Feedback {
            id,
            dimension,
            signal,
        } => {
            let task = store.submit_feedback(&id, dimension, signal)?;
            println!("{dimension}: {}", task.score(dimension));
        }
    }
    Ok(())
}
