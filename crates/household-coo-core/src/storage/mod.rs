mod config;
pub mod database;
pub mod migrations;
pub mod records;

pub use config::{BudgetConfig, Config, InstructionsConfig, IntegrationsConfig, ScoringConfig};
pub use database::Database;
pub use records::{FeedbackRecord, RecordDb, SnapshotSummary, User};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Versioned keys of the key/value store.
pub mod keys {
    /// Application state: tasks, integrations, last refresh.
    pub const APP_STATE: &str = "household-coo:v2";
    /// Budget state and ledger.
    pub const BUDGET: &str = "household-coo:budget:v2";
    /// Append-only feedback log.
    pub const FEEDBACK: &str = "household-coo:feedback:v2";
}

/// Returns the data directory, creating it if needed.
///
/// `HOUSEHOLD_COO_HOME` overrides the location. Otherwise it is
/// `~/.config/household-coo[-dev]/`, with `HOUSEHOLD_COO_ENV=dev` selecting
/// the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("HOUSEHOLD_COO_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HOUSEHOLD_COO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("household-coo-dev")
            } else {
                base_dir.join("household-coo")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
