//! # Household COO Core Library
//!
//! Business logic for the household task-triage dashboard. Every operation is
//! available through the `household-coo` CLI, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Tasks**: the task model, validation and the demo fixtures
//! - **Scoring**: per-dimension ranking, feedback nudges and the three-card spotlight
//! - **Budget**: the AI-credit balance and its capped transaction ledger
//! - **Instructions**: paid, simulated step-by-step help for a task
//! - **Storage**: SQLite key/value persistence, relational records and TOML configuration
//!
//! ## Key Components
//!
//! - [`Store`]: application state and every dashboard operation
//! - [`Database`]: key/value persistence
//! - [`Config`]: application configuration management
//! - [`InstructionProvider`]: seam for instruction sources

pub mod budget;
pub mod error;
pub mod feedback;
pub mod instructions;
pub mod integrations;
pub mod money;
pub mod scoring;
pub mod storage;
pub mod store;
pub mod task;

pub use budget::{BudgetService, BudgetState, BudgetTx, TxType, LEDGER_CAP};
pub use error::{
    BudgetError, ConfigError, CoreError, DatabaseError, InstructionError, ValidationError,
};
pub use feedback::{FeedbackItem, FeedbackLog, Signal};
pub use instructions::{InstructionProvider, InstructionResponse, MockInstructionProvider};
pub use integrations::{Integration, IntegrationsState};
pub use money::Usd;
pub use scoring::{distinct_top_tasks, Spotlight};
pub use storage::{Config, Database, RecordDb};
pub use store::{AppState, Store};
pub use task::{Dimension, SourceType, Task, TaskPatch, TaskStatus};
