//! Relational record store commands.

use clap::Subcommand;
use household_coo_core::RecordDb;

use super::open_store;

#[derive(Subcommand)]
pub enum DbAction {
    /// Copy the current state into the record tables
    Snapshot,
    /// List tasks stored in the record tables
    Tasks,
    /// List budget transactions stored in the record tables
    Transactions,
    /// List feedback stored in the record tables
    Feedback,
    /// Create a user account
    CreateUser {
        username: String,
        #[arg(long)]
        password: String,
    },
}

pub fn run(action: DbAction) -> Result<(), Box<dyn std::error::Error>> {
    let records = RecordDb::open()?;

    match action {
        DbAction::Snapshot => {
            let store = open_store()?;
            let summary = records.snapshot(store.state())?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        DbAction::Tasks => {
            println!("{}", serde_json::to_string_pretty(&records.list_tasks()?)?);
        }
        DbAction::Transactions => {
            println!("{}", serde_json::to_string_pretty(&records.list_transactions()?)?);
        }
        DbAction::Feedback => {
            println!("{}", serde_json::to_string_pretty(&records.list_feedback()?)?);
        }
        DbAction::CreateUser { username, password } => {
            let user = records.create_user(&username, &password)?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
    }
    Ok(())
}
