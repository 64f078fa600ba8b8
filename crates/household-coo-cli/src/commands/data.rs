//! Sync, export, import and reset of stored data.

use clap::Subcommand;
use std::path::PathBuf;

use super::open_store;

#[derive(Subcommand)]
pub enum DataAction {
    /// Simulate a refresh from the connected sources
    Sync,
    /// Export all data as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace all data with an exported JSON file
    Import {
        file: PathBuf,
    },
    /// Clear everything and reload the demo data
    Reset,
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store()?;

    match action {
        DataAction::Sync => {
            store.sync()?;
            println!(
                "Synced {} tasks at {}",
                store.tasks().len(),
                store.state().last_refresh.to_rfc3339()
            );
        }
        DataAction::Export { out } => {
            let json = store.export_data()?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        DataAction::Import { file } => {
            let json = std::fs::read_to_string(&file)?;
            store.import_data(&json)?;
            println!("Imported {} tasks", store.tasks().len());
        }
        DataAction::Reset => {
            store.reset_demo()?;
            println!("Data reset to demo state");
        }
    }
    Ok(())
}
