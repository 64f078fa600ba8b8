pub mod budget;
pub mod config;
pub mod data;
pub mod db;
pub mod instructions;
pub mod integrations;
pub mod spotlight;
pub mod task;

use household_coo_core::storage::data_dir;
use household_coo_core::{Config, Database, Store};

/// Open the store in the data directory with the saved configuration.
pub fn open_store() -> Result<Store, Box<dyn std::error::Error>> {
    tracing::debug!(dir = %data_dir()?.display(), "opening store");
    let config = Config::load()?;
    let db = Database::open()?;
    Ok(Store::open(db, config)?)
}
