pub mod breathe;
pub mod config;
pub mod history;

use mindora_core::storage::data_dir;
use mindora_core::{Config, Database};

/// Open the configured database inside the data directory.
pub fn open_database(config: &Config) -> Result<Database, Box<dyn std::error::Error>> {
    let path = data_dir()?.join(&config.storage.database_file);
    Ok(Database::open_at(path)?)
}

/// Print one event per line so the output can be piped.
pub fn print_event(event: &mindora_core::Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    Ok(())
}
