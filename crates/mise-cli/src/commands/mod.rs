//! Command implementations.

mod config;
mod correct;
mod mine;
mod parse;
mod rules;

pub use config::execute_config;
pub use correct::execute_correct;
pub use mine::execute_mine;
pub use parse::execute_parse;
pub use rules::execute_rules;

use crate::config::Config;
use crate::error::Result;
use mise_store::SqliteStore;
use std::fs;

/// Open the configured database, creating its directory on first use.
fn open_store(config: &Config) -> Result<SqliteStore> {
    let path = config.db_path()?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    tracing::debug!("Opening database {}", path.display());
    Ok(SqliteStore::new(&path)?)
}
