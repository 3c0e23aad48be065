//! Error types for Pattern Miner operations

use thiserror::Error;

/// Errors that can occur during a mining run
#[derive(Error, Debug)]
pub enum MinerError {
    /// Training log or rule store failure
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The freshly mined version would not be newer than the live one
    #[error("Stale library version {mined} (live: {live})")]
    StaleVersion {
        /// Version the run produced
        mined: u64,
        /// Version already published
        live: u64,
    },
}
