//! Mise Pattern Miner
//!
//! Out-of-band batch job that turns reviewer corrections into pattern rules.
//!
//! # Overview
//!
//! The miner is responsible for:
//! - **Rule derivation**: working back from a corrected draft to the layout
//!   cues (title line, servings and time markers, section headings, step and
//!   ingredient layout) that produce it
//! - **Rule revision**: folding new evidence into a fingerprint's best rule
//! - **Success tracking**: replaying each revised rule on the corrected
//!   segment and moving its success rate by exponential moving average
//! - **Retirement**: soft-deleting rules whose success rate falls below the
//!   floor (kept for audit, excluded from lookup)
//!
//! # Architecture
//!
//! ```text
//! TrainingLog ──(examples after mined_through)──▶ PatternMiner::mine
//!                                                       │
//!                         next PatternLibraryVersion ◀──┘
//!                                   │
//!             PatternRuleStore::save_version + PatternLibrary::publish
//! ```
//!
//! Mining never edits a published version. Each pass builds version
//! `current + 1`, and live parses keep the snapshot they started with.
//!
//! # Usage
//!
//! ## One-time Pass
//!
//! ```no_run
//! use mise_domain::traits::{PatternRuleStore, TrainingLog};
//! use mise_miner::PatternMiner;
//! use mise_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("mise.db")?;
//! let current = store.load_latest()?;
//! let examples = store.examples_after(current.mined_through)?;
//!
//! let mut miner = PatternMiner::default_config();
//! let outcome = miner.mine(&current, &examples, 0);
//! println!("{}", miner.metrics().summary());
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! ```no_run
//! use mise_extractor::PatternLibrary;
//! use mise_miner::{MinerConfig, MinerWorker};
//! use mise_store::SqliteStore;
//! use std::sync::{Arc, Mutex};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(Mutex::new(SqliteStore::new("mise.db")?));
//!     let library = Arc::new(PatternLibrary::empty());
//!     let mut worker = MinerWorker::new(MinerConfig::default(), library);
//!
//!     worker.run(store).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [miner]
//! interval_minutes = 60
//! ema_alpha = 0.3
//! success_floor = 0.2
//! initial_success_rate = 0.5
//! reproduction_threshold = 0.75
//! locale = "de"
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod config;
pub mod derive;
mod error;
mod metrics;
mod miner;
mod worker;

pub use config::MinerConfig;
pub use derive::{derive_definition, merge_definitions};
pub use error::MinerError;
pub use metrics::MinerMetrics;
pub use miner::{MiningOutcome, PatternMiner};
pub use worker::MinerWorker;
