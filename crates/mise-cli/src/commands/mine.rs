//! Mine command implementation.

use super::open_store;
use crate::cli::MineArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use mise_domain::traits::PatternRuleStore;
use mise_extractor::PatternLibrary;
use mise_miner::MinerWorker;
use std::sync::{Arc, Mutex};

/// Execute the mine command.
pub async fn execute_mine(args: MineArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let mut miner_config = config.miner.clone();
    miner_config.dry_run |= args.dry_run;
    let dry_run = miner_config.dry_run;

    let store = open_store(config)?;
    let library = Arc::new(PatternLibrary::new(store.load_latest()?));
    let store = Arc::new(Mutex::new(store));
    let mut worker = MinerWorker::new(miner_config, library);

    if args.watch {
        eprintln!(
            "{}",
            formatter.info(&format!(
                "Mining every {} minute(s); press Ctrl+C to stop",
                config.miner.interval_minutes
            ))
        );
        worker.run(store).await?;
        println!("{}", worker.metrics().summary());
    } else {
        let outcome = worker.mine_once(&store)?;
        println!("{}", formatter.format_outcome(&outcome, dry_run)?);
    }

    Ok(())
}
