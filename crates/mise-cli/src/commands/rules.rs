//! Rules command implementation.

use super::open_store;
use crate::cli::RulesArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mise_domain::traits::PatternRuleStore;
use mise_domain::{Fingerprint, PatternRule};

/// Execute the rules command.
pub fn execute_rules(args: RulesArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let library = match args.version {
        Some(version) => store
            .load_version(version)?
            .ok_or_else(|| CliError::NotFound(format!("library version {}", version)))?,
        None => store.load_latest()?,
    };

    let fingerprint = args.fingerprint.map(Fingerprint::new);
    let rules: Vec<&PatternRule> = library
        .rules
        .iter()
        .filter(|r| args.all || !r.retired)
        .filter(|r| fingerprint.as_ref().is_none_or(|fp| &r.fingerprint == fp))
        .collect();

    println!("{}", formatter.format_rules(library.version, &rules)?);
    Ok(())
}
