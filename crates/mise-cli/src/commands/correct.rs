//! Correct command implementation.

use super::open_store;
use crate::cli::CorrectArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mise_domain::Correction;
use mise_extractor::{CorrectionRecorder, ParsedDocument};
use serde::Deserialize;
use std::fs;

/// Corrections file: one correction or a list
#[derive(Deserialize)]
#[serde(untagged)]
enum CorrectionInput {
    Many(Vec<Correction>),
    One(Correction),
}

impl From<CorrectionInput> for Vec<Correction> {
    fn from(input: CorrectionInput) -> Self {
        match input {
            CorrectionInput::Many(corrections) => corrections,
            CorrectionInput::One(correction) => vec![correction],
        }
    }
}

/// Execute the correct command.
pub async fn execute_correct(
    args: CorrectArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let mut document: ParsedDocument = serde_json::from_str(&fs::read_to_string(&args.document)?)?;
    let corrections: Vec<Correction> =
        serde_json::from_str::<CorrectionInput>(&fs::read_to_string(&args.corrections)?)?.into();

    if corrections.is_empty() {
        return Err(CliError::InvalidInput("no corrections given".into()));
    }

    let recorder = CorrectionRecorder::new(open_store(config)?, &config.extractor);
    let report = recorder.submit(&mut document, corrections).await?;

    let out = args.out.unwrap_or(args.document);
    fs::write(&out, serde_json::to_string_pretty(&document)?)?;

    println!("{}", formatter.format_report(&report)?);
    eprintln!(
        "{}",
        formatter.info(&format!(
            "Document {} is {}; saved to {}",
            document.document_id,
            document.state,
            out.display()
        ))
    );

    Ok(())
}
