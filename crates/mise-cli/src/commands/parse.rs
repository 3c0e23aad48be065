//! Parse command implementation.

use super::open_store;
use crate::cli::ParseArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mise_domain::traits::{CompletionProvider, PatternRuleStore};
use mise_domain::Fingerprint;
use mise_extractor::{Extractor, ParsedDocument, PatternLibrary, SourceDocument};
use std::fmt::Display;
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Execute the parse command.
pub async fn execute_parse(args: ParseArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let text = fs::read_to_string(&args.file)?;
    if text.trim().is_empty() {
        return Err(CliError::InvalidInput(format!("{} is empty", args.file.display())));
    }

    let mut source = SourceDocument::new(text).with_hints(args.hints);
    if let Some(fingerprint) = args.fingerprint {
        source = source.with_fingerprint(Fingerprint::new(fingerprint));
    }

    let library = {
        let store = open_store(config)?;
        Arc::new(PatternLibrary::new(store.load_latest()?))
    };
    let extractor = Extractor::new(config.extractor.clone(), library);

    let document = match (&config.ollama, args.no_fallback) {
        (Some(ollama), false) => {
            tracing::info!("Generative fallback via {} ({})", ollama.endpoint, ollama.model);
            let extractor = extractor.with_provider(ollama.fallback_provider());
            parse_until_interrupted(&extractor, source).await?
        }
        _ => parse_until_interrupted(&extractor, source).await?,
    };

    println!("{}", formatter.format_document(&document)?);

    if let Some(out) = args.out {
        fs::write(&out, serde_json::to_string_pretty(&document)?)?;
        eprintln!("{}", formatter.success(&format!("Wrote {}", out.display())));
    } else if document.needs_review() {
        eprintln!(
            "{}",
            formatter.warning(
                "Some drafts need review; rerun with --out to save the document for `mise correct`"
            )
        );
    }

    Ok(())
}

/// Parse, dropping all in-flight work on Ctrl+C
async fn parse_until_interrupted<P>(
    extractor: &Extractor<P>,
    source: SourceDocument,
) -> Result<ParsedDocument>
where
    P: CompletionProvider + Send + Sync + 'static,
    P::Error: Display,
{
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let listener = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let result = extractor.parse_document_with_cancel(source, cancel).await;
    listener.abort();
    Ok(result?)
}
