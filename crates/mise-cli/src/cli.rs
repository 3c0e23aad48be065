//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mise CLI - parse cookbook text into recipe drafts and learn from corrections.
#[derive(Debug, Parser)]
#[command(name = "mise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database path (overrides the configured one)
    #[arg(long, global = true, env = "MISE_DB")]
    pub db: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a document into recipe drafts
    Parse(ParseArgs),

    /// Apply reviewer corrections to a parsed document
    Correct(CorrectArgs),

    /// Mine the learning log into a new pattern library version
    Mine(MineArgs),

    /// List pattern rules
    Rules(RulesArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the parse command.
#[derive(Debug, Parser)]
pub struct ParseArgs {
    /// Text file to parse
    pub file: PathBuf,

    /// Byte offsets where a new recipe starts (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub hints: Vec<usize>,

    /// Structural fingerprint computed upstream
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Write the parsed document as JSON for a later `correct`
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Skip the generative fallback even when a model is configured
    #[arg(long)]
    pub no_fallback: bool,
}

/// Arguments for the correct command.
#[derive(Debug, Parser)]
pub struct CorrectArgs {
    /// Parsed document JSON written by `parse --out`
    pub document: PathBuf,

    /// Corrections JSON (one correction or an array)
    pub corrections: PathBuf,

    /// Where to write the updated document (defaults to overwriting it)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the mine command.
#[derive(Debug, Parser)]
pub struct MineArgs {
    /// Keep mining at the configured interval until Ctrl+C
    #[arg(short, long)]
    pub watch: bool,

    /// Mine without persisting or publishing
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the rules command.
#[derive(Debug, Parser)]
pub struct RulesArgs {
    /// Include retired rules
    #[arg(short, long)]
    pub all: bool,

    /// Only rules for this fingerprint
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Library version to show (defaults to the latest)
    #[arg(long)]
    pub version: Option<u64>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        let cli = Cli::parse_from([
            "mise", "parse", "book.txt", "--hints", "0,120", "--out", "doc.json",
        ]);
        match cli.command {
            Command::Parse(args) => {
                assert_eq!(args.file, PathBuf::from("book.txt"));
                assert_eq!(args.hints, vec![0, 120]);
                assert_eq!(args.out, Some(PathBuf::from("doc.json")));
                assert!(!args.no_fallback);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["mise", "rules", "--all", "--format", "json", "--no-color"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert!(cli.no_color);
        match cli.command {
            Command::Rules(args) => assert!(args.all),
            _ => panic!("Expected Rules command"),
        }
    }

    #[test]
    fn test_mine_command() {
        let cli = Cli::parse_from(["mise", "mine", "--dry-run"]);
        match cli.command {
            Command::Mine(args) => {
                assert!(args.dry_run);
                assert!(!args.watch);
            }
            _ => panic!("Expected Mine command"),
        }
    }

    #[test]
    fn test_missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["mise"]).is_err());
    }
}
