//! Command-line interface for manifex

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Manifex - inspect, lint and convert legacy setup.py manifests
///
/// Reads distutils/setuptools manifests (plain files, project directories
/// or sdist archives), validates their declared metadata and can convert
/// them to pyproject.toml.
#[derive(Parser, Debug)]
#[command(name = "manifex")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MANIFEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the metadata declared by a manifest
    Inspect(InspectArgs),

    /// Validate one or more manifests
    Check(CheckArgs),

    /// Convert a manifest to pyproject.toml
    Convert(ConvertArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Manifest to inspect: a setup.py, a project directory or an sdist
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Include archive digests (sdist input only)
    #[arg(short, long)]
    pub digests: bool,
}

/// Output format for inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
    /// TOML output
    Toml,
}

/// Arguments for the check command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// Manifests to check: setup.py files, directories to search, or sdists
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Verify requirements against the package index
    #[arg(long)]
    pub online: bool,

    /// Treat warnings as failures
    #[arg(short, long)]
    pub strict: bool,

    /// Skip file-existence checks
    #[arg(long)]
    pub no_file_checks: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Pretty)]
    pub format: ReportFormat,
}

/// Output format for check reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable pretty output
    Pretty,
    /// JSON output
    Json,
}

/// Arguments for the convert command
#[derive(Parser, Debug, Clone)]
pub struct ConvertArgs {
    /// Manifest to convert: a setup.py, a project directory or an sdist
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (default: pyproject.toml next to the manifest)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Overwrite an existing output file without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Normalize the version before converting
    #[arg(short, long)]
    pub normalize: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Reset configuration to defaults
    Reset,
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_defaults() {
        let cli = Cli::try_parse_from(["manifex", "check", "setup.py"]).unwrap();
        match cli.command {
            Commands::Check(args) => {
                assert!(!args.online);
                assert!(!args.strict);
                assert_eq!(args.format, ReportFormat::Pretty);
            }
            _ => panic!("expected check command"),
        }
    }

    #[test]
    fn test_convert_flags() {
        let cli =
            Cli::try_parse_from(["manifex", "convert", "setup.py", "--stdout", "-y"]).unwrap();
        match cli.command {
            Commands::Convert(args) => {
                assert!(args.stdout);
                assert!(args.yes);
            }
            _ => panic!("expected convert command"),
        }
    }
}
