//! Manifex - inspect, lint and convert legacy setup.py manifests
//!
//! Main entry point for the manifex CLI application.

use std::process::ExitCode;

use console::style;
use tracing_subscriber::EnvFilter;

use manifex::cli::{self, Cli, Commands};
use manifex::config::Config;
use manifex::error::Result;

/// Application banner
const BANNER: &str = r#"
  ███╗   ███╗ █████╗ ███╗   ██╗██╗███████╗███████╗██╗  ██╗
  ████╗ ████║██╔══██╗████╗  ██║██║██╔════╝██╔════╝╚██╗██╔╝
  ██╔████╔██║███████║██╔██╗ ██║██║█████╗  █████╗   ╚███╔╝
  ██║╚██╔╝██║██╔══██║██║╚██╗██║██║██╔══╝  ██╔══╝   ██╔██╗
  ██║ ╚═╝ ██║██║  ██║██║ ╚████║██║██║     ███████╗██╔╝ ██╗
  ╚═╝     ╚═╝╚═╝  ╚═╝╚═╝  ╚═══╝╚═╝╚═╝     ╚══════╝╚═╝  ╚═╝
"#;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Make --config visible to every Config::load below
    if let Some(ref path) = cli.config {
        std::env::set_var("MANIFEX_CONFIG", path);
    }

    // Set up logging
    setup_logging(&cli);

    // Run the application
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Effective log level: flags win over the configured default
fn log_level(verbose: bool, quiet: bool, config: &Config) -> &str {
    if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        &config.logging.level
    }
}

/// Set up logging from CLI flags and the logging config section
fn setup_logging(cli: &Cli) {
    let config = Config::load().unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level(cli.verbose, cli.quiet, &config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.logging.color)
        .with_target(false)
        .without_time()
        .init();
}

/// Main application logic
async fn run(cli: Cli) -> Result<()> {
    // Show banner for the batch command (not quiet mode)
    if !cli.quiet {
        if let Commands::Check(_) = &cli.command {
            println!("{}", style(BANNER).cyan());
            println!(
                "  {} v{}\n",
                style("manifex").bold(),
                style(manifex::VERSION).dim()
            );
        }
    }

    // Set number of parallel jobs
    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Inspect(args) => cli::execute_inspect(&args).await,
        Commands::Check(args) => cli::execute_check(&args).await,
        Commands::Convert(args) => cli::execute_convert(&args).await,
        Commands::Config(args) => cli::execute_config(&args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_resolution() {
        let mut config = Config::default();
        assert_eq!(log_level(false, false, &config), "info");

        config.logging.level = "trace".into();
        assert_eq!(log_level(false, false, &config), "trace");
        assert_eq!(log_level(true, false, &config), "debug");
        assert_eq!(log_level(false, true, &config), "error");
    }

    #[test]
    fn test_banner() {
        // The banner is ASCII art; check that it's not empty and has the
        // expected structure
        assert!(!BANNER.trim().is_empty());
        assert!(BANNER.lines().count() >= 6);
    }
}
