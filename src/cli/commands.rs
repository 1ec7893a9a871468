//! Command execution handlers

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use console::style;
use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{ManifexError, Result};
use crate::models::ManifestMetadata;
use crate::parsers::{sdist::ArchiveDigests, SdistParser, SetupPyParser};
use crate::validator::{ManifestValidator, ValidationReport};

/// A loaded manifest
///
/// For sdist inputs, the parser is kept alive so that the extraction
/// directory `metadata.source_dir` points into is not removed before
/// file-existence checks run.
pub struct LoadedManifest {
    /// Parsed metadata
    pub metadata: ManifestMetadata,
    /// Archive digests, when requested and the input was an sdist
    pub digests: Option<ArchiveDigests>,
    _sdist: Option<SdistParser>,
}

/// Load a manifest from a setup.py file, a project directory or an sdist
pub fn load_manifest(input: &Path, want_digests: bool) -> Result<LoadedManifest> {
    if input.is_dir() {
        let manifest = input.join("setup.py");
        debug!(path = %manifest.display(), "loading manifest from directory");
        return Ok(LoadedManifest {
            metadata: SetupPyParser::from_file(&manifest)?.parse()?,
            digests: None,
            _sdist: None,
        });
    }

    if SdistParser::is_sdist(input) {
        debug!(path = %input.display(), "loading manifest from sdist");
        let parser = SdistParser::new(input)?;
        let metadata = parser.parse()?;
        let digests = if want_digests {
            Some(parser.digests()?)
        } else {
            None
        };
        return Ok(LoadedManifest {
            metadata,
            digests,
            _sdist: Some(parser),
        });
    }

    debug!(path = %input.display(), "loading manifest file");
    Ok(LoadedManifest {
        metadata: SetupPyParser::from_file(input)?.parse()?,
        digests: None,
        _sdist: None,
    })
}

/// Discover manifests under the given paths
///
/// Files are taken as-is (setup.py or sdist); directories are searched
/// recursively for setup.py files up to `max_depth`.
pub fn discover_manifests(paths: &[PathBuf], max_depth: usize) -> Result<Vec<PathBuf>> {
    let mut manifests = Vec::new();

    for path in paths {
        if path.is_dir() {
            for entry in walkdir::WalkDir::new(path).max_depth(max_depth) {
                let entry = entry?;
                if entry.file_type().is_file() && entry.file_name() == "setup.py" {
                    manifests.push(entry.path().to_path_buf());
                }
            }
        } else if path.is_file() {
            manifests.push(path.clone());
        } else {
            return Err(ManifexError::file_not_found(path));
        }
    }

    manifests.sort();
    manifests.dedup();

    Ok(manifests)
}

/// Execute the inspect command
pub async fn execute_inspect(args: &super::InspectArgs) -> Result<()> {
    let loaded = load_manifest(&args.input, args.digests)?;
    let (metadata, digests) = (loaded.metadata, loaded.digests);

    if args.digests && digests.is_none() {
        eprintln!(
            "{} --digests only applies to sdist archives",
            style("Warning:").yellow().bold()
        );
    }

    match args.format {
        super::OutputFormat::Pretty => {
            println!("Manifest Metadata");
            println!("═══════════════════════════════════════");
            println!("Name:        {}", metadata.name);
            println!("Version:     {}", metadata.version);

            if let Some(ref desc) = metadata.description {
                println!("Description: {}", desc);
            }
            if let Some(contact) = metadata.contact() {
                match contact.email {
                    Some(email) => println!("Contact:     {} <{}>", contact.name, email.trim_matches(['<', '>'])),
                    None => println!("Contact:     {}", contact.name),
                }
            }
            if let Some(ref url) = metadata.url {
                println!("URL:         {}", url);
            }
            if let Some(ref license) = metadata.license {
                println!("License:     {}", license);
            }

            if !metadata.requires.is_empty() {
                println!("\nRequires:");
                for req in &metadata.requires {
                    println!("  - {}", req);
                }
            }
            if !metadata.packages.is_empty() {
                println!("\nPackages:");
                for package in &metadata.packages {
                    println!("  - {}", package);
                }
            }
            if !metadata.py_modules.is_empty() {
                println!("\nModules:");
                for module in &metadata.py_modules {
                    println!("  - {}", module);
                }
            }
            if !metadata.scripts.is_empty() {
                println!("\nScripts:");
                for script in &metadata.scripts {
                    println!("  - {}", script);
                }
            }
            if !metadata.classifiers.is_empty() {
                println!("\nClassifiers:");
                for classifier in &metadata.classifiers {
                    println!("  - {}", classifier);
                }
            }
            if !metadata.extra.is_empty() {
                println!("\nOther fields:");
                for (key, value) in &metadata.extra {
                    println!("  {} = {}", key, value);
                }
            }

            if let Some(digests) = digests {
                println!("\nDigests:");
                println!("  sha256: {}", digests.sha256);
                println!("  md5:    {}", digests.md5);
            }
        }
        super::OutputFormat::Json => {
            #[derive(Serialize)]
            struct Inspection {
                #[serde(flatten)]
                metadata: ManifestMetadata,
                #[serde(skip_serializing_if = "Option::is_none")]
                digests: Option<ArchiveDigests>,
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&Inspection { metadata, digests })?
            );
        }
        super::OutputFormat::Toml => {
            println!(
                "{}",
                toml::to_string_pretty(&metadata)
                    .map_err(|e| ManifexError::Other(e.to_string()))?
            );
        }
    }

    Ok(())
}

/// Outcome of checking a single manifest
struct CheckOutcome {
    path: PathBuf,
    metadata: Option<ManifestMetadata>,
    report: ValidationReport,
}

/// Execute the check command
pub async fn execute_check(args: &super::CheckArgs) -> Result<()> {
    use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let config = Config::load().unwrap_or_default();
    let strict = args.strict || config.validation.strict;
    let check_files = !args.no_file_checks && config.validation.check_files;

    let manifests = discover_manifests(&args.paths, config.validation.max_depth)?;
    if manifests.is_empty() {
        return Err(ManifexError::Validation("no manifests found".into()));
    }
    debug!(count = manifests.len(), "discovered manifests");

    let pb = ProgressBar::new(manifests.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓▒░ "),
    );
    pb.set_prefix("check");

    let mut outcomes: Vec<CheckOutcome> = manifests
        .par_iter()
        .progress_with(pb)
        .map(|path| check_single(path, check_files))
        .collect();

    if args.online && !config.network.offline {
        run_online_pass(&config, &mut outcomes).await;
    }

    let failed = outcomes
        .iter()
        .filter(|o| outcome_failed(&o.report, strict))
        .count();

    match args.format {
        super::ReportFormat::Pretty => {
            for outcome in &outcomes {
                print_report(outcome, strict);
            }

            println!();
            if failed == 0 {
                println!(
                    "{} {} manifest(s) checked",
                    style("OK").green().bold(),
                    outcomes.len()
                );
            } else {
                println!(
                    "{} {} of {} manifest(s) failed",
                    style("FAILED").red().bold(),
                    failed,
                    outcomes.len()
                );
            }
        }
        super::ReportFormat::Json => {
            #[derive(Serialize)]
            struct PathReport<'a> {
                path: String,
                #[serde(flatten)]
                report: &'a ValidationReport,
            }

            let reports: Vec<PathReport> = outcomes
                .iter()
                .map(|o| PathReport {
                    path: o.path.display().to_string(),
                    report: &o.report,
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    if failed > 0 {
        return Err(ManifexError::Validation(format!(
            "{} of {} manifest(s) failed validation",
            failed,
            outcomes.len()
        )));
    }

    Ok(())
}

/// Check one manifest, turning load failures into report errors
fn check_single(path: &Path, check_files: bool) -> CheckOutcome {
    match load_manifest(path, false) {
        Ok(mut loaded) => {
            if !check_files {
                loaded.metadata.source_dir = None;
            }

            // Validation itself is infallible once the manifest is loaded
            let report = ManifestValidator::new(&loaded.metadata)
                .validate()
                .unwrap_or_default();

            CheckOutcome {
                path: path.to_path_buf(),
                metadata: Some(loaded.metadata),
                report,
            }
        }
        Err(e) => {
            let mut report = ValidationReport {
                manifest: path.display().to_string(),
                generated_at: chrono::Utc::now().timestamp(),
                ..ValidationReport::default()
            };
            report.errors.push(e.to_string());

            CheckOutcome {
                path: path.to_path_buf(),
                metadata: None,
                report,
            }
        }
    }
}

/// Whether a report counts as a failure under the current strictness
fn outcome_failed(report: &ValidationReport, strict: bool) -> bool {
    report.has_errors() || (strict && !report.is_clean())
}

/// Verify requirements against the package index
async fn run_online_pass(config: &Config, outcomes: &mut [CheckOutcome]) {
    use crate::registry::IndexClient;

    let client = IndexClient::with_base_url(&config.network.index_url, config.network.timeout);

    for outcome in outcomes.iter_mut() {
        let metadata = match outcome.metadata {
            Some(ref m) => m,
            None => continue,
        };

        let mut seen = HashSet::new();
        for req in &metadata.requires {
            if !seen.insert(req.canonical_name()) {
                continue;
            }

            match client.project(&req.canonical_name()).await {
                Ok(project) => outcome.report.record_resolution(&req.name, project.is_some()),
                Err(e) => outcome
                    .report
                    .warnings
                    .push(format!("index lookup failed for {}: {}", req.name, e)),
            }
        }
    }
}

/// Print a single pretty report
fn print_report(outcome: &CheckOutcome, strict: bool) {
    let failed = outcome_failed(&outcome.report, strict);
    let badge = if failed {
        style("✗").red().bold()
    } else if outcome.report.is_clean() {
        style("✓").green().bold()
    } else {
        style("!").yellow().bold()
    };

    println!("\n{} {}", badge, style(outcome.path.display()).bold());

    for error in &outcome.report.errors {
        println!("  {} {}", style("error:").red(), error);
    }
    for warning in &outcome.report.warnings {
        println!("  {} {}", style("warning:").yellow(), warning);
    }

    if outcome.report.requirement_count > 0 && outcome.report.resolved_count > 0 {
        println!(
            "  {} {}/{} requirements found on the index",
            style("index:").dim(),
            outcome.report.resolved_count,
            outcome.report.requirement_count
        );
    }
    if outcome.report.verified_files > 0 {
        println!(
            "  {} {} referenced file(s) present",
            style("files:").dim(),
            outcome.report.verified_files
        );
    }
}

/// Whether the user must confirm before writing to `output`
fn needs_overwrite_prompt(output: &Path, yes: bool, auto_yes: bool) -> bool {
    output.exists() && !yes && !auto_yes
}

/// Execute the convert command
pub async fn execute_convert(args: &super::ConvertArgs) -> Result<()> {
    use crate::generator::PyprojectGenerator;

    let config = Config::load().unwrap_or_default();
    let loaded = load_manifest(&args.input, false)?;
    let mut metadata = loaded.metadata;

    if args.normalize {
        metadata.normalize_version();
    }

    // Surface validation findings before converting, but only refuse on errors
    let report = ManifestValidator::new(&metadata).validate()?;
    for error in &report.errors {
        eprintln!("{} {}", style("error:").red().bold(), error);
    }
    for warning in &report.warnings {
        eprintln!("{} {}", style("warning:").yellow(), warning);
    }
    if report.has_errors() {
        return Err(ManifexError::Validation(
            "manifest has errors, refusing to convert".into(),
        ));
    }

    // An sdist's source_dir is a temporary extraction directory, so it is
    // no use as a default output location
    let source_dir = if SdistParser::is_sdist(&args.input) {
        None
    } else {
        metadata.source_dir.clone()
    };
    let generator = PyprojectGenerator::new(metadata);

    if args.stdout {
        print!("{}", generator.render()?);
        return Ok(());
    }

    let output = args.output.clone().unwrap_or_else(|| {
        source_dir
            .or(config.general.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pyproject.toml")
    });

    if needs_overwrite_prompt(&output, args.yes, config.general.auto_yes) {
        let overwrite = dialoguer::Confirm::new()
            .with_prompt(format!("{} exists, overwrite?", output.display()))
            .default(false)
            .interact()
            .map_err(|e| ManifexError::Other(e.to_string()))?;

        if !overwrite {
            return Err(ManifexError::Generation("aborted by user".into()));
        }
    }

    generator.write_to(&output)?;
    println!(
        "{} wrote {}",
        style("✓").green().bold(),
        style(output.display()).bold()
    );

    Ok(())
}

/// Execute the config command
pub async fn execute_config(args: &super::ConfigArgs) -> Result<()> {
    match &args.command {
        super::ConfigCommands::Show => {
            let config = Config::load()?;
            println!(
                "{}",
                toml::to_string_pretty(&config)
                    .map_err(|e| ManifexError::Config(e.to_string()))?
            );
        }
        super::ConfigCommands::Reset => {
            Config::reset()?;
            println!("Configuration reset to defaults");
        }
        super::ConfigCommands::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(key, value)?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }
        super::ConfigCommands::Get { key } => match Config::load()?.get(key) {
            Some(value) => println!("{}", value),
            None => {
                return Err(ManifexError::Config(format!(
                    "Unknown configuration key: {}",
                    key
                )))
            }
        },
        super::ConfigCommands::Init { force } => {
            Config::init(*force)?;
            println!("Configuration file created at {}", Config::config_path()?.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_manifests_in_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("contrib/spendfrom")).unwrap();
        std::fs::create_dir_all(dir.path().join("qa/rpc-tests/client")).unwrap();
        std::fs::write(dir.path().join("contrib/spendfrom/setup.py"), "setup()").unwrap();
        std::fs::write(dir.path().join("qa/rpc-tests/client/setup.py"), "setup()").unwrap();
        std::fs::write(dir.path().join("contrib/spendfrom/spendfrom.py"), "").unwrap();

        let found = discover_manifests(&[dir.path().to_path_buf()], 8).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.file_name().unwrap() == "setup.py"));
    }

    #[test]
    fn test_discover_respects_max_depth() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        std::fs::write(dir.path().join("a/b/c/setup.py"), "setup()").unwrap();

        let found = discover_manifests(&[dir.path().to_path_buf()], 2).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_missing_path_is_error() {
        let result = discover_manifests(&[PathBuf::from("/no/such/path")], 8);
        assert!(matches!(result, Err(ManifexError::FileNotFound { .. })));
    }

    #[test]
    fn test_check_single_reports_parse_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("setup.py");
        std::fs::write(&path, "print('no setup call here')").unwrap();

        let outcome = check_single(&path, true);
        assert!(outcome.metadata.is_none());
        assert!(outcome.report.has_errors());
    }

    #[test]
    fn test_check_single_valid_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("setup.py");
        std::fs::write(
            &path,
            "setup(name='pkg', version='1.0', description='d', author='a', license='MIT')",
        )
        .unwrap();

        let outcome = check_single(&path, false);
        assert!(outcome.metadata.is_some());
        assert!(outcome.report.is_clean());
    }

    #[test]
    fn test_warnings_only_fails_under_strict() {
        let mut report = ValidationReport::default();
        report.warnings.push("no description declared".into());

        assert!(!outcome_failed(&report, false));
        assert!(outcome_failed(&report, true));
    }

    #[test]
    fn test_errors_fail_regardless_of_strictness() {
        let mut report = ValidationReport::default();
        report.errors.push("name is empty".into());

        assert!(outcome_failed(&report, false));
        assert!(outcome_failed(&report, true));
    }

    #[test]
    fn test_overwrite_prompt_gating() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("pyproject.toml");

        assert!(!needs_overwrite_prompt(&output, false, false));

        std::fs::write(&output, "stale").unwrap();
        assert!(needs_overwrite_prompt(&output, false, false));
        assert!(!needs_overwrite_prompt(&output, true, false));
        assert!(!needs_overwrite_prompt(&output, false, true));
    }

    #[tokio::test]
    async fn test_convert_overwrites_existing_output_with_yes() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("setup.py"),
            "setup(name='pkg', version='1.0', description='d', author='a', license='MIT')",
        )
        .unwrap();
        let output = dir.path().join("pyproject.toml");
        std::fs::write(&output, "stale").unwrap();

        let args = super::super::ConvertArgs {
            input: dir.path().join("setup.py"),
            output: Some(output.clone()),
            stdout: false,
            yes: true,
            normalize: false,
        };
        execute_convert(&args).await.unwrap();

        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("name = \"pkg\""));
        assert!(!content.contains("stale"));
    }

    #[test]
    fn test_load_manifest_from_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("setup.py"),
            "setup(name='pkg', version='1.0')",
        )
        .unwrap();

        let loaded = load_manifest(dir.path(), false).unwrap();
        assert_eq!(loaded.metadata.name, "pkg");
        assert!(loaded.digests.is_none());
        assert_eq!(loaded.metadata.source_dir.as_deref(), Some(dir.path()));
    }
}
