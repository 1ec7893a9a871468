//! Manifex - inspect, lint and convert legacy setup.py manifests
//!
//! Manifex reads distutils/setuptools `setup.py` manifests without
//! executing any Python, validates the declared package metadata and
//! converts it to modern `pyproject.toml`.
//!
//! # Features
//!
//! - **Safe**: manifests are parsed, never executed
//! - **Thorough**: structural validation of every declared field
//! - **Batch-friendly**: checks whole source trees in parallel
//! - **Online-aware**: optionally verifies requirements against the
//!   package index
//!
//! # Quick Start
//!
//! ```bash
//! # Show what a manifest declares
//! manifex inspect setup.py
//!
//! # Validate every manifest in a tree
//! manifex check .
//!
//! # Convert to pyproject.toml
//! manifex convert setup.py
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod models;
pub mod parsers;
pub mod registry;
pub mod validator;

// Re-export commonly used types
pub use error::{ManifexError, Result};
pub use models::{Classifier, ManifestMetadata, Requirement};
pub use validator::ValidationReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Parse a manifest and return its metadata
///
/// # Arguments
///
/// * `input` - A setup.py file, a project directory or an sdist archive
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let metadata = manifex::inspect(Path::new("setup.py"))?;
///     println!("{}", metadata.display_name());
///     Ok(())
/// }
/// ```
pub fn inspect(input: &std::path::Path) -> Result<ManifestMetadata> {
    let loaded = cli::load_manifest(input, false)?;
    Ok(loaded.metadata)
}

/// Validate a manifest and return the report
///
/// # Arguments
///
/// * `input` - A setup.py file, a project directory or an sdist archive
pub fn check(input: &std::path::Path) -> Result<ValidationReport> {
    use validator::ManifestValidator;

    let loaded = cli::load_manifest(input, false)?;
    ManifestValidator::new(&loaded.metadata).validate()
}

/// Convert a manifest to pyproject.toml content
///
/// # Arguments
///
/// * `input` - A setup.py file, a project directory or an sdist archive
///
/// # Returns
///
/// The rendered pyproject.toml text on success
pub fn convert(input: &std::path::Path) -> Result<String> {
    use generator::PyprojectGenerator;

    let loaded = cli::load_manifest(input, false)?;
    PyprojectGenerator::new(loaded.metadata).render()
}
