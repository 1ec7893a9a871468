//! Error types for manifex

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for manifex operations
#[derive(Error, Debug)]
pub enum ManifexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Failed to parse setup.py: {0}")]
    SetupParsing(String),

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    #[error("Missing required field in manifest: {0}")]
    MissingField(String),

    #[error("Failed to extract archive: {0}")]
    Extraction(String),

    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Package index error: {0}")]
    IndexApi(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for manifex operations
pub type Result<T> = std::result::Result<T, ManifexError>;

impl ManifexError {
    /// Create a new parsing error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::SetupParsing(msg.into())
    }

    /// Create a new extraction error
    pub fn extract(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    /// Create a new requirement error
    pub fn requirement(msg: impl Into<String>) -> Self {
        Self::InvalidRequirement(msg.into())
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
