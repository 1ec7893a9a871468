//! Source distribution (sdist) parser
//!
//! Python sdists are tar archives compressed with gzip, bzip2 or xz.
//! The archive is extracted to a temp dir, the top-most setup.py is
//! located and handed to the setup.py parser.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tar::Archive;
use tempfile::TempDir;
use xz2::read::XzDecoder;

use crate::error::{ManifexError, Result};
use crate::models::ManifestMetadata;
use crate::parsers::SetupPyParser;

/// Checksums of an sdist archive, as published by the package index
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArchiveDigests {
    /// SHA-256 digest, hex encoded
    pub sha256: String,
    /// MD5 digest, hex encoded
    pub md5: String,
}

/// Parser for source distribution archives
pub struct SdistParser {
    /// Path to the archive
    path: PathBuf,
    /// Temporary extraction directory
    temp_dir: TempDir,
    /// Located setup.py inside the extraction directory
    setup_py: PathBuf,
}

impl SdistParser {
    /// Extensions this parser accepts
    const EXTENSIONS: &'static [&'static str] = &[".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".tar"];

    /// Whether the path looks like an sdist archive
    pub fn is_sdist(path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        Self::EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }

    /// Create a new parser for the given archive, extracting it
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            return Err(ManifexError::file_not_found(&path));
        }
        if !Self::is_sdist(&path) {
            return Err(ManifexError::UnsupportedFormat(
                path.display().to_string(),
            ));
        }

        let temp_dir = TempDir::new()?;
        extract_archive(&path, temp_dir.path())?;

        let setup_py = find_setup_py(temp_dir.path())?;

        Ok(Self {
            path,
            temp_dir,
            setup_py,
        })
    }

    /// Directory the archive was extracted into
    pub fn extract_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Parse the contained setup.py and return metadata
    pub fn parse(&self) -> Result<ManifestMetadata> {
        SetupPyParser::from_file(&self.setup_py)?.parse()
    }

    /// Compute the archive digests
    pub fn digests(&self) -> Result<ArchiveDigests> {
        let mut file = File::open(&self.path)?;
        let mut buf = [0u8; 64 * 1024];

        let mut sha256 = Sha256::new();
        let mut md5_ctx = md5::Context::new();

        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            sha256.update(&buf[..n]);
            md5_ctx.consume(&buf[..n]);
        }

        Ok(ArchiveDigests {
            sha256: hex::encode(sha256.finalize()),
            md5: hex::encode(md5_ctx.compute().0),
        })
    }
}

/// Extract a tar archive with compression detected from the file name
fn extract_archive(path: &Path, dest: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let file = File::open(path)?;

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        let decoder = GzDecoder::new(file);
        let mut archive = Archive::new(decoder);
        archive.unpack(dest)?;
    } else if name.ends_with(".tar.bz2") {
        let decoder = BzDecoder::new(file);
        let mut archive = Archive::new(decoder);
        archive.unpack(dest)?;
    } else if name.ends_with(".tar.xz") {
        let decoder = XzDecoder::new(file);
        let mut archive = Archive::new(decoder);
        archive.unpack(dest)?;
    } else if name.ends_with(".tar") {
        let mut archive = Archive::new(file);
        archive.unpack(dest)?;
    } else {
        return Err(ManifexError::UnsupportedFormat(name));
    }

    Ok(())
}

/// Locate the shallowest setup.py under the extraction directory
fn find_setup_py(root: &Path) -> Result<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    for entry in walkdir::WalkDir::new(root).max_depth(3) {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name() == "setup.py" {
            candidates.push(entry.path().to_path_buf());
        }
    }

    candidates.sort_by_key(|p| p.components().count());

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ManifexError::extract("no setup.py found in archive".to_string()))
}
