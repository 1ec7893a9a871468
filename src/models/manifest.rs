//! Manifest metadata representation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Classifier, Requirement};

/// Long description payload
///
/// Legacy manifests either inline the text or read it from a file next to
/// the manifest (the `open('README').read()` idiom).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongDescription {
    /// Inline text
    Text(String),
    /// Reference to a file relative to the manifest
    File(PathBuf),
}

impl LongDescription {
    /// The referenced file, if this is a file reference
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            Self::File(path) => Some(path),
            Self::Text(_) => None,
        }
    }
}

/// A named contact with an optional email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Person or organization name
    pub name: String,
    /// Email address, if declared
    pub email: Option<String>,
}

/// Package metadata extracted from a setup.py manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Distribution name
    pub name: String,
    /// Release version string as written
    pub version: String,
    /// Short human-readable summary
    pub description: Option<String>,
    /// Extended description (inline or file reference)
    pub long_description: Option<LongDescription>,
    /// Author attribution
    pub author: Option<String>,
    /// Author email
    pub author_email: Option<String>,
    /// Maintainer attribution
    pub maintainer: Option<String>,
    /// Maintainer email
    pub maintainer_email: Option<String>,
    /// Project homepage
    pub url: Option<String>,
    /// License string, if declared directly
    pub license: Option<String>,
    /// Declared dependencies
    pub requires: Vec<Requirement>,
    /// `requires` entries that did not parse, kept verbatim
    pub invalid_requires: Vec<String>,
    /// Importable packages provided by the distribution
    pub packages: Vec<String>,
    /// Single-file modules provided by the distribution
    pub py_modules: Vec<String>,
    /// Installable entry-point scripts
    pub scripts: Vec<String>,
    /// Distribution taxonomy tags
    pub classifiers: Vec<Classifier>,
    /// Classifier entries that did not parse, kept verbatim
    pub invalid_classifiers: Vec<String>,
    /// Keyword arguments the model does not type, preserved verbatim
    pub extra: BTreeMap<String, String>,
    /// Directory the manifest was loaded from, when it came from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,
}

impl ManifestMetadata {
    /// Create a new metadata structure with the two required fields
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            long_description: None,
            author: None,
            author_email: None,
            maintainer: None,
            maintainer_email: None,
            url: None,
            license: None,
            requires: Vec::new(),
            invalid_requires: Vec::new(),
            packages: Vec::new(),
            py_modules: Vec::new(),
            scripts: Vec::new(),
            classifiers: Vec::new(),
            invalid_classifiers: Vec::new(),
            extra: BTreeMap::new(),
            source_dir: None,
        }
    }

    /// `name version` pair used in headings and log lines
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.version)
    }

    /// The primary contact: author if declared, otherwise maintainer
    pub fn contact(&self) -> Option<Contact> {
        if let Some(ref author) = self.author {
            Some(Contact {
                name: author.clone(),
                email: self.author_email.clone(),
            })
        } else {
            self.maintainer.as_ref().map(|m| Contact {
                name: m.clone(),
                email: self.maintainer_email.clone(),
            })
        }
    }

    /// The maintainer as a contact, when distinct from the author
    pub fn maintainer_contact(&self) -> Option<Contact> {
        match (&self.maintainer, &self.author) {
            (Some(m), Some(a)) if m == a => None,
            (Some(m), _) => Some(Contact {
                name: m.clone(),
                email: self.maintainer_email.clone(),
            }),
            _ => None,
        }
    }

    /// License classifiers declared in the taxonomy tags
    pub fn license_classifiers(&self) -> Vec<&Classifier> {
        self.classifiers.iter().filter(|c| c.is_license()).collect()
    }

    /// Normalize the version string toward the canonical form
    ///
    /// Strips a leading `v`, lowercases, unifies `-`/`_` separators to dots
    /// and rewrites the long pre-release spellings (`alpha`, `beta`,
    /// `preview`/`pre`) to their canonical short tags.
    pub fn normalize_version(&mut self) {
        let mut version = self.version.trim().to_lowercase();

        if version.starts_with('v') && version[1..].starts_with(|c: char| c.is_ascii_digit()) {
            version = version[1..].to_string();
        }

        version = version.replace(['-', '_'], ".");

        for (long, short) in [("alpha", "a"), ("beta", "b"), ("preview", "rc"), ("pre", "rc")] {
            if let Some(pos) = version.find(long) {
                version = format!("{}{}{}", &version[..pos], short, &version[pos + long.len()..]);
            }
        }

        // Collapse runs of dots introduced by separator rewriting
        while version.contains("..") {
            version = version.replace("..", ".");
        }

        // A separator between the release and a pre-release tag is dropped
        // (1.0.a1 -> 1.0a1)
        lazy_static::lazy_static! {
            static ref PRE_SEP_RE: regex::Regex =
                regex::Regex::new(r"(\d)\.(a|b|rc)(\d)").unwrap();
        }
        version = PRE_SEP_RE.replace_all(&version, "${1}${2}${3}").to_string();

        self.version = version;
    }

    /// Whether the version looks like a plain release (digits and dots only)
    pub fn has_plain_version(&self) -> bool {
        !self.version.is_empty()
            && self
                .version
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.')
            && !self.version.starts_with('.')
            && !self.version.ends_with('.')
    }
}

impl Default for ManifestMetadata {
    fn default() -> Self {
        Self::new("", "")
    }
}
