//! Trove classifier representation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ManifexError, Result};

/// Top-level categories accepted by the package index
pub const KNOWN_CATEGORIES: &[&str] = &[
    "Development Status",
    "Environment",
    "Framework",
    "Intended Audience",
    "License",
    "Natural Language",
    "Operating System",
    "Programming Language",
    "Topic",
    "Typing",
];

/// A trove classifier such as `License :: OSI Approved :: MIT License`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classifier {
    /// Trimmed path segments, split on `::`
    pub segments: Vec<String>,
}

impl Classifier {
    /// Parse a classifier string into its segments
    pub fn parse(s: &str) -> Result<Self> {
        let segments: Vec<String> = s
            .split("::")
            .map(|seg| seg.trim().to_string())
            .collect();

        if segments.iter().any(|seg| seg.is_empty()) {
            return Err(ManifexError::InvalidManifest(format!(
                "classifier with empty segment: {}",
                s
            )));
        }

        Ok(Self { segments })
    }

    /// The top-level category segment
    pub fn category(&self) -> &str {
        self.segments.first().map(|s| s.as_str()).unwrap_or("")
    }

    /// Whether the category is one the index accepts
    pub fn is_known_category(&self) -> bool {
        KNOWN_CATEGORIES.contains(&self.category())
    }

    /// Suggest the closest known category for a near-miss, if any is
    /// reasonably close (normalized similarity above 0.75)
    pub fn suggest_category(&self) -> Option<&'static str> {
        if self.is_known_category() {
            return None;
        }

        KNOWN_CATEGORIES
            .iter()
            .map(|known| (*known, strsim::jaro_winkler(&self.category().to_lowercase(), &known.to_lowercase())))
            .filter(|(_, score)| *score > 0.75)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(known, _)| known)
    }

    /// Whether this is a license classifier
    pub fn is_license(&self) -> bool {
        self.category() == "License"
    }
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join(" :: "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifier() {
        let c = Classifier::parse(
            "License :: OSI Approved :: GNU Library or Lesser General Public License (LGPL)",
        )
        .unwrap();
        assert_eq!(c.segments.len(), 3);
        assert_eq!(c.category(), "License");
        assert!(c.is_known_category());
        assert!(c.is_license());
    }

    #[test]
    fn test_parse_trims_segments() {
        let c = Classifier::parse("Operating System :: OS Independent").unwrap();
        assert_eq!(c.segments, vec!["Operating System", "OS Independent"]);
        assert_eq!(c.to_string(), "Operating System :: OS Independent");
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(Classifier::parse("License :: :: MIT").is_err());
        assert!(Classifier::parse("").is_err());
    }

    #[test]
    fn test_unknown_category_suggestion() {
        let c = Classifier::parse("Licence :: OSI Approved").unwrap();
        assert!(!c.is_known_category());
        assert_eq!(c.suggest_category(), Some("License"));
    }

    #[test]
    fn test_no_suggestion_when_far_off() {
        let c = Classifier::parse("Completely Bogus Category :: Foo").unwrap();
        assert_eq!(c.suggest_category(), None);
    }
}
