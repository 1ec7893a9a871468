//! Manifest validation and structural checks

use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::ManifestMetadata;

/// Validator for manifest metadata
pub struct ManifestValidator<'a> {
    /// Manifest under validation
    metadata: &'a ManifestMetadata,
}

/// Validation report
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Manifest this report is about (`name version`)
    pub manifest: String,
    /// Unix timestamp the report was generated at
    pub generated_at: i64,
    /// Error messages (the manifest violates the packaging contract)
    pub errors: Vec<String>,
    /// Warning messages
    pub warnings: Vec<String>,
    /// Total declared requirement count
    pub requirement_count: usize,
    /// Requirements confirmed to exist on the package index (online pass)
    pub resolved_count: usize,
    /// Requirement names the index did not know (online pass)
    pub unresolved_requirements: Vec<String>,
    /// Referenced files confirmed to exist next to the manifest
    pub verified_files: usize,
    /// Referenced files missing next to the manifest
    pub missing_files: Vec<String>,
}

impl ValidationReport {
    /// Whether the report contains any errors
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Whether the report is completely clean
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Record the outcome of an online index lookup
    pub fn record_resolution(&mut self, name: &str, found: bool) {
        if found {
            self.resolved_count += 1;
        } else {
            self.unresolved_requirements.push(name.to_string());
            self.warnings
                .push(format!("requirement '{}' not found on the package index", name));
        }
    }
}

impl<'a> ManifestValidator<'a> {
    /// Create a new validator
    pub fn new(metadata: &'a ManifestMetadata) -> Self {
        Self { metadata }
    }

    /// Run all offline checks
    pub fn validate(&self) -> Result<ValidationReport> {
        let mut report = ValidationReport {
            manifest: self.metadata.display_name(),
            generated_at: chrono::Utc::now().timestamp(),
            ..ValidationReport::default()
        };

        self.check_required_fields(&mut report);
        self.check_contacts(&mut report);
        self.check_url(&mut report);
        self.check_license(&mut report);
        self.check_requirements(&mut report);
        self.check_classifiers(&mut report);

        if let Some(ref dir) = self.metadata.source_dir {
            self.check_referenced_files(dir, &mut report);
        }

        Ok(report)
    }

    /// Required fields: name and version must be non-empty and well-formed
    fn check_required_fields(&self, report: &mut ValidationReport) {
        lazy_static::lazy_static! {
            static ref NAME_RE: Regex =
                Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9._-]*[A-Za-z0-9])?$").unwrap();
        }

        if self.metadata.name.trim().is_empty() {
            report.errors.push("name is empty".into());
        } else if !NAME_RE.is_match(&self.metadata.name) {
            report.errors.push(format!(
                "name '{}' is not a valid distribution name",
                self.metadata.name
            ));
        }

        if self.metadata.version.trim().is_empty() {
            report.errors.push("version is empty".into());
        } else {
            let mut normalized = self.metadata.clone();
            normalized.normalize_version();
            if normalized.version != self.metadata.version {
                report.warnings.push(format!(
                    "version '{}' is not in normalized form (expected '{}')",
                    self.metadata.version, normalized.version
                ));
            }
        }

        if self
            .metadata
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            report.warnings.push("no description declared".into());
        }
    }

    /// Attribution: someone must be reachable, and emails must look sane
    fn check_contacts(&self, report: &mut ValidationReport) {
        lazy_static::lazy_static! {
            static ref EMAIL_RE: Regex =
                Regex::new(r"^<?[^@\s<>]+@[^@\s<>]+\.[^@\s<>]+>?$").unwrap();
        }

        if self.metadata.author.is_none() && self.metadata.maintainer.is_none() {
            report
                .warnings
                .push("neither author nor maintainer declared".into());
        }

        for (field, email) in [
            ("author_email", &self.metadata.author_email),
            ("maintainer_email", &self.metadata.maintainer_email),
        ] {
            if let Some(email) = email {
                if !EMAIL_RE.is_match(email) {
                    report
                        .warnings
                        .push(format!("{} '{}' does not look like an email address", field, email));
                }
            }
        }
    }

    /// Homepage URL must be http(s) with a host
    fn check_url(&self, report: &mut ValidationReport) {
        lazy_static::lazy_static! {
            static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/]+\S*$").unwrap();
        }

        if let Some(ref url) = self.metadata.url {
            if !URL_RE.is_match(url) {
                report
                    .warnings
                    .push(format!("url '{}' is not a valid http(s) URL", url));
            }
        }
    }

    /// A license should be declared via the field or a License classifier
    fn check_license(&self, report: &mut ValidationReport) {
        let has_field = self
            .metadata
            .license
            .as_deref()
            .map(str::trim)
            .map_or(false, |l| !l.is_empty());
        let has_classifier = !self.metadata.license_classifiers().is_empty();

        if !has_field && !has_classifier {
            report.warnings.push(
                "no license declared (neither a license field nor a License classifier)".into(),
            );
        }
    }

    /// Requirements: parse failures and duplicates
    fn check_requirements(&self, report: &mut ValidationReport) {
        report.requirement_count =
            self.metadata.requires.len() + self.metadata.invalid_requires.len();

        for raw in &self.metadata.invalid_requires {
            report
                .warnings
                .push(format!("unparseable requires entry: {}", raw));
        }

        let mut seen = HashSet::new();
        for req in &self.metadata.requires {
            if !seen.insert(req.canonical_name()) {
                report
                    .warnings
                    .push(format!("duplicate requirement: {}", req.name));
            }
        }
    }

    /// Classifiers: parse failures and unknown categories
    fn check_classifiers(&self, report: &mut ValidationReport) {
        for raw in &self.metadata.invalid_classifiers {
            report
                .warnings
                .push(format!("unparseable classifier: {}", raw));
        }

        for classifier in &self.metadata.classifiers {
            if !classifier.is_known_category() {
                let mut msg = format!("unknown classifier category: {}", classifier.category());
                if let Some(suggestion) = classifier.suggest_category() {
                    msg.push_str(&format!(" (did you mean '{}'?)", suggestion));
                }
                report.warnings.push(msg);
            }
        }
    }

    /// Script/package/module references must exist next to the manifest
    fn check_referenced_files(&self, dir: &Path, report: &mut ValidationReport) {
        for script in &self.metadata.scripts {
            self.check_file(dir.join(script), script, report);
        }

        for package in &self.metadata.packages {
            let rel: String = package.split('.').collect::<Vec<_>>().join("/");
            let init = format!("{}/__init__.py", rel);
            self.check_file(dir.join(&init), &init, report);
        }

        for module in &self.metadata.py_modules {
            let file = format!("{}.py", module.replace('.', "/"));
            self.check_file(dir.join(&file), &file, report);
        }

        if let Some(readme) = self
            .metadata
            .long_description
            .as_ref()
            .and_then(|d| d.file())
        {
            let rel = readme.display().to_string();
            self.check_file(dir.join(readme), &rel, report);
        }
    }

    fn check_file(&self, path: std::path::PathBuf, rel: &str, report: &mut ValidationReport) {
        if path.exists() {
            report.verified_files += 1;
        } else {
            report.missing_files.push(rel.to_string());
            report
                .warnings
                .push(format!("referenced file does not exist: {}", rel));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classifier, Requirement};

    fn validate(meta: &ManifestMetadata) -> ValidationReport {
        ManifestValidator::new(meta).validate().unwrap()
    }

    fn minimal() -> ManifestMetadata {
        let mut meta = ManifestMetadata::new("pkg", "1.0");
        meta.description = Some("A package".into());
        meta.author = Some("Someone".into());
        meta.license = Some("MIT".into());
        meta
    }

    #[test]
    fn test_clean_manifest() {
        let report = validate(&minimal());
        assert!(report.is_clean(), "unexpected findings: {:?}", report);
    }

    #[test]
    fn test_empty_name_is_error() {
        let mut meta = minimal();
        meta.name = "".into();
        let report = validate(&meta);
        assert!(report.has_errors());
        assert!(report.errors[0].contains("name is empty"));
    }

    #[test]
    fn test_invalid_name_is_error() {
        let mut meta = minimal();
        meta.name = "-bad-name-".into();
        assert!(validate(&meta).has_errors());
    }

    #[test]
    fn test_empty_version_is_error() {
        let mut meta = minimal();
        meta.version = " ".into();
        assert!(validate(&meta).has_errors());
    }

    #[test]
    fn test_unnormalized_version_is_warning() {
        let mut meta = minimal();
        meta.version = "v1.0-alpha1".into();
        let report = validate(&meta);
        assert!(!report.has_errors());
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("expected '1.0a1'")));
    }

    #[test]
    fn test_missing_attribution_is_warning() {
        let mut meta = minimal();
        meta.author = None;
        let report = validate(&meta);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("neither author nor maintainer")));
    }

    #[test]
    fn test_angle_bracketed_email_accepted() {
        // One of the original manifests writes '<jgarzik@exmulti.com>'
        let mut meta = minimal();
        meta.author_email = Some("<jgarzik@exmulti.com>".into());
        assert!(validate(&meta).is_clean());
    }

    #[test]
    fn test_bad_email_is_warning() {
        let mut meta = minimal();
        meta.author_email = Some("not-an-email".into());
        assert!(validate(&meta)
            .warnings
            .iter()
            .any(|w| w.contains("does not look like an email address")));
    }

    #[test]
    fn test_bad_url_is_warning() {
        let mut meta = minimal();
        meta.url = Some("ftp:::nowhere".into());
        assert!(validate(&meta)
            .warnings
            .iter()
            .any(|w| w.contains("not a valid http(s) URL")));
    }

    #[test]
    fn test_missing_license_is_warning() {
        let mut meta = minimal();
        meta.license = None;
        assert!(validate(&meta)
            .warnings
            .iter()
            .any(|w| w.contains("no license declared")));
    }

    #[test]
    fn test_license_classifier_counts() {
        let mut meta = minimal();
        meta.license = None;
        meta.classifiers
            .push(Classifier::parse("License :: OSI Approved :: MIT License").unwrap());
        assert!(validate(&meta).is_clean());
    }

    #[test]
    fn test_duplicate_requirement_is_warning() {
        let mut meta = minimal();
        meta.requires.push(Requirement::new("json-rpc"));
        meta.requires.push(Requirement::new("JSON_RPC"));
        let report = validate(&meta);
        assert_eq!(report.requirement_count, 2);
        assert!(report
            .warnings
            .iter()
            .any(|w| w.contains("duplicate requirement")));
    }

    #[test]
    fn test_unknown_classifier_category() {
        let mut meta = minimal();
        meta.classifiers
            .push(Classifier::parse("Licence :: OSI Approved").unwrap());
        assert!(validate(&meta)
            .warnings
            .iter()
            .any(|w| w.contains("did you mean 'License'")));
    }

    #[test]
    fn test_referenced_files_checked_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("spendfrom.py"), "#!/usr/bin/env python\n").unwrap();

        let mut meta = minimal();
        meta.scripts = vec!["spendfrom.py".into(), "missing.py".into()];
        meta.source_dir = Some(dir.path().to_path_buf());

        let report = validate(&meta);
        assert_eq!(report.verified_files, 1);
        assert_eq!(report.missing_files, vec!["missing.py"]);
    }

    #[test]
    fn test_package_init_check() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("ticoinrpc")).unwrap();
        std::fs::write(dir.path().join("ticoinrpc/__init__.py"), "").unwrap();

        let mut meta = minimal();
        meta.packages = vec!["ticoinrpc".into(), "ghost.pkg".into()];
        meta.source_dir = Some(dir.path().to_path_buf());

        let report = validate(&meta);
        assert_eq!(report.verified_files, 1);
        assert_eq!(report.missing_files, vec!["ghost/pkg/__init__.py"]);
    }

    #[test]
    fn test_file_checks_skipped_without_source_dir() {
        let mut meta = minimal();
        meta.scripts = vec!["missing.py".into()];
        let report = validate(&meta);
        assert_eq!(report.verified_files, 0);
        assert!(report.missing_files.is_empty());
    }

    #[test]
    fn test_record_resolution() {
        let mut report = ValidationReport::default();
        report.record_resolution("jsonrpc", true);
        report.record_resolution("no-such-pkg", false);

        assert_eq!(report.resolved_count, 1);
        assert_eq!(report.unresolved_requirements, vec!["no-such-pkg"]);
    }
}
