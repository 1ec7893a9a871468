//! pyproject.toml generation
//!
//! Renders manifest metadata into a PEP 621 `[project]` table with a
//! setuptools `[build-system]`. Legacy-only fields (`scripts` as installable
//! files, `py_modules`, explicit `packages`) are carried under
//! `[tool.setuptools]` so the result stays buildable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::error::{ManifexError, Result};
use crate::models::{Contact, LongDescription, ManifestMetadata};

#[derive(Debug, Serialize)]
struct PyProject {
    #[serde(rename = "build-system")]
    build_system: BuildSystem,
    project: Project,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool: Option<Tool>,
}

#[derive(Debug, Serialize)]
struct BuildSystem {
    requires: Vec<String>,
    #[serde(rename = "build-backend")]
    build_backend: String,
}

#[derive(Debug, Serialize)]
struct Project {
    name: String,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    classifiers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    readme: Option<Readme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    license: Option<License>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    authors: Vec<ProjectContact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    maintainers: Vec<ProjectContact>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    urls: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Readme {
    Path(String),
    Inline {
        text: String,
        #[serde(rename = "content-type")]
        content_type: String,
    },
}

#[derive(Debug, Serialize)]
struct License {
    text: String,
}

#[derive(Debug, Serialize)]
struct ProjectContact {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

impl From<Contact> for ProjectContact {
    fn from(contact: Contact) -> Self {
        Self {
            name: contact.name,
            // The legacy manifests sometimes wrap emails in angle brackets
            email: contact.email.map(|e| e.trim_matches(['<', '>']).to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Tool {
    setuptools: SetuptoolsTool,
}

#[derive(Debug, Default, Serialize)]
struct SetuptoolsTool {
    #[serde(rename = "script-files", skip_serializing_if = "Vec::is_empty")]
    script_files: Vec<String>,
    #[serde(rename = "py-modules", skip_serializing_if = "Vec::is_empty")]
    py_modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    packages: Vec<String>,
}

/// Generator for pyproject.toml output
pub struct PyprojectGenerator {
    /// Manifest being converted
    metadata: ManifestMetadata,
}

impl PyprojectGenerator {
    /// Create a new generator
    pub fn new(metadata: ManifestMetadata) -> Self {
        Self { metadata }
    }

    /// Render the pyproject.toml content
    pub fn render(&self) -> Result<String> {
        let readme = self.metadata.long_description.as_ref().map(|d| match d {
            LongDescription::File(path) => Readme::Path(path.display().to_string()),
            LongDescription::Text(text) => Readme::Inline {
                text: text.clone(),
                content_type: "text/plain".to_string(),
            },
        });

        let mut urls = BTreeMap::new();
        if let Some(ref url) = self.metadata.url {
            urls.insert("Homepage".to_string(), url.clone());
        }

        let setuptools = SetuptoolsTool {
            script_files: self.metadata.scripts.clone(),
            py_modules: self.metadata.py_modules.clone(),
            packages: self.metadata.packages.clone(),
        };
        let tool = if setuptools.script_files.is_empty()
            && setuptools.py_modules.is_empty()
            && setuptools.packages.is_empty()
        {
            None
        } else {
            Some(Tool { setuptools })
        };

        let document = PyProject {
            build_system: BuildSystem {
                requires: vec!["setuptools>=61".to_string()],
                build_backend: "setuptools.build_meta".to_string(),
            },
            project: Project {
                name: self.metadata.name.clone(),
                version: self.metadata.version.clone(),
                description: self.metadata.description.clone(),
                readme,
                license: self.metadata.license.clone().map(|text| License { text }),
                authors: self
                    .metadata
                    .contact()
                    .filter(|_| self.metadata.author.is_some())
                    .map(|c| vec![c.into()])
                    .unwrap_or_default(),
                maintainers: self
                    .metadata
                    .maintainer_contact()
                    .map(|c| vec![c.into()])
                    .unwrap_or_default(),
                classifiers: self
                    .metadata
                    .classifiers
                    .iter()
                    .map(|c| c.to_string())
                    .collect(),
                dependencies: self
                    .metadata
                    .requires
                    .iter()
                    .map(|r| r.to_pep508())
                    .collect(),
                urls,
            },
            tool,
        };

        let body = toml::to_string_pretty(&document)
            .map_err(|e| ManifexError::Generation(e.to_string()))?;

        Ok(format!(
            "# Converted from setup.py by {} {} on {}\n{}",
            crate::NAME,
            crate::VERSION,
            chrono::Utc::now().format("%Y-%m-%d"),
            body
        ))
    }

    /// Write the rendered content to a file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = self.render()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
