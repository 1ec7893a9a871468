//! Package index integration
//!
//! Looks requirements up on the PyPI JSON API to confirm that declared
//! dependencies actually exist. Used by the opt-in online pass of `check`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{ManifexError, Result};

/// Default JSON API base URL
const INDEX_URL: &str = "https://pypi.org/pypi";

/// Project info returned by the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexProject {
    /// Canonical project name
    pub name: String,
    /// Latest released version
    pub version: String,
    /// Project summary
    pub summary: Option<String>,
}

/// JSON API response envelope
#[derive(Debug, Deserialize)]
struct IndexResponse {
    info: IndexInfo,
}

#[derive(Debug, Deserialize)]
struct IndexInfo {
    name: String,
    version: String,
    summary: Option<String>,
}

/// Client for the package index JSON API
pub struct IndexClient {
    client: Client,
    base_url: String,
}

impl IndexClient {
    /// Create a new index client with the default base URL
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_base_url(INDEX_URL, timeout_secs)
    }

    /// Create a new index client against a custom base URL
    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .user_agent(format!("{}/{}", crate::NAME, crate::VERSION))
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    /// Fetch project info; `Ok(None)` means the project does not exist
    pub async fn project(&self, name: &str) -> Result<Option<IndexProject>> {
        let url = format!("{}/{}/json", self.base_url, name);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ManifexError::Network(e.to_string()))?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            return Err(ManifexError::IndexApi(format!(
                "index returned {} for {}",
                resp.status(),
                name
            )));
        }

        let body: IndexResponse = resp
            .json()
            .await
            .map_err(|e| ManifexError::IndexApi(e.to_string()))?;

        Ok(Some(IndexProject {
            name: body.info.name,
            version: body.info.version,
            summary: body.info.summary,
        }))
    }

    /// Whether a project exists on the index
    pub async fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.project(name).await?.is_some())
    }
}

impl Default for IndexClient {
    fn default() -> Self {
        Self::new(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_construction() {
        let client = IndexClient::with_base_url("http://localhost:1/pypi", 5);
        assert_eq!(client.base_url, "http://localhost:1/pypi");
    }

    #[tokio::test]
    async fn test_unreachable_index_is_network_error() {
        // Nothing listens on this port; the lookup must surface a network
        // error rather than panic or hang past the timeout.
        let client = IndexClient::with_base_url("http://127.0.0.1:1/pypi", 1);
        let result = client.project("jsonrpc").await;
        assert!(matches!(result, Err(ManifexError::Network(_))));
    }
}
