//! GitHub contents API client
//!
//! Only used to read a repository's Dockerfile before wiring a workflow.

use crate::error::{AzError, Result};
use reqwest::StatusCode;

const GITHUB_API_BASE: &str = "https://api.github.com";

pub struct GitHubClient {
    client: reqwest::Client,
    api_base: String,
}

impl Default for GitHubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHubClient {
    pub fn new() -> Self {
        Self::with_api_base(GITHUB_API_BASE)
    }

    pub fn with_api_base(api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
        }
    }

    /// Raw file contents at `git_ref`, `None` if the file does not exist
    pub async fn get_file(
        &self,
        repo_url: &str,
        git_ref: &str,
        path: &str,
        token: Option<&str>,
    ) -> Result<Option<Vec<u8>>> {
        let repo = repo_url_to_name(repo_url)
            .ok_or_else(|| AzError::GitHub(format!("Not a GitHub repository URL: {}", repo_url)))?;
        let url = format!("{}/repos/{}/contents/{}", self.api_base, repo, path);

        tracing::debug!("Fetching {} at {}", url, git_ref);

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", git_ref)])
            .header("Accept", "application/vnd.github.raw")
            .header("User-Agent", concat!("upflow/", env!("CARGO_PKG_VERSION")));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(AzError::GitHub(format!("{} ({}): {}", url, status, body)))
            }
        }
    }
}

/// `owner/repo` from a GitHub URL, e.g. `https://github.com/acme/web.git` → `acme/web`
pub fn repo_url_to_name(repo_url: &str) -> Option<String> {
    let rest = repo_url
        .trim()
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .split_once("github.com")
        .map(|(_, rest)| rest)?;
    let rest = rest.trim_start_matches([':', '/']);

    let mut parts = rest.split('/').filter(|p| !p.is_empty());
    let owner = parts.next()?;
    let repo = parts.next()?;
    Some(format!("{}/{}", owner, repo))
}
