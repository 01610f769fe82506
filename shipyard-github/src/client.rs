//! GitHub API client using octocrab

use crate::{Error, Result};
use octocrab::Octocrab;
use shipyard_core::RepoRef;
use tracing::info;

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// GitHub API client bound to a single repository
///
/// The token is a constructor argument rather than being read from the
/// environment at call sites, so a missing credential is detected before
/// any network call is made.
pub struct GitHubClient {
    client: Octocrab,
    http: reqwest::Client,
    repo: RepoRef,
    token: String,
    graphql_url: String,
}

impl GitHubClient {
    /// Create a new GitHub client for the given repository
    pub fn new(repo: RepoRef, token: impl Into<String>) -> Result<Self> {
        let token = token.into();

        let client = Octocrab::builder()
            .personal_token(token.clone())
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        info!(repo = %repo, "Created GitHub client");

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            repo,
            token,
            graphql_url: GITHUB_GRAPHQL_URL.to_string(),
        })
    }

    /// Create a client pointed at custom REST and GraphQL endpoints
    ///
    /// Used by tests to direct traffic at a local mock server.
    pub fn with_base_urls(
        repo: RepoRef,
        token: impl Into<String>,
        rest_base: &str,
        graphql_url: impl Into<String>,
    ) -> Result<Self> {
        let token = token.into();

        let client = Octocrab::builder()
            .personal_token(token.clone())
            .base_uri(rest_base)
            .map_err(|e| Error::Other(format!("Invalid base URI: {}", e)))?
            .build()
            .map_err(|e| Error::Auth(format!("Failed to create GitHub client: {}", e)))?;

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            repo,
            token,
            graphql_url: graphql_url.into(),
        })
    }

    /// Get the repository owner
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Get the repository name
    pub fn repo(&self) -> &str {
        &self.repo.name
    }

    /// Get the owner/name pair
    pub fn repo_ref(&self) -> &RepoRef {
        &self.repo
    }

    /// Get the underlying octocrab client
    pub(crate) fn client(&self) -> &Octocrab {
        &self.client
    }

    /// Get the shared reqwest client used for GraphQL calls
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Get the bearer token
    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Get the GraphQL endpoint URL
    pub(crate) fn graphql_url(&self) -> &str {
        &self.graphql_url
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Map an octocrab error to our error type, recognizing the API's
/// well-known failure messages
pub(crate) fn map_api_error(e: octocrab::Error, issue_number: Option<u64>) -> Error {
    if let octocrab::Error::GitHub { ref source, .. } = e {
        if source.message.contains("Not Found") {
            if let Some(number) = issue_number {
                return Error::IssueNotFound(number);
            }
        }
        if source.message.contains("Bad credentials") {
            return Error::Auth("Invalid GitHub token".to_string());
        }
        if source.message.to_lowercase().contains("rate limit") {
            return Error::RateLimited(source.message.clone());
        }
    }
    Error::Api(e)
}
