//! PyPI JSON index client

use std::time::Duration;

use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// Result type for PyPI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while querying PyPI
#[derive(ThisError, Debug)]
pub enum Error {
    /// Transport-level failure; the poll does not retry these
    #[error("PyPI request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// PyPI answered with a status that is neither found nor not-found
    #[error("PyPI returned unexpected status {0}")]
    UnexpectedStatus(reqwest::StatusCode),
}

const PYPI_BASE_URL: &str = "https://pypi.org";

/// Client for PyPI's public JSON metadata endpoint
#[derive(Debug, Clone)]
pub struct PyPiClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for PyPiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PyPiClient {
    /// Create a client against pypi.org
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: PYPI_BASE_URL.to_string(),
        }
    }

    /// Create a client against a custom index URL (used by tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Check once whether a specific version of a package is published
    ///
    /// Existence of `/pypi/{package}/{version}/json` implies published.
    pub async fn version_exists(&self, package: &str, version: &str) -> Result<bool> {
        let url = format!("{}/pypi/{}/{}/json", self.base_url, package, version);

        debug!(%url, "Checking PyPI for version");

        let response = self.http.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::UnexpectedStatus(status)),
        }
    }

    /// Poll until the version appears, with a fixed interval between
    /// attempts
    ///
    /// Makes at most `max_attempts` requests. Retries only on "not yet
    /// found"; transport errors and unexpected statuses propagate
    /// immediately. Returns whether the version was seen.
    pub async fn poll_for_version(
        &self,
        package: &str,
        version: &str,
        max_attempts: u32,
        delay: Duration,
    ) -> Result<bool> {
        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, package, version, "Polling PyPI");

            if self.version_exists(package, version).await? {
                info!(package, version, "Version visible on PyPI");
                return Ok(true);
            }

            if attempt < max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        warn!(package, version, max_attempts, "Version never appeared on PyPI");

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_version_exists() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pypi/demo/1.2.4/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "info": { "name": "demo", "version": "1.2.4" }
            })))
            .mount(&server)
            .await;

        let client = PyPiClient::with_base_url(server.uri());
        assert!(client.version_exists("demo", "1.2.4").await.unwrap());
    }

    #[tokio::test]
    async fn test_version_missing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pypi/demo/9.9.9/json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = PyPiClient::with_base_url(server.uri());
        assert!(!client.version_exists("demo", "9.9.9").await.unwrap());
    }

    #[tokio::test]
    async fn test_unexpected_status_is_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pypi/demo/1.0.0/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = PyPiClient::with_base_url(server.uri());
        let err = client.version_exists("demo", "1.0.0").await.unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus(_)));
    }

    #[tokio::test]
    async fn test_poll_exhausts_exactly_max_attempts() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pypi/demo/2.0.0/json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let client = PyPiClient::with_base_url(server.uri());
        let delay = Duration::from_millis(20);

        let start = Instant::now();
        let found = client
            .poll_for_version("demo", "2.0.0", 3, delay)
            .await
            .unwrap();

        assert!(!found);
        // Two sleeps between three attempts
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_poll_stops_when_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/pypi/demo/2.0.0/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = PyPiClient::with_base_url(server.uri());
        let found = client
            .poll_for_version("demo", "2.0.0", 5, Duration::from_millis(5))
            .await
            .unwrap();

        assert!(found);
    }
}
