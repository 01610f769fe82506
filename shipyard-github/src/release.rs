//! GitHub release creation

use crate::client::map_api_error;
use crate::{GitHubClient, Result};
use tracing::{debug, info};

/// A created GitHub release
#[derive(Debug, Clone)]
pub struct ReleaseInfo {
    /// Tag the release points at
    pub tag: String,
    /// Web URL of the release
    pub html_url: String,
}

impl GitHubClient {
    /// Create a release for an existing tag
    ///
    /// Deleting releases is not implemented; a created release is an
    /// irreversible step from the tool's point of view.
    pub async fn create_release(&self, tag: &str, name: &str, body: &str) -> Result<ReleaseInfo> {
        debug!(tag, "Creating GitHub release");

        let release = self
            .client()
            .repos(self.owner(), self.repo())
            .releases()
            .create(tag)
            .name(name)
            .body(body)
            .draft(false)
            .prerelease(false)
            .send()
            .await
            .map_err(|e| map_api_error(e, None))?;

        info!(tag, url = %release.html_url, "Created GitHub release");

        Ok(ReleaseInfo {
            tag: tag.to_string(),
            html_url: release.html_url.to_string(),
        })
    }
}
