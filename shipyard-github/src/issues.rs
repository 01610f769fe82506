//! Issue fetching and management

use crate::client::map_api_error;
use crate::{Error, GitHubClient, Result};
use chrono::{DateTime, Utc};
use octocrab::models::issues::Issue as OctocrabIssue;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl From<octocrab::models::IssueState> for IssueState {
    fn from(state: octocrab::models::IssueState) -> Self {
        match state {
            octocrab::models::IssueState::Open => IssueState::Open,
            octocrab::models::IssueState::Closed => IssueState::Closed,
            _ => IssueState::Open, // Default to open for unknown states
        }
    }
}

/// A label with its display color as reported by GitHub
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Label name
    pub name: String,
    /// Six-hex-digit color string, no leading `#`
    pub color: String,
}

/// GitHub issue representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Issue number
    pub number: u64,
    /// Issue title
    pub title: String,
    /// Issue body/description
    pub body: Option<String>,
    /// Current state (open/closed)
    pub state: IssueState,
    /// Labels attached to the issue, in API order
    pub labels: Vec<Label>,
    /// Login of the issue author
    pub author: String,
    /// When the issue was created
    pub created_at: DateTime<Utc>,
    /// Web URL of the issue
    pub html_url: String,
}

impl Issue {
    /// Name of the first label, used for display
    pub fn primary_label(&self) -> Option<&Label> {
        self.labels.first()
    }
}

impl From<OctocrabIssue> for Issue {
    fn from(issue: OctocrabIssue) -> Self {
        Issue {
            number: issue.number,
            title: issue.title,
            body: issue.body,
            state: issue.state.into(),
            labels: issue
                .labels
                .into_iter()
                .map(|l| Label {
                    name: l.name,
                    color: l.color,
                })
                .collect(),
            author: issue.user.login,
            created_at: issue.created_at,
            html_url: issue.html_url.to_string(),
        }
    }
}

impl GitHubClient {
    /// Fetch a single issue by number
    pub async fn get_issue(&self, number: u64) -> Result<Issue> {
        debug!(number, "Fetching issue");

        let issue = self
            .client()
            .issues(self.owner(), self.repo())
            .get(number)
            .await
            .map_err(|e| map_api_error(e, Some(number)))?;

        Ok(issue.into())
    }

    /// List all open issues, paginating until an empty page
    pub async fn list_open_issues(&self) -> Result<Vec<Issue>> {
        debug!("Listing open issues");

        let mut all_issues = Vec::new();
        let mut page_num = 1u32;

        loop {
            let page = self
                .client()
                .issues(self.owner(), self.repo())
                .list()
                .state(octocrab::params::State::Open)
                .per_page(100)
                .page(page_num)
                .send()
                .await
                .map_err(|e| map_api_error(e, None))?;

            let items: Vec<Issue> = page.items.into_iter().map(Issue::from).collect();

            if items.is_empty() {
                break;
            }

            all_issues.extend(items);
            page_num += 1;
        }

        info!(count = all_issues.len(), "Fetched open issues");

        Ok(all_issues)
    }

    /// Create an issue with the given title, body, and labels
    pub async fn create_issue(
        &self,
        title: &str,
        body: Option<&str>,
        labels: &[String],
    ) -> Result<Issue> {
        debug!(title, ?labels, "Creating issue");

        let handler = self.client().issues(self.owner(), self.repo());
        let mut builder = handler.create(title).labels(labels.to_vec());
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let issue = builder.send().await.map_err(|e| map_api_error(e, None))?;

        info!(number = issue.number, "Created issue");

        Ok(issue.into())
    }

    /// Close an issue
    pub async fn close_issue(&self, number: u64) -> Result<Issue> {
        debug!(number, "Closing issue");

        let issue = self
            .client()
            .issues(self.owner(), self.repo())
            .update(number)
            .state(octocrab::models::IssueState::Closed)
            .send()
            .await
            .map_err(|e| map_api_error(e, Some(number)))?;

        info!(number, "Closed issue");

        Ok(issue.into())
    }

    /// List the repository's labels with their colors
    pub async fn list_labels(&self) -> Result<Vec<Label>> {
        debug!("Listing repository labels");

        let page = self
            .client()
            .issues(self.owner(), self.repo())
            .list_labels_for_repo()
            .per_page(100)
            .send()
            .await
            .map_err(|e| map_api_error(e, None))?;

        Ok(page
            .items
            .into_iter()
            .map(|l| Label {
                name: l.name,
                color: l.color,
            })
            .collect())
    }

    /// Map of label name to hex color for display
    pub async fn label_colors(&self) -> Result<std::collections::HashMap<String, String>> {
        let labels = self.list_labels().await?;
        Ok(labels.into_iter().map(|l| (l.name, l.color)).collect())
    }
}
