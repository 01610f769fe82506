//! Permanent issue deletion via a staged REST + GraphQL sequence
//!
//! The REST API cannot delete issues, so deletion is three calls:
//! fetch the issue over REST to confirm it exists, resolve its GraphQL
//! node ID, then invoke the `deleteIssue` mutation. The sequence is
//! modeled as explicit stages so a failure names exactly how far it got;
//! a failure at any stage leaves the issue un-deleted.

use crate::{Error, GitHubClient, Label, Result};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error as ThisError;
use tracing::{debug, info};

/// The stage of the deletion sequence at which a failure occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStage {
    /// REST fetch to confirm the issue exists
    Fetch,
    /// GraphQL query resolving the issue's node ID
    ResolveId,
    /// GraphQL `deleteIssue` mutation
    Delete,
}

impl std::fmt::Display for DeleteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteStage::Fetch => write!(f, "fetch"),
            DeleteStage::ResolveId => write!(f, "resolve-id"),
            DeleteStage::Delete => write!(f, "delete"),
        }
    }
}

/// A deletion failure carrying the stage it occurred at
///
/// The issue is guaranteed to still exist unless the failed stage is
/// `Delete` and the API reported an ambiguous transport error.
#[derive(Debug, ThisError)]
#[error("issue deletion failed at {stage} stage: {source}")]
pub struct DeleteFailure {
    /// Which stage failed
    pub stage: DeleteStage,
    /// The underlying error
    #[source]
    pub source: Error,
}

/// Details of a successfully deleted issue, kept for reporting
#[derive(Debug, Clone)]
pub struct DeletedIssue {
    /// Issue number
    pub number: u64,
    /// Issue title at deletion time
    pub title: String,
    /// First label at deletion time, for display
    pub label: Option<Label>,
}

#[derive(Debug, Deserialize)]
struct NodeIdData {
    repository: Option<NodeIdRepository>,
}

#[derive(Debug, Deserialize)]
struct NodeIdRepository {
    issue: Option<NodeIdIssue>,
}

#[derive(Debug, Deserialize)]
struct NodeIdIssue {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteIssueData {
    delete_issue: Option<DeleteIssuePayload>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DeleteIssuePayload {
    repository: Option<RepositoryId>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RepositoryId {
    id: String,
}

impl GitHubClient {
    /// Permanently delete an issue
    ///
    /// Runs the staged sequence `Fetch -> ResolveId -> Delete`. A
    /// nonexistent issue fails at the fetch stage and no GraphQL call is
    /// made.
    pub async fn delete_issue(
        &self,
        number: u64,
    ) -> std::result::Result<DeletedIssue, DeleteFailure> {
        let issue = self.get_issue(number).await.map_err(|e| DeleteFailure {
            stage: DeleteStage::Fetch,
            source: e,
        })?;

        let node_id = self
            .resolve_issue_node_id(number)
            .await
            .map_err(|e| DeleteFailure {
                stage: DeleteStage::ResolveId,
                source: e,
            })?;

        self.delete_issue_by_node_id(&node_id)
            .await
            .map_err(|e| DeleteFailure {
                stage: DeleteStage::Delete,
                source: e,
            })?;

        info!(number, "Deleted issue");

        Ok(DeletedIssue {
            number,
            title: issue.title,
            label: issue.labels.into_iter().next(),
        })
    }

    /// Resolve the GraphQL node ID of an issue
    pub async fn resolve_issue_node_id(&self, number: u64) -> Result<String> {
        debug!(number, "Resolving issue node ID");

        let query = r#"
            query($owner: String!, $repo: String!, $number: Int!) {
                repository(owner: $owner, name: $repo) {
                    issue(number: $number) {
                        id
                    }
                }
            }
        "#;

        let variables = json!({
            "owner": self.owner(),
            "repo": self.repo(),
            "number": number,
        });

        let response: NodeIdData = self.graphql_query(query, &variables).await?;

        response
            .repository
            .and_then(|r| r.issue)
            .map(|i| i.id)
            .ok_or(Error::IssueNotFound(number))
    }

    /// Invoke the `deleteIssue` mutation for the given node ID
    pub async fn delete_issue_by_node_id(&self, node_id: &str) -> Result<()> {
        debug!(node_id, "Deleting issue via GraphQL mutation");

        let mutation = r#"
            mutation($issueId: ID!) {
                deleteIssue(input: {issueId: $issueId}) {
                    repository {
                        id
                    }
                }
            }
        "#;

        let variables = json!({ "issueId": node_id });

        let response: DeleteIssueData = self.graphql_query(mutation, &variables).await?;

        if response.delete_issue.is_none() {
            return Err(Error::Graphql(
                "deleteIssue mutation returned no payload".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard_core::RepoRef;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_repo() -> RepoRef {
        RepoRef {
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
        }
    }

    fn test_client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_base_urls(
            test_repo(),
            "ghp_test",
            &server.uri(),
            format!("{}/graphql", server.uri()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_delete_nonexistent_issue_makes_no_graphql_call() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world/issues/42"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "message": "Not Found",
                "documentation_url": "https://docs.github.com/rest"
            })))
            .mount(&server)
            .await;

        // The GraphQL endpoint must never be contacted
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let failure = client.delete_issue(42).await.unwrap_err();

        assert_eq!(failure.stage, DeleteStage::Fetch);
        assert!(matches!(failure.source, Error::IssueNotFound(42)));
    }

    #[tokio::test]
    async fn test_resolve_node_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "repository": {
                        "issue": { "id": "I_kwDOtest123" }
                    }
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let node_id = client.resolve_issue_node_id(7).await.unwrap();
        assert_eq!(node_id, "I_kwDOtest123");
    }

    #[tokio::test]
    async fn test_resolve_node_id_missing_issue() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "repository": { "issue": null }
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.resolve_issue_node_id(7).await.unwrap_err();
        assert!(matches!(err, Error::IssueNotFound(7)));
    }

    #[tokio::test]
    async fn test_delete_by_node_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "deleteIssue": {
                        "repository": { "id": "R_kgDOtest" }
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.delete_issue_by_node_id("I_kwDOtest123").await.unwrap();
    }

    #[tokio::test]
    async fn test_graphql_error_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [
                    { "message": "Resource not accessible by integration" }
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.delete_issue_by_node_id("I_kwDOtest123").await.unwrap_err();
        match err {
            Error::Graphql(msg) => assert!(msg.contains("Resource not accessible")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
