//! GitHub GraphQL API support for operations not available in the REST API

use crate::{Error, GitHubClient, Result};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

impl GitHubClient {
    /// Execute a GraphQL query against the configured endpoint
    pub(crate) async fn graphql_query<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        debug!(url = self.graphql_url(), "Executing GraphQL query");

        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http()
            .post(self.graphql_url())
            .header("Authorization", format!("Bearer {}", self.token()))
            .header("User-Agent", "shipyard")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Other(format!("GraphQL request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Graphql(format!(
                "request failed with status {}: {}",
                status, text
            )));
        }

        let graphql_response: GraphQLResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = graphql_response.errors {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(Error::Graphql(messages.join(", ")));
        }

        graphql_response
            .data
            .ok_or_else(|| Error::Graphql("response missing data".to_string()))
    }
}
