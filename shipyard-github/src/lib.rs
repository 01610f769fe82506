//! Shipyard GitHub - GitHub integration for the shipyard CLI
//!
//! This crate wraps the GitHub REST API (via octocrab) for issue and
//! release operations, and the GraphQL API (via reqwest) for the
//! operations REST does not cover, such as permanent issue deletion.

mod client;
mod delete;
mod error;
mod graphql;
mod issues;
mod release;

pub use client::GitHubClient;
pub use delete::{DeleteFailure, DeleteStage, DeletedIssue};
pub use error::{Error, Result};
pub use issues::{Issue, IssueState, Label};
pub use release::ReleaseInfo;
