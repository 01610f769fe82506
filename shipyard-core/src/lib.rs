//! Shipyard Core - shared building blocks for the shipyard CLI
//!
//! This crate provides credential loading, git repository access,
//! remote URL parsing, and Python project metadata handling used by
//! the issue and release commands.

pub mod error;
pub mod git;
pub mod process;
pub mod project;
pub mod remote;
pub mod secrets;

pub use error::{Error, Result};
pub use git::GitRepo;
pub use process::{run_command, CommandOutput};
pub use project::{Bump, PyProject};
pub use remote::RepoRef;
pub use secrets::Secrets;
