//! Credential loading for shipyard
//!
//! Tokens are read from the process environment first, then from a local
//! dotenv-style `.env` file in the working directory. A value already set
//! in the environment is never overridden by the file.
//!
//! Loading priority:
//! 1. Environment variables (GITHUB_TOKEN, PYPI_API_TOKEN)
//! 2. `.env` file in the working directory

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Environment variable holding the GitHub personal access token
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Environment variable holding the PyPI API token
pub const PYPI_TOKEN_VAR: &str = "PYPI_API_TOKEN";

/// Credentials resolved at process start and passed into clients
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Values parsed from the `.env` file, if one was found
    file_vars: HashMap<String, String>,
}

impl Secrets {
    /// Load secrets, reading a `.env` file from the given directory if present
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(".env");

        if path.exists() {
            return Self::load_from_file(&path);
        }

        Ok(Self::default())
    }

    /// Load secrets from a specific dotenv-style file
    ///
    /// The file is parsed into a local map rather than exported into the
    /// process environment, so values already set there keep priority.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| Error::Config(format!("Could not read {}: {}", path.display(), e)))?;

        let mut file_vars = HashMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| {
                Error::Config(format!("Invalid line in {}: {}", path.display(), e))
            })?;
            file_vars.insert(key, value);
        }

        debug!(path = %path.display(), keys = file_vars.len(), "Loaded .env file");

        Ok(Self { file_vars })
    }

    /// Look up a variable, environment first, then the `.env` file
    pub fn var(&self, key: &str) -> Option<String> {
        if let Ok(value) = std::env::var(key) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                debug!(key, "Using value from process environment");
                return Some(value);
            }
        }

        if let Some(value) = self.file_vars.get(key) {
            if !value.is_empty() {
                debug!(key, "Using value from .env file");
                return Some(value.clone());
            }
        }

        None
    }

    /// Get the GitHub token
    pub fn github_token(&self) -> Option<String> {
        self.var(GITHUB_TOKEN_VAR)
    }

    /// Get the GitHub token, failing with a diagnostic if it is not set
    pub fn require_github_token(&self) -> Result<String> {
        self.github_token().ok_or_else(|| {
            Error::MissingCredential(format!(
                "{} not set. Set it in the environment or in a .env file",
                GITHUB_TOKEN_VAR
            ))
        })
    }

    /// Get the PyPI API token
    pub fn pypi_token(&self) -> Option<String> {
        self.var(PYPI_TOKEN_VAR)
    }

    /// Get the PyPI token, failing with a diagnostic if it is not set
    pub fn require_pypi_token(&self) -> Result<String> {
        self.pypi_token().ok_or_else(|| {
            Error::MissingCredential(format!(
                "{} not set. Set it in the environment or in a .env file",
                PYPI_TOKEN_VAR
            ))
        })
    }
}
