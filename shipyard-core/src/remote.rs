//! Git remote URL parsing

use crate::{Error, Result};

/// An owner/repository pair identifying a GitHub repository
///
/// Derived once per invocation from the git remote URL and passed around
/// by reference afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Parse a GitHub remote URL into owner and repository name
    ///
    /// Supported formats:
    /// - `git@github.com:owner/repo.git` (and without `.git`)
    /// - `https://github.com/owner/repo.git` (and without `.git`)
    ///
    /// Custom SSH ports and non-GitHub hosts are not recognized. The
    /// original URL is carried in the error for diagnosis.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();

        let path = if let Some(rest) = url.strip_prefix("git@github.com:") {
            rest
        } else if let Some(rest) = url.strip_prefix("https://github.com/") {
            rest
        } else {
            return Err(Error::UnrecognizedRemote(url.to_string()));
        };

        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut parts = path.splitn(2, '/');

        match (parts.next(), parts.next()) {
            (Some(owner), Some(name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::UnrecognizedRemote(url.to_string())),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ssh_with_git_suffix() {
        let repo = RepoRef::parse("git@github.com:octocat/hello-world.git").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
    }

    #[test]
    fn test_parse_ssh_without_git_suffix() {
        let repo = RepoRef::parse("git@github.com:octocat/hello-world").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
    }

    #[test]
    fn test_parse_https_with_git_suffix() {
        let repo = RepoRef::parse("https://github.com/octocat/hello-world.git").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
    }

    #[test]
    fn test_parse_https_without_git_suffix() {
        let repo = RepoRef::parse("https://github.com/octocat/hello-world").unwrap();
        assert_eq!(repo.owner, "octocat");
        assert_eq!(repo.name, "hello-world");
    }

    #[test]
    fn test_parse_trailing_whitespace() {
        let repo = RepoRef::parse("git@github.com:octocat/hello-world.git\n").unwrap();
        assert_eq!(repo.name, "hello-world");
    }

    #[test]
    fn test_parse_unrelated_string_keeps_input() {
        let err = RepoRef::parse("ftp://example.com/some/path").unwrap_err();
        match err {
            Error::UnrecognizedRemote(url) => {
                assert_eq!(url, "ftp://example.com/some/path");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_non_github_host_rejected() {
        assert!(RepoRef::parse("git@gitlab.com:owner/repo.git").is_err());
        assert!(RepoRef::parse("https://gitlab.com/owner/repo").is_err());
    }

    #[test]
    fn test_parse_missing_repo_component() {
        assert!(RepoRef::parse("https://github.com/owner").is_err());
        assert!(RepoRef::parse("git@github.com:owner/").is_err());
    }

    #[test]
    fn test_display() {
        let repo = RepoRef {
            owner: "octocat".to_string(),
            name: "hello-world".to_string(),
        };
        assert_eq!(repo.to_string(), "octocat/hello-world");
    }
}
