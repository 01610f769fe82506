//! Git repository access for issue and release commands

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, StatusOptions};
use tracing::debug;

use crate::{Error, Result};

/// A git repository wrapper providing shipyard-specific operations
pub struct GitRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the repository root
    root: PathBuf,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    /// Open a git repository at the given path
    ///
    /// Searches upward from the given path to find the repository root.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::Config(format!(
                    "Not a git repository: {}. Run from inside a git repository.",
                    path.display()
                ))
            } else {
                Error::Git(e)
            }
        })?;

        let root = repo
            .workdir()
            .ok_or_else(|| Error::Config("Bare repositories are not supported".to_string()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Get the repository root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the URL of the `origin` remote
    pub fn origin_url(&self) -> Result<String> {
        let remote = self.repo.find_remote("origin").map_err(|_| {
            Error::Config(
                "No remote 'origin' configured. Add one with 'git remote add origin <url>'"
                    .to_string(),
            )
        })?;

        remote
            .url()
            .map(|u| u.to_string())
            .ok_or_else(|| Error::Config("Remote 'origin' has no URL".to_string()))
    }

    /// Check whether the working tree has no uncommitted changes
    ///
    /// Untracked files count as dirty; ignored files do not.
    pub fn is_clean(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;
        Ok(statuses.is_empty())
    }

    /// Get the commit id of HEAD
    pub fn head_commit(&self) -> Result<Oid> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        Ok(commit.id())
    }

    /// Stage the given paths (relative to the repository root) and commit
    pub fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<Oid> {
        let mut index = self.repo.index()?;
        for path in paths {
            index.add_path(path)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let sig = self.repo.signature()?;

        // First commit in a repository has no parent
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(Error::Git(e)),
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;

        debug!(commit = %oid, message, "Created commit");

        Ok(oid)
    }

    /// Create a lightweight tag pointing at HEAD
    pub fn create_tag(&self, name: &str) -> Result<()> {
        let target = self.repo.revparse_single("HEAD")?;
        self.repo.tag_lightweight(name, &target, false)?;

        debug!(tag = name, "Created tag");

        Ok(())
    }

    /// Delete a local tag
    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.repo.tag_delete(name)?;

        debug!(tag = name, "Deleted tag");

        Ok(())
    }

    /// Hard-reset the working tree and HEAD to the given commit
    pub fn reset_hard(&self, commit: Oid) -> Result<()> {
        let target = self.repo.find_object(commit, None)?;
        self.repo.reset(&target, git2::ResetType::Hard, None)?;

        debug!(commit = %commit, "Hard reset");

        Ok(())
    }

    /// Check if the given path is inside a git repository
    pub fn is_git_repo(path: impl AsRef<Path>) -> bool {
        Repository::discover(path.as_ref()).is_ok()
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo(dir: &TempDir) -> GitRepo {
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        drop(repo);

        GitRepo::open(dir.path()).unwrap()
    }

    #[test]
    fn test_open_non_git_dir() {
        let dir = TempDir::new().unwrap();
        let result = GitRepo::open(dir.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_is_git_repo_negative() {
        let dir = TempDir::new().unwrap();
        assert!(!GitRepo::is_git_repo(dir.path()));
    }

    #[test]
    fn test_clean_and_dirty_states() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(&dir);

        assert!(repo.is_clean().unwrap());

        fs::write(dir.path().join("pyproject.toml"), "[project]\n").unwrap();
        assert!(!repo.is_clean().unwrap());

        repo.commit_paths(&[Path::new("pyproject.toml")], "initial")
            .unwrap();
        assert!(repo.is_clean().unwrap());
    }

    #[test]
    fn test_commit_tag_and_rollback() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(&dir);

        let file = dir.path().join("pyproject.toml");
        fs::write(&file, "version = \"1.2.3\"\n").unwrap();
        let original = repo
            .commit_paths(&[Path::new("pyproject.toml")], "initial")
            .unwrap();

        fs::write(&file, "version = \"1.2.4\"\n").unwrap();
        let bumped = repo
            .commit_paths(&[Path::new("pyproject.toml")], "release 1.2.4")
            .unwrap();
        assert_ne!(original, bumped);
        assert_eq!(repo.head_commit().unwrap(), bumped);

        repo.create_tag("v1.2.4").unwrap();
        repo.delete_tag("v1.2.4").unwrap();
        // Deleting twice fails
        assert!(repo.delete_tag("v1.2.4").is_err());

        repo.reset_hard(original).unwrap();
        assert_eq!(repo.head_commit().unwrap(), original);
        let contents = fs::read_to_string(&file).unwrap();
        assert!(contents.contains("1.2.3"));
    }

    #[test]
    fn test_origin_url_missing() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(&dir);
        assert!(repo.origin_url().is_err());
    }

    #[test]
    fn test_origin_url_present() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(&dir);
        repo.inner()
            .remote("origin", "git@github.com:octocat/hello-world.git")
            .unwrap();
        assert_eq!(
            repo.origin_url().unwrap(),
            "git@github.com:octocat/hello-world.git"
        );
    }
}
