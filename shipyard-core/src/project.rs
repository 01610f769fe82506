//! Python project metadata: pyproject.toml reading and version bumping

use std::path::{Path, PathBuf};

use semver::Version;
use toml_edit::DocumentMut;
use tracing::debug;

use crate::{Error, Result};

/// Version increment kind for a release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    Patch,
    Minor,
    Major,
}

impl Bump {
    /// Compute the bumped version
    ///
    /// Pre-release and build metadata are cleared by the bump.
    pub fn apply(self, version: &Version) -> Version {
        match self {
            Bump::Patch => Version::new(version.major, version.minor, version.patch + 1),
            Bump::Minor => Version::new(version.major, version.minor + 1, 0),
            Bump::Major => Version::new(version.major + 1, 0, 0),
        }
    }
}

impl std::fmt::Display for Bump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bump::Patch => write!(f, "patch"),
            Bump::Minor => write!(f, "minor"),
            Bump::Major => write!(f, "major"),
        }
    }
}

/// Package metadata read from pyproject.toml
///
/// Both PEP 621 (`[project]`) and Poetry (`[tool.poetry]`) layouts are
/// recognized; `[project]` wins when both are present.
#[derive(Debug, Clone)]
pub struct PyProject {
    /// Path to the pyproject.toml file
    path: PathBuf,
    /// Package name as published to PyPI
    pub name: String,
    /// Current version
    pub version: Version,
}

impl PyProject {
    /// Load package name and version from the pyproject.toml in `dir`
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join("pyproject.toml");

        if !path.exists() {
            return Err(Error::Validation(format!(
                "pyproject.toml not found in {}. This tool requires a Python project.",
                dir.as_ref().display()
            )));
        }

        let contents = std::fs::read_to_string(&path).map_err(Error::Io)?;
        let doc: DocumentMut = contents
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid pyproject.toml: {}", e)))?;

        let name = metadata_str(&doc, "name").ok_or_else(|| {
            Error::Validation("Could not extract package name from pyproject.toml".to_string())
        })?;

        let raw_version = metadata_str(&doc, "version").ok_or_else(|| {
            Error::Validation("Could not extract version from pyproject.toml".to_string())
        })?;

        let version = Version::parse(&raw_version).map_err(|e| {
            Error::Validation(format!(
                "Version '{}' in pyproject.toml is not semver: {}",
                raw_version, e
            ))
        })?;

        debug!(name, %version, "Loaded pyproject.toml");

        Ok(Self {
            path,
            name,
            version,
        })
    }

    /// Path to the pyproject.toml file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the version in pyproject.toml, preserving formatting
    ///
    /// Updates whichever of `[project]` / `[tool.poetry]` declares a
    /// version, then updates the in-memory copy.
    pub fn set_version(&mut self, new_version: &Version) -> Result<()> {
        let contents = std::fs::read_to_string(&self.path).map_err(Error::Io)?;
        let mut doc: DocumentMut = contents
            .parse()
            .map_err(|e| Error::Validation(format!("Invalid pyproject.toml: {}", e)))?;

        let mut updated = false;
        if doc
            .get("project")
            .and_then(|t| t.get("version"))
            .is_some()
        {
            doc["project"]["version"] = toml_edit::value(new_version.to_string());
            updated = true;
        }
        if doc
            .get("tool")
            .and_then(|t| t.get("poetry"))
            .and_then(|t| t.get("version"))
            .is_some()
        {
            doc["tool"]["poetry"]["version"] = toml_edit::value(new_version.to_string());
            updated = true;
        }

        if !updated {
            return Err(Error::Validation(
                "pyproject.toml has no version field to update".to_string(),
            ));
        }

        std::fs::write(&self.path, doc.to_string()).map_err(Error::Io)?;

        debug!(old = %self.version, new = %new_version, "Updated pyproject.toml version");

        self.version = new_version.clone();
        Ok(())
    }
}

/// Look up a metadata string in `[project]`, falling back to `[tool.poetry]`
fn metadata_str(doc: &DocumentMut, key: &str) -> Option<String> {
    let from_project = doc
        .get("project")
        .and_then(|t| t.get(key))
        .and_then(|v| v.as_str());

    let from_poetry = doc
        .get("tool")
        .and_then(|t| t.get("poetry"))
        .and_then(|t| t.get(key))
        .and_then(|v| v.as_str());

    from_project.or(from_poetry).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_bump_patch() {
        let v = Version::new(1, 2, 3);
        assert_eq!(Bump::Patch.apply(&v), Version::new(1, 2, 4));
    }

    #[test]
    fn test_bump_minor() {
        let v = Version::new(1, 2, 3);
        assert_eq!(Bump::Minor.apply(&v), Version::new(1, 3, 0));
    }

    #[test]
    fn test_bump_major() {
        let v = Version::new(1, 2, 3);
        assert_eq!(Bump::Major.apply(&v), Version::new(2, 0, 0));
    }

    #[test]
    fn test_bump_clears_prerelease() {
        let v = Version::parse("1.2.3-rc.1").unwrap();
        assert_eq!(Bump::Patch.apply(&v), Version::new(1, 2, 4));
    }

    #[test]
    fn test_load_pep621_project() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nversion = \"1.2.3\"\n",
        )
        .unwrap();

        let project = PyProject::load(dir.path()).unwrap();
        assert_eq!(project.name, "demo");
        assert_eq!(project.version, Version::new(1, 2, 3));
    }

    #[test]
    fn test_load_poetry_project() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[tool.poetry]\nname = \"demo\"\nversion = \"0.4.0\"\n",
        )
        .unwrap();

        let project = PyProject::load(dir.path()).unwrap();
        assert_eq!(project.name, "demo");
        assert_eq!(project.version, Version::new(0, 4, 0));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = PyProject::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("pyproject.toml not found"));
    }

    #[test]
    fn test_load_missing_version() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n",
        )
        .unwrap();

        let err = PyProject::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_set_version_preserves_layout() {
        let dir = TempDir::new().unwrap();
        let original = "# build config\n[project]\nname = \"demo\"   # published name\nversion = \"1.2.3\"\n\n[project.urls]\nhome = \"https://example.com\"\n";
        fs::write(dir.path().join("pyproject.toml"), original).unwrap();

        let mut project = PyProject::load(dir.path()).unwrap();
        project.set_version(&Version::new(1, 2, 4)).unwrap();

        let written = fs::read_to_string(dir.path().join("pyproject.toml")).unwrap();
        assert!(written.contains("version = \"1.2.4\""));
        assert!(written.contains("# build config"));
        assert!(written.contains("# published name"));
        assert_eq!(project.version, Version::new(1, 2, 4));
    }
}
