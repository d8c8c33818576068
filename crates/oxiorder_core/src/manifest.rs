//! `package.json` parsing.
//!
//! Only the fields that shape discovery are kept: identity, entry points,
//! dependency name lists and workspace globs. Dependency tables keep their
//! declaration order so package edges come out the same on every run.

use indexmap::IndexMap;
use log::trace;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::{DiscoveryError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub private: bool,
    pub main: Option<String>,
    pub module: Option<String>,
    pub types: Option<String>,
    /// Either a single path or a map of command names to paths.
    pub bin: Option<serde_json::Value>,
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: IndexMap<String, String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
    pub workspaces: Option<Workspaces>,
    #[serde(skip)]
    pub path: PathBuf,
}

/// The two shapes npm and yarn accept for `workspaces`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    Globs(Vec<String>),
    Config {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    pub fn globs(&self) -> &[String] {
        match self {
            Workspaces::Globs(globs) => globs,
            Workspaces::Config { packages } => packages,
        }
    }
}

impl Manifest {
    /// Reads the manifest at `path`. A missing file is a configuration error.
    pub fn read(path: &Path) -> Result<Self> {
        trace!("Reading manifest {}", path.display());
        if !path.is_file() {
            return Err(DiscoveryError::MissingManifest { path: path.to_path_buf() });
        }
        let content = fs::read_to_string(path).map_err(|e| DiscoveryError::io(path, e))?;
        let mut manifest: Manifest = serde_json::from_str(&content)
            .map_err(|source| DiscoveryError::InvalidManifest { path: path.to_path_buf(), source })?;
        manifest.path = path.to_path_buf();
        Ok(manifest)
    }

    pub fn workspace_globs(&self) -> &[String] {
        self.workspaces.as_ref().map(Workspaces::globs).unwrap_or_default()
    }

    pub fn dependency_names(&self) -> Vec<String> {
        self.dependencies.keys().cloned().collect()
    }

    pub fn dev_dependency_names(&self) -> Vec<String> {
        self.dev_dependencies.keys().cloned().collect()
    }

    pub fn has_bin(&self) -> bool {
        match &self.bin {
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Object(map)) => !map.is_empty(),
            _ => false,
        }
    }

    pub fn has_entry_point(&self) -> bool {
        self.main.is_some() || self.module.is_some() || self.types.is_some()
    }

    /// True when `name` appears in any dependency table.
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
            || self.dev_dependencies.contains_key(name)
            || self.peer_dependencies.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, path: &str, content: &str) -> PathBuf {
        let file_path = dir.join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
        file_path
    }

    #[test]
    fn test_read_full_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "package.json",
            r#"{
  "name": "bar",
  "version": "1.0.0",
  "main": "index.js",
  "dependencies": { "zeta": "^1.0.0", "foo": "workspace:*", "alpha": "^2.0.0" },
  "devDependencies": { "jest": "^29.0.0" }
}"#,
        );

        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("bar"));
        assert_eq!(manifest.dependency_names(), vec!["zeta", "foo", "alpha"]);
        assert_eq!(manifest.dev_dependency_names(), vec!["jest"]);
        assert!(manifest.has_entry_point());
        assert!(manifest.depends_on("jest"));
        assert!(!manifest.depends_on("react"));
        assert_eq!(manifest.path, path);
    }

    #[test]
    fn test_workspaces_as_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "package.json",
            r#"{ "private": true, "workspaces": ["packages/*", "apps/*"] }"#,
        );
        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.workspace_globs(), &["packages/*", "apps/*"]);
        assert!(manifest.private);
    }

    #[test]
    fn test_workspaces_as_object() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(
            temp_dir.path(),
            "package.json",
            r#"{ "workspaces": { "packages": ["libs/*"], "nohoist": ["**/react"] } }"#,
        );
        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.workspace_globs(), &["libs/*"]);
    }

    #[test]
    fn test_no_workspaces() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "package.json", r#"{ "name": "solo" }"#);
        let manifest = Manifest::read(&path).unwrap();
        assert!(manifest.workspace_globs().is_empty());
        assert!(!manifest.has_bin());
    }

    #[test]
    fn test_bin_shapes() {
        let temp_dir = TempDir::new().unwrap();
        let path =
            create_test_file(temp_dir.path(), "a/package.json", r#"{ "bin": "./cli.js" }"#);
        assert!(Manifest::read(&path).unwrap().has_bin());
        let path = create_test_file(
            temp_dir.path(),
            "b/package.json",
            r#"{ "bin": { "tool": "./cli.js" } }"#,
        );
        assert!(Manifest::read(&path).unwrap().has_bin());
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let err = Manifest::read(&temp_dir.path().join("package.json")).unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingManifest { .. }));
    }

    #[test]
    fn test_invalid_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_test_file(temp_dir.path(), "package.json", "{ \"name\": ");
        let err = Manifest::read(&path).unwrap_err();
        assert!(matches!(err, DiscoveryError::InvalidManifest { .. }));
    }
}
