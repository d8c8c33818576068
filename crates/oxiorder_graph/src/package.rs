use indexmap::IndexSet;
use log::{debug, trace};
use std::{
    fmt,
    path::{Path, PathBuf},
};

use oxiorder_core::{
    COMPILED_EXTENSIONS, COMPILER_CONFIG_FILE, DEFAULT_EXCLUDES, DEFAULT_INCLUDE, MANIFEST_FILE,
    Manifest, PatternSet, SOURCE_EXTENSIONS, TEST_EXCLUDES, WEB_APP_FRAMEWORKS, collect_files,
    is_declaration_file, relative_slash_path,
};

use crate::error::Result;

/// How much of a package must be free of compiled-family sources before it
/// counts as converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionLevel {
    /// Every file, tests included.
    Full,
    /// Test locations are ignored.
    SourceOnly,
}

/// Shape of a package as far as its manifest tells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Library,
    Application,
    CliApplication,
    WebApplication,
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PackageKind::Library => "library",
            PackageKind::Application => "application",
            PackageKind::CliApplication => "cli",
            PackageKind::WebApplication => "web-app",
        };
        f.write_str(label)
    }
}

/// One package: a root directory, the patterns selecting its own files and
/// the names it declares as dependencies.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    root: PathBuf,
    name: String,
    manifest: Option<Manifest>,
    include: IndexSet<String>,
    exclude: IndexSet<String>,
    include_tests: bool,
    workspaces: Vec<String>,
    dependencies: Vec<String>,
    dev_dependencies: Vec<String>,
}

impl PackageDescriptor {
    /// Reads `root/package.json`. Workspace globs it declares are added to
    /// the exclude set so the package never walks into its members.
    pub fn load(root: &Path) -> Result<Self> {
        let manifest = Manifest::read(&root.join(MANIFEST_FILE))?;
        let name = manifest.name.clone().unwrap_or_else(|| dir_name(root));
        let workspaces: Vec<String> = manifest
            .workspace_globs()
            .iter()
            .map(|g| g.trim_start_matches("./").trim_end_matches('/').to_string())
            .filter(|g| !g.is_empty())
            .collect();

        let mut descriptor = Self {
            root: root.to_path_buf(),
            name,
            include: IndexSet::new(),
            exclude: IndexSet::new(),
            include_tests: false,
            dependencies: manifest.dependency_names(),
            dev_dependencies: manifest.dev_dependency_names(),
            workspaces: Vec::new(),
            manifest: Some(manifest),
        };
        for glob in workspaces {
            descriptor.add_exclude(format!("{glob}/**"));
            descriptor.workspaces.push(glob);
        }
        debug!(
            "Loaded package '{}' at {} ({} workspace globs)",
            descriptor.name,
            descriptor.root.display(),
            descriptor.workspaces.len()
        );
        Ok(descriptor)
    }

    /// A package with no manifest behind it, used to scope a single
    /// entrypoint's closure.
    pub fn detached(root: &Path, name: impl Into<String>) -> Self {
        Self {
            root: root.to_path_buf(),
            name: name.into(),
            manifest: None,
            include: IndexSet::new(),
            exclude: IndexSet::new(),
            include_tests: false,
            workspaces: Vec::new(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn workspaces(&self) -> &[String] {
        &self.workspaces
    }

    pub fn is_workspace_root(&self) -> bool {
        !self.workspaces.is_empty()
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn dev_dependencies(&self) -> &[String] {
        &self.dev_dependencies
    }

    pub fn add_include(&mut self, pattern: impl Into<String>) {
        self.include.insert(pattern.into());
    }

    pub fn add_exclude(&mut self, pattern: impl Into<String>) {
        self.exclude.insert(pattern.into());
    }

    pub fn set_include_tests(&mut self, include_tests: bool) {
        self.include_tests = include_tests;
    }

    pub fn includes_tests(&self) -> bool {
        self.include_tests
    }

    pub fn include_patterns(&self) -> Vec<String> {
        if self.include.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            self.include.iter().cloned().collect()
        }
    }

    pub fn exclude_patterns(&self) -> Vec<String> {
        self.excludes_with(self.includes_tests())
    }

    fn excludes_with(&self, include_tests: bool) -> Vec<String> {
        let mut patterns: IndexSet<String> =
            DEFAULT_EXCLUDES.iter().map(|p| p.to_string()).collect();
        patterns.extend(self.exclude.iter().cloned());
        if !include_tests {
            patterns.extend(TEST_EXCLUDES.iter().map(|p| p.to_string()));
        }
        patterns.into_iter().collect()
    }

    /// Compiled patterns deciding which files belong to this package.
    pub fn boundary(&self) -> Result<PackageBoundary> {
        let patterns = PatternSet::new(self.include_patterns(), self.exclude_patterns())?;
        Ok(PackageBoundary { root: self.root.clone(), patterns })
    }

    /// The package's own source files, in walk order.
    pub fn source_files(&self) -> Result<Vec<PathBuf>> {
        let boundary = self.boundary()?;
        let files = collect_files(&self.root, &boundary.patterns)?;
        Ok(files.into_iter().filter(|f| is_source_file(f)).collect())
    }

    /// True when a compiler config sits at the root and no compiled-family
    /// source is left.
    pub fn is_converted(&self, level: ConversionLevel) -> Result<bool> {
        if !self.root.join(COMPILER_CONFIG_FILE).is_file() {
            trace!("Package '{}' has no {}", self.name, COMPILER_CONFIG_FILE);
            return Ok(false);
        }
        let include_tests = level == ConversionLevel::Full;
        let patterns = PatternSet::new(self.include_patterns(), self.excludes_with(include_tests))?;
        let remaining = collect_files(&self.root, &patterns)?
            .into_iter()
            .filter(|f| has_extension_in(f, COMPILED_EXTENSIONS))
            .count();
        debug!("Package '{}' has {} unconverted files", self.name, remaining);
        Ok(remaining == 0)
    }

    pub fn kind(&self) -> PackageKind {
        let Some(manifest) = &self.manifest else {
            return PackageKind::Library;
        };
        if manifest.has_bin() {
            PackageKind::CliApplication
        } else if WEB_APP_FRAMEWORKS.iter().any(|f| manifest.depends_on(f)) {
            PackageKind::WebApplication
        } else if manifest.private && !manifest.has_entry_point() {
            PackageKind::Application
        } else {
            PackageKind::Library
        }
    }
}

/// Membership test for one package's files.
#[derive(Debug, Clone)]
pub struct PackageBoundary {
    root: PathBuf,
    patterns: PatternSet,
}

impl PackageBoundary {
    pub fn owns(&self, path: &Path) -> bool {
        if !is_source_file(path) {
            return false;
        }
        match relative_slash_path(&self.root, path) {
            Some(rel) => self.patterns.selects(&rel),
            None => false,
        }
    }
}

fn has_extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| extensions.contains(&e))
}

fn is_source_file(path: &Path) -> bool {
    let declaration =
        path.file_name().and_then(|n| n.to_str()).is_some_and(is_declaration_file);
    !declaration && has_extension_in(path, SOURCE_EXTENSIONS)
}

pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
