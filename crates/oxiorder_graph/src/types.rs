use std::path::PathBuf;

use crate::package::PackageKind;

/// One file in the migration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedFile {
    pub absolute_path: PathBuf,
    /// `/`-separated, relative to the project root.
    pub relative_path: String,
    /// Name of the package the file belongs to.
    pub package: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationOrder {
    /// Every file to process, dependencies first.
    pub files: Vec<OrderedFile>,
    /// Workspace packages in dependency order. The project root is not one.
    pub packages: Vec<String>,
}

impl MigrationOrder {
    pub fn relative_paths(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.relative_path.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub name: String,
    /// Package root relative to the project root, `.` for the root itself.
    pub root: String,
    pub kind: PackageKind,
    pub converted: bool,
    /// True when the package's files were left out of the order.
    pub skipped: bool,
}

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub root: PathBuf,
    pub order: MigrationOrder,
    /// Workspace packages in order, then the project root.
    pub packages: Vec<PackageSummary>,
    pub files_analyzed: usize,
}
