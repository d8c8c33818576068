use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Failures that abort a discovery run.
///
/// Everything here is a configuration problem in the analysed project: a
/// missing or broken manifest, an import that names a file which does not
/// exist, or a pattern that cannot be compiled. Unresolvable bare
/// specifiers and import cycles are not errors and never reach this type.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no package.json found at {path}")]
    MissingManifest { path: PathBuf },

    #[error("invalid package.json at {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A relative import names a file that is not on disk.
    #[error("cannot resolve '{specifier}' imported from {importer}")]
    UnresolvedImport { importer: PathBuf, specifier: String },

    #[error("entrypoint not found: {path}")]
    EntrypointNotFound { path: PathBuf },

    #[error("invalid glob pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Walk(#[from] ignore::Error),
}

impl DiscoveryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// True for errors that name a broken reference inside the project
    /// rather than an environmental failure.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingManifest { .. }
                | Self::InvalidManifest { .. }
                | Self::UnresolvedImport { .. }
                | Self::EntrypointNotFound { .. }
                | Self::InvalidPattern { .. }
        )
    }
}
