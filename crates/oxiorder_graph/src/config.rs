use clap::{ArgAction, Parser};
use log::{debug, trace};
use std::{env, path::PathBuf};

use oxiorder_core::{DiscoveryError, MANIFEST_FILE};

use crate::error::Result;

#[derive(Debug, Clone, Parser)]
#[command(name = "order")]
#[command(about = "Compute a dependency-first file order for a JavaScript/TypeScript project")]
pub struct DiscoveryOptions {
    /// Root directory of the project (defaults to the nearest directory with a package.json)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Only order the files reachable from this file
    #[arg(long)]
    pub entrypoint: Option<PathBuf>,

    /// Glob selecting files to walk, relative to each package root
    #[arg(long)]
    pub include: Vec<String>,

    /// Glob excluding files from the walk, relative to each package root
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Workspace package to leave out entirely
    #[arg(long = "ignore-package")]
    pub ignore_package: Vec<String>,

    /// Order packages after the packages listed in their dependencies
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub crawl_dependencies: bool,

    /// Order packages after the packages listed in their devDependencies
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub crawl_dev_dependencies: bool,

    /// Keep unresolved imports in the module graphs as opaque leaves
    #[arg(long)]
    pub include_external: bool,

    /// Walk test files and directories too
    #[arg(long)]
    pub include_tests: bool,

    /// Leave out packages whose sources are already converted
    #[arg(long)]
    pub skip_converted: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            root: None,
            entrypoint: None,
            include: Vec::new(),
            exclude: Vec::new(),
            ignore_package: Vec::new(),
            crawl_dependencies: true,
            crawl_dev_dependencies: true,
            include_external: false,
            include_tests: false,
            skip_converted: false,
        }
    }
}

impl DiscoveryOptions {
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()), ..Self::default() }
    }

    /// Canonicalizes `root` (finding it when unset) and `entrypoint`, which
    /// is taken relative to the root when not absolute.
    pub fn initialize(&mut self) -> Result<PathBuf> {
        let root = match self.root.take() {
            Some(r) => {
                debug!("Using provided root directory: {:?}", r);
                r.canonicalize().map_err(|e| DiscoveryError::io(&r, e))?
            }
            None => {
                debug!("No root provided, searching for package root");
                find_package_root()?
            }
        };
        self.root = Some(root.clone());

        if let Some(entry) = self.entrypoint.take() {
            let joined = if entry.is_absolute() { entry } else { root.join(entry) };
            let entry = joined
                .canonicalize()
                .ok()
                .filter(|p| p.is_file())
                .ok_or(DiscoveryError::EntrypointNotFound { path: joined })?;
            debug!("Using entrypoint: {}", entry.display());
            self.entrypoint = Some(entry);
        }

        Ok(root)
    }
}

pub(crate) fn find_package_root() -> Result<PathBuf> {
    let start = env::current_dir().map_err(|e| DiscoveryError::io(".", e))?;
    trace!("Starting search from: {:?}", start);

    let mut current = Some(start.as_path());
    while let Some(dir) = current {
        let manifest = dir.join(MANIFEST_FILE);
        trace!("Checking for {} at: {:?}", MANIFEST_FILE, manifest);
        if manifest.is_file() {
            debug!("Found package root at: {:?}", dir);
            return Ok(dir.to_path_buf());
        }
        current = dir.parent();
    }

    debug!("Could not find {} in any parent folder", MANIFEST_FILE);
    Err(DiscoveryError::MissingManifest { path: start.join(MANIFEST_FILE) }.into())
}
