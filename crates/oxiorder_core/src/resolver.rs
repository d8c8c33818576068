use log::{debug, trace};
use path_clean::PathClean;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
};

use crate::{
    alias::{AliasConfig, config_in_dir},
    constants::{
        AUTHORED_EXTENSIONS, INDEX_FILE_STEM, RESOLVE_EXTENSIONS, authored_counterparts,
        is_declaration_file,
    },
    error::{DiscoveryError, Result},
    types::is_relative_request,
};

/// Maps `(importer, specifier)` pairs to files on disk.
///
/// One resolver serves one discovery run. It memoizes the nearest alias
/// config per directory and every parsed config per file; neither cache is
/// ever invalidated, so the tree is treated as a snapshot.
#[derive(Debug)]
pub struct Resolver {
    extensions: Vec<String>,
    nearest_config: HashMap<PathBuf, Option<PathBuf>>,
    configs: HashMap<PathBuf, Rc<AliasConfig>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        Self::with_extensions(RESOLVE_EXTENSIONS.iter().map(|e| e.to_string()).collect())
    }

    /// A resolver trying `extensions` (without dots) in the given order.
    pub fn with_extensions(extensions: Vec<String>) -> Self {
        Self { extensions, nearest_config: HashMap::new(), configs: HashMap::new() }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolves `request` as written in `from_file`.
    ///
    /// Returns `Ok(None)` for bare specifiers that no alias maps to a file
    /// and for imports that only reach a declaration file. A relative
    /// specifier naming nothing on disk is an error.
    pub fn resolve(&mut self, from_file: &Path, request: &str) -> Result<Option<PathBuf>> {
        trace!("Resolving: '{}' from {}", request, from_file.display());
        let from_dir = from_file.parent().unwrap_or(Path::new("/"));

        if is_relative_request(request) {
            let base = if request.starts_with('/') {
                PathBuf::from(request).clean()
            } else {
                from_dir.join(request).clean()
            };
            return match self.find_file(&base) {
                Some(found) if is_declaration(&found) => {
                    debug!("'{}' from {} only reaches {}", request, from_file.display(), found.display());
                    Ok(None)
                }
                Some(found) => {
                    trace!("Resolved relative import '{}' to {}", request, found.display());
                    Ok(Some(found))
                }
                None => Err(DiscoveryError::UnresolvedImport {
                    importer: from_file.to_path_buf(),
                    specifier: request.to_string(),
                }),
            };
        }

        let Some(found) = self.resolve_alias(from_dir, request) else {
            trace!("No alias resolves '{}' from {}", request, from_file.display());
            return Ok(None);
        };

        if !is_declaration(&found) {
            debug!("Resolved '{}' from {} via alias", request, from_file.display());
            return Ok(Some(found));
        }

        // A declaration reached through an alias may belong to a package whose
        // own config points at the implementation.
        let decl_dir = found.parent().unwrap_or(Path::new("/"));
        match self.resolve_alias(decl_dir, request) {
            Some(implementation) if implementation != found && !is_declaration(&implementation) => {
                debug!(
                    "Followed declaration {} to {} for '{}'",
                    found.display(),
                    implementation.display(),
                    request
                );
                Ok(Some(implementation))
            }
            _ => {
                debug!("'{}' only resolves to declaration {}", request, found.display());
                Ok(None)
            }
        }
    }

    fn resolve_alias(&mut self, dir: &Path, request: &str) -> Option<PathBuf> {
        let config = self.alias_config_for(dir)?;
        config.candidates(request).iter().find_map(|candidate| self.find_file(candidate))
    }

    /// Nearest alias config at or above `dir`, loaded once per file.
    pub fn alias_config_for(&mut self, dir: &Path) -> Option<Rc<AliasConfig>> {
        let config_path = self.nearest_config_path(dir)?;
        let config = self
            .configs
            .entry(config_path.clone())
            .or_insert_with(|| Rc::new(AliasConfig::load(&config_path)));
        Some(Rc::clone(config))
    }

    fn nearest_config_path(&mut self, dir: &Path) -> Option<PathBuf> {
        if let Some(cached) = self.nearest_config.get(dir) {
            trace!("Cache hit for alias config lookup: {}", dir.display());
            return cached.clone();
        }

        let mut visited = Vec::new();
        let mut current = Some(dir);
        let mut found = None;
        while let Some(d) = current {
            if let Some(cached) = self.nearest_config.get(d) {
                found = cached.clone();
                break;
            }
            visited.push(d.to_path_buf());
            if let Some(config) = config_in_dir(d) {
                trace!("Found alias config at: {}", config.display());
                found = Some(config);
                break;
            }
            current = d.parent();
        }

        for d in visited {
            self.nearest_config.insert(d, found.clone());
        }
        found
    }

    /// First existing file for a path prefix: the explicit extension (with
    /// its authored counterparts first), then every candidate extension,
    /// then a directory index, then the literal path.
    fn find_file(&self, base: &Path) -> Option<PathBuf> {
        let ext = base.extension().and_then(|e| e.to_str()).unwrap_or_default();

        if self.extensions.iter().any(|e| e == ext) {
            let stem = base.with_extension("");
            let counterparts = authored_counterparts(ext);
            if !counterparts.is_empty() {
                let preferred = counterparts
                    .iter()
                    .map(|c| c.to_string())
                    .chain([ext.to_string(), "d.ts".to_string()]);
                return preferred
                    .map(|e| with_suffix(&stem, &e))
                    .find(|candidate| candidate.is_file())
                    .or_else(|| self.find_index(base));
            }
            if AUTHORED_EXTENSIONS.contains(&ext) {
                if base.is_file() {
                    return Some(base.to_path_buf());
                }
                return self.find_index(base);
            }
        }

        for ext in &self.extensions {
            let candidate = with_suffix(base, ext);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        if let Some(index) = self.find_index(base) {
            return Some(index);
        }

        base.is_file().then(|| base.to_path_buf())
    }

    fn find_index(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }
        self.extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", INDEX_FILE_STEM, ext)))
            .find(|candidate| candidate.is_file())
    }
}

fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut s = base.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

fn is_declaration(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(is_declaration_file)
}
