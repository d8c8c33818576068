use glob::{MatchOptions, Pattern};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::{
    collections::BTreeSet,
    path::{Component, Path, PathBuf},
};

use crate::{
    constants::GLOBAL_IGNORES,
    error::{DiscoveryError, Result},
};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled include/exclude globs, matched against `/`-separated paths
/// relative to a base directory.
#[derive(Debug, Clone)]
pub struct PatternSet {
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
    /// `dir/**` excludes reduced to `dir`, used to prune whole subtrees.
    dir_excludes: Vec<Pattern>,
}

impl PatternSet {
    pub fn new<I, E>(include: I, exclude: E) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let includes = include.into_iter().map(|p| compile(p.as_ref())).collect::<Result<_>>()?;
        let mut excludes = Vec::new();
        let mut dir_excludes = Vec::new();
        for pattern in exclude {
            let pattern = pattern.as_ref();
            excludes.push(compile(pattern)?);
            if let Some(dir) = pattern.strip_suffix("/**") {
                dir_excludes.push(compile(dir)?);
            }
        }
        Ok(Self { includes, excludes, dir_excludes })
    }

    pub fn is_included(&self, rel: &str) -> bool {
        self.includes.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }

    pub fn is_excluded(&self, rel: &str) -> bool {
        self.excludes.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }

    pub fn is_dir_excluded(&self, rel: &str) -> bool {
        self.dir_excludes.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }

    /// A file is selected when it matches an include and no exclude.
    pub fn selects(&self, rel: &str) -> bool {
        self.is_included(rel) && !self.is_excluded(rel)
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern)
        .map_err(|source| DiscoveryError::InvalidPattern { pattern: pattern.to_string(), source })
}

/// `path` relative to `base`, `/`-separated; `None` when outside `base`.
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(p) => Some(p.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

fn is_globally_ignored(name: &str) -> bool {
    GLOBAL_IGNORES.contains(&name)
}

/// Files under `base` selected by `patterns`, in file-name order.
pub fn collect_files(base: &Path, patterns: &PatternSet) -> Result<Vec<PathBuf>> {
    debug!("Walking directory tree from root: {}", base.display());
    let mut files: Vec<PathBuf> = Vec::new();

    let prune_base = base.to_path_buf();
    let prune_patterns = patterns.clone();
    let walker = WalkBuilder::new(base)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .filter_entry(move |dent| {
            if dent.depth() == 0 || !dent.file_type().is_some_and(|t| t.is_dir()) {
                return true;
            }
            if is_globally_ignored(&dent.file_name().to_string_lossy()) {
                return false;
            }
            match relative_slash_path(&prune_base, dent.path()) {
                Some(rel) => !prune_patterns.is_dir_excluded(&rel),
                None => true,
            }
        })
        .build();

    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let Some(rel) = relative_slash_path(base, p) else {
            continue;
        };
        if patterns.selects(&rel) {
            trace!("Selected file: {}", rel);
            files.push(p.to_path_buf());
        } else {
            trace!("Skipping file: {}", rel);
        }
    }

    debug!("Collected {} files under {}", files.len(), base.display());
    Ok(files)
}

/// Directories under `base` matching any of `patterns`, skipping any whose
/// relative path has a component in `skip`. Sorted and deduplicated.
pub fn collect_dirs(base: &Path, patterns: &[String], skip: &[&str]) -> Result<Vec<PathBuf>> {
    let mut dirs = BTreeSet::new();
    // Metacharacters in the project path itself must match literally.
    let escaped_base = PathBuf::from(Pattern::escape(&base.to_string_lossy()));

    for pattern in patterns {
        let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
        let full_pattern = escaped_base.join(pattern);
        let full_pattern_str = full_pattern.to_string_lossy();
        trace!("Expanding workspace glob {}", full_pattern_str);

        let entries = glob::glob_with(&full_pattern_str, MATCH_OPTIONS).map_err(|source| {
            DiscoveryError::InvalidPattern { pattern: pattern.to_string(), source }
        })?;

        for path in entries.flatten() {
            if !path.is_dir() {
                continue;
            }
            let skipped = path.strip_prefix(base).map_or(true, |rel| {
                rel.components().any(|c| match c {
                    Component::Normal(name) => skip.iter().any(|s| name.to_str() == Some(*s)),
                    _ => false,
                })
            });
            if skipped {
                trace!("Skipping directory {}", path.display());
                continue;
            }
            dirs.insert(path);
        }
    }

    debug!("Matched {} directories under {}", dirs.len(), base.display());
    Ok(dirs.into_iter().collect())
}
