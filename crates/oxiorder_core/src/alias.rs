//! `tsconfig.json` / `jsconfig.json` path aliases.
//!
//! Only the parts of a compiler config that affect module lookup are kept:
//! `compilerOptions.baseUrl`, `compilerOptions.paths` and the `extends`
//! chain that may supply them.

use log::{debug, trace, warn};
use path_clean::PathClean;
use serde_json::Value;
use std::{
    collections::HashSet,
    fs,
    path::{Component, Path, PathBuf},
};

use crate::constants::{ALIAS_CONFIG_FILES, VENDOR_DIRS};

/// One `paths` entry, split around its optional `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub prefix: String,
    pub suffix: String,
    pub wildcard: bool,
    /// Absolute target templates; a `*` is replaced by the captured text.
    pub targets: Vec<String>,
}

impl AliasEntry {
    fn parse(pattern: &str, targets: Vec<String>) -> Option<Self> {
        match pattern.split_once('*') {
            Some((prefix, suffix)) if !suffix.contains('*') => Some(Self {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
                wildcard: true,
                targets,
            }),
            Some(_) => None,
            None => Some(Self {
                prefix: pattern.to_string(),
                suffix: String::new(),
                wildcard: false,
                targets,
            }),
        }
    }

    fn capture<'s>(&self, request: &'s str) -> Option<&'s str> {
        if !self.wildcard {
            return (request == self.prefix).then_some("");
        }
        if request.len() < self.prefix.len() + self.suffix.len() {
            return None;
        }
        request.strip_prefix(self.prefix.as_str())?.strip_suffix(self.suffix.as_str())
    }
}

/// Aliases declared by one config file (after following `extends`).
#[derive(Debug, Clone, Default)]
pub struct AliasConfig {
    pub path: PathBuf,
    pub base_url: Option<PathBuf>,
    pub entries: Vec<AliasEntry>,
}

impl AliasConfig {
    /// Reads `path`, following relative `extends`. A config that cannot be
    /// read or parsed yields an empty alias set.
    pub fn load(path: &Path) -> Self {
        let mut seen = HashSet::new();
        let raw = load_raw(path, &mut seen).unwrap_or_else(|| {
            warn!("Ignoring unreadable alias config {}", path.display());
            RawOptions::default()
        });

        let mut entries = Vec::new();
        if let Some((paths, anchor)) = raw.paths {
            let anchor = raw.base_url.clone().unwrap_or(anchor);
            for (pattern, targets) in paths {
                let targets: Vec<String> = targets
                    .iter()
                    .map(|t| anchor.join(t).clean())
                    .filter(|t| !points_into_vendor_dir(t))
                    .map(|t| t.to_string_lossy().to_string())
                    .collect();
                if targets.is_empty() {
                    trace!("Dropping alias '{}' with only vendored targets", pattern);
                    continue;
                }
                match AliasEntry::parse(&pattern, targets) {
                    Some(entry) => entries.push(entry),
                    None => warn!("Ignoring alias pattern '{}' in {}", pattern, path.display()),
                }
            }
        }

        debug!("Loaded {} path aliases from {}", entries.len(), path.display());
        Self { path: path.to_path_buf(), base_url: raw.base_url, entries }
    }

    /// On-disk prefixes `request` maps to, best match first. The prefixes
    /// still need extensions applied. With a `baseUrl`, `baseUrl/request` is
    /// always the last candidate, even after a matched `paths` entry.
    pub fn candidates(&self, request: &str) -> Vec<PathBuf> {
        let exact = self.entries.iter().find(|e| !e.wildcard && e.prefix == request);
        let best = exact.or_else(|| {
            self.entries
                .iter()
                .filter(|e| e.wildcard && e.capture(request).is_some())
                .max_by_key(|e| e.prefix.len())
        });

        let mut candidates: Vec<PathBuf> = match best {
            Some(entry) => {
                let captured = entry.capture(request).unwrap_or_default();
                trace!("Alias '{}*{}' matched '{}'", entry.prefix, entry.suffix, request);
                entry
                    .targets
                    .iter()
                    .map(|t| PathBuf::from(t.replacen('*', captured, 1)).clean())
                    .collect()
            }
            None => Vec::new(),
        };

        if let Some(base) = &self.base_url {
            let fallback = base.join(request).clean();
            if !candidates.contains(&fallback) {
                candidates.push(fallback);
            }
        }
        candidates
    }
}

/// First alias config in `dir` itself, if any.
pub fn config_in_dir(dir: &Path) -> Option<PathBuf> {
    ALIAS_CONFIG_FILES.iter().map(|name| dir.join(name)).find(|p| p.is_file())
}

fn points_into_vendor_dir(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => VENDOR_DIRS.iter().any(|v| name.to_str() == Some(*v)),
        _ => false,
    })
}

#[derive(Debug, Default)]
struct RawOptions {
    base_url: Option<PathBuf>,
    /// Patterns plus the directory they are anchored to when no `baseUrl` is set.
    paths: Option<(Vec<(String, Vec<String>)>, PathBuf)>,
}

fn load_raw(path: &Path, seen: &mut HashSet<PathBuf>) -> Option<RawOptions> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !seen.insert(canonical) {
        warn!("Cycle in tsconfig extends at {}", path.display());
        return None;
    }

    let content = fs::read_to_string(path).ok()?;
    let json: Value = match serde_json::from_str(&strip_jsonc(&content)) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            return None;
        }
    };
    let dir = path.parent().unwrap_or(Path::new("/"));

    let mut options = json
        .get("extends")
        .and_then(Value::as_str)
        .filter(|ext| ext.starts_with('.'))
        .and_then(|ext| {
            let mut parent = dir.join(ext).clean();
            if !parent.is_file() {
                let mut with_json = parent.into_os_string();
                with_json.push(".json");
                parent = PathBuf::from(with_json);
            }
            trace!("Following extends from {} to {}", path.display(), parent.display());
            load_raw(&parent, seen)
        })
        .unwrap_or_default();

    if let Some(compiler_options) = json.get("compilerOptions") {
        if let Some(base_url) = compiler_options.get("baseUrl").and_then(Value::as_str) {
            options.base_url = Some(dir.join(base_url).clean());
        }
        if let Some(paths_obj) = compiler_options.get("paths").and_then(Value::as_object) {
            let paths = paths_obj
                .iter()
                .filter_map(|(alias, targets)| {
                    let targets: Vec<String> = targets
                        .as_array()?
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect();
                    Some((alias.clone(), targets))
                })
                .collect();
            options.paths = Some((paths, dir.to_path_buf()));
        }
    }

    Some(options)
}

/// Removes comments and trailing commas so JSON-with-comments parses as JSON.
pub fn strip_jsonc(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
                // Keep tokens on either side of the comment apart.
                out.push(' ');
            }
            _ => out.push(c),
        }
    }

    out
}

// Runs on comment-free input, so the next significant char is real JSON.
fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let next_significant = chars.clone().find(|ch| !ch.is_whitespace());
                if !matches!(next_significant, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }

    out
}
