//! Core building blocks for oxiorder.
//!
//! This crate provides the pieces dependency discovery is assembled from:
//! - Parsing import statements from JS/TS files
//! - Resolving module specifiers (relative, extensionless, directory index,
//!   tsconfig/jsconfig path aliases, declaration fallback)
//! - Reading `package.json` manifests
//! - Matching include/exclude globs and workspace package directories

mod alias;
mod collector;
mod constants;
mod error;
mod manifest;
mod parser;
mod resolver;
mod types;

// Re-export public API
pub use alias::{AliasConfig, AliasEntry, config_in_dir, strip_jsonc};
pub use collector::{PatternSet, collect_dirs, collect_files, relative_slash_path};
pub use constants::*;
pub use error::{DiscoveryError, Result};
pub use manifest::{Manifest, Workspaces};
pub use parser::{imports_for, imports_from_source};
pub use resolver::Resolver;
pub use types::{SpecKind, Specifier, is_relative_request};
