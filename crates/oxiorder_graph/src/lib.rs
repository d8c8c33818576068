//! Dependency-first file ordering for JavaScript/TypeScript workspaces.
//!
//! Packages are discovered from the root manifest's workspace globs and
//! ordered by the names in their dependency tables. Each package's files
//! are ordered by their imports, and the project root's own files go last.
//! Import cycles never fail a run.
//!
//! # Examples
//!
//! ```no_run
//! use oxiorder_graph::{DiscoveryOptions, run_discovery};
//! use std::io::{BufWriter, Write};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = DiscoveryOptions::for_root("/path/to/project");
//! let outcome = run_discovery(options)?;
//!
//! for file in &outcome.order.files {
//!     println!("{} ({})", file.relative_path, file.package);
//! }
//!
//! let mut stdout = BufWriter::new(std::io::stdout());
//! oxiorder_graph::print_packages(&mut stdout, &outcome)?;
//! stdout.flush()?;
//! # Ok(())
//! # }
//! ```

mod config;
mod discovery;
mod error;
mod graph;
mod module_graph;
mod package;
mod project_graph;
mod reporter;
mod types;

// Re-export public API
pub use config::DiscoveryOptions;
pub use discovery::run_discovery;
pub use error::{GraphError, OrderError, Result};
pub use graph::{Graph, Keyed, Node};
pub use module_graph::{ModuleGraphBuilder, ModuleNode};
pub use package::{ConversionLevel, PackageBoundary, PackageDescriptor, PackageKind};
pub use project_graph::{PackageNode, ProjectGraphBuilder};
pub use reporter::{print_no_files_message, print_order, print_packages};
pub use types::{DiscoveryOutcome, MigrationOrder, OrderedFile, PackageSummary};
