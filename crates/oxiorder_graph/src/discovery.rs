use log::{debug, info};

use crate::{
    config::DiscoveryOptions, error::Result, project_graph::ProjectGraphBuilder,
    types::DiscoveryOutcome,
};

/// Discovers the project described by `options` and returns its migration
/// order with a summary of every package.
pub fn run_discovery(options: DiscoveryOptions) -> Result<DiscoveryOutcome> {
    info!("Starting dependency order discovery");
    debug!(
        "Options: root={:?}, entrypoint={:?}, include={:?}, exclude={:?}",
        options.root, options.entrypoint, options.include, options.exclude
    );

    let mut builder = ProjectGraphBuilder::new(options)?;
    info!("Using root directory: {}", builder.root().display());

    let order = builder.discover()?.clone();
    let packages = builder.summaries();
    let files_analyzed = builder.files_analyzed();

    info!(
        "Discovery complete: {} files in order across {} packages",
        order.files.len(),
        packages.len()
    );
    Ok(DiscoveryOutcome { root: builder.root().to_path_buf(), order, packages, files_analyzed })
}
