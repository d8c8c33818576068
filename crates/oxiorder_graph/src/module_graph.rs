use log::{debug, trace, warn};
use std::{
    collections::{HashSet, VecDeque},
    path::{Path, PathBuf},
    rc::Rc,
};

use oxiorder_core::{DiscoveryError, Resolver, imports_for};

use crate::{
    error::Result,
    graph::{Graph, Keyed},
    package::PackageDescriptor,
};

/// A source file, or an unresolved specifier kept as an opaque leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    key: String,
    path: Option<PathBuf>,
}

impl ModuleNode {
    pub fn file(path: PathBuf) -> Self {
        Self { key: path.to_string_lossy().to_string(), path: Some(path) }
    }

    pub fn external(specifier: &str) -> Self {
        Self { key: specifier.to_string(), path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_external(&self) -> bool {
        self.path.is_none()
    }
}

impl Keyed for ModuleNode {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Builds the file-level graph of one package.
#[derive(Debug)]
pub struct ModuleGraphBuilder {
    package: Rc<PackageDescriptor>,
    entrypoint: Option<PathBuf>,
    include_external: bool,
    graph: Option<Graph<ModuleNode>>,
}

impl ModuleGraphBuilder {
    pub fn new(package: Rc<PackageDescriptor>) -> Self {
        Self { package, entrypoint: None, include_external: false, graph: None }
    }

    /// Walk only what `entrypoint` reaches instead of every package file.
    pub fn with_entrypoint(mut self, entrypoint: PathBuf) -> Self {
        self.entrypoint = Some(entrypoint);
        self
    }

    /// Keep unresolved specifiers as opaque leaves.
    pub fn with_external(mut self, include_external: bool) -> Self {
        self.include_external = include_external;
        self
    }

    pub fn package(&self) -> &PackageDescriptor {
        &self.package
    }

    /// The graph from the last `discover`, if any.
    pub fn graph(&self) -> Option<&Graph<ModuleNode>> {
        self.graph.as_ref()
    }

    /// Drops the cached graph so the next `discover` walks again.
    pub fn invalidate(&mut self) {
        self.graph = None;
    }

    /// Builds the graph on first call and returns the cached one afterwards.
    pub fn discover(&mut self, resolver: &mut Resolver) -> Result<&Graph<ModuleNode>> {
        let graph = match self.graph.take() {
            Some(graph) => graph,
            None => self.build(resolver)?,
        };
        Ok(self.graph.insert(graph))
    }

    /// Package files, dependencies first. Opaque leaves are left out.
    pub fn order(&mut self, resolver: &mut Resolver) -> Result<Vec<PathBuf>> {
        let graph = self.discover(resolver)?;
        Ok(graph
            .top_sort()
            .into_iter()
            .filter_map(|node| node.content().path().map(Path::to_path_buf))
            .collect())
    }

    fn build(&self, resolver: &mut Resolver) -> Result<Graph<ModuleNode>> {
        let name = self.package.name();
        let boundary = self.package.boundary()?;
        let seeds = match &self.entrypoint {
            Some(entry) => vec![entry.clone()],
            None => self.package.source_files()?,
        };
        debug!("Building module graph for '{}' from {} files", name, seeds.len());

        let mut graph = Graph::new();
        for seed in &seeds {
            graph.add_node(ModuleNode::file(seed.clone()));
        }

        let mut queue: VecDeque<PathBuf> = seeds.into();
        let mut parsed: HashSet<PathBuf> = HashSet::new();

        while let Some(file) = queue.pop_front() {
            if !parsed.insert(file.clone()) {
                continue;
            }
            trace!("Visiting module: {}", file.display());

            let specifiers = match imports_for(&file) {
                Ok(specifiers) => specifiers,
                Err(err @ DiscoveryError::Parse { .. }) => {
                    warn!("Skipping imports of unparseable file: {}", err);
                    continue;
                }
                Err(err) => return Err(err.into()),
            };
            let from_key = file.to_string_lossy().to_string();

            for spec in specifiers {
                match resolver.resolve(&file, &spec.request)? {
                    Some(target) if boundary.owns(&target) => {
                        let node = ModuleNode::file(target);
                        let to_key = node.key().to_string();
                        if !graph.has_node(&to_key) {
                            if let Some(path) = node.path() {
                                queue.push_back(path.to_path_buf());
                            }
                            graph.add_node(node);
                        }
                        graph.add_edge(&from_key, &to_key)?;
                    }
                    Some(target) => {
                        trace!("'{}' leaves package '{}': {}", spec.request, name, target.display());
                    }
                    None if self.include_external => {
                        trace!("Keeping '{}' as an opaque leaf", spec.request);
                        graph.add_node(ModuleNode::external(&spec.request));
                        graph.add_edge(&from_key, &spec.request)?;
                    }
                    None => {
                        trace!("Dropping unresolved '{}' from {}", spec.request, file.display());
                    }
                }
            }
        }

        debug!(
            "Module graph for '{}': {} nodes, {} edges",
            name,
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }
}
