//! Workspace-level discovery.
//!
//! Workspace members become nodes of a package graph, connected through the
//! names in their dependency tables. Each package then orders its own files,
//! and the project root's loose files go last since the root depends on
//! every member it uses.

use indexmap::IndexMap;
use log::{debug, info, trace, warn};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    rc::Rc,
};

use oxiorder_core::{
    MANIFEST_FILE, Manifest, Resolver, WORKSPACE_SKIP_DIRS, collect_dirs, relative_slash_path,
};

use crate::{
    config::DiscoveryOptions,
    error::Result,
    graph::{Graph, Keyed},
    module_graph::{ModuleGraphBuilder, ModuleNode},
    package::{ConversionLevel, PackageDescriptor, dir_name},
    types::{MigrationOrder, OrderedFile, PackageSummary},
};

#[derive(Debug, Clone)]
pub struct PackageNode {
    key: String,
    descriptor: Rc<PackageDescriptor>,
    converted: bool,
}

impl PackageNode {
    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    pub fn is_converted(&self) -> bool {
        self.converted
    }
}

impl Keyed for PackageNode {
    fn key(&self) -> &str {
        &self.key
    }
}

/// Owns every graph and the resolver of one discovery run.
#[derive(Debug)]
pub struct ProjectGraphBuilder {
    root: PathBuf,
    options: DiscoveryOptions,
    resolver: Resolver,
    packages: Graph<PackageNode>,
    modules: IndexMap<String, ModuleGraphBuilder>,
    root_modules: Option<ModuleGraphBuilder>,
    root_converted: bool,
    order: Option<MigrationOrder>,
}

impl ProjectGraphBuilder {
    pub fn new(mut options: DiscoveryOptions) -> Result<Self> {
        let root = options.initialize()?;
        Ok(Self {
            root,
            options,
            resolver: Resolver::new(),
            packages: Graph::new(),
            modules: IndexMap::new(),
            root_modules: None,
            root_converted: false,
            order: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &DiscoveryOptions {
        &self.options
    }

    /// Runs discovery once; later calls return the same order.
    pub fn discover(&mut self) -> Result<&MigrationOrder> {
        let order = match self.order.take() {
            Some(order) => order,
            None => match self.options.entrypoint.clone() {
                Some(entry) => self.build_entrypoint(entry)?,
                None => self.build_workspace()?,
            },
        };
        Ok(self.order.insert(order))
    }

    pub fn package_graph(&self) -> &Graph<PackageNode> {
        &self.packages
    }

    /// File graph of a workspace member, once discovered.
    pub fn module_graph(&self, package: &str) -> Option<&Graph<ModuleNode>> {
        self.modules.get(package).and_then(ModuleGraphBuilder::graph)
    }

    /// File graph of the project root, or of the entrypoint closure.
    pub fn root_graph(&self) -> Option<&Graph<ModuleNode>> {
        self.root_modules.as_ref().and_then(ModuleGraphBuilder::graph)
    }

    /// Number of source files across all discovered module graphs.
    pub fn files_analyzed(&self) -> usize {
        self.modules
            .values()
            .chain(self.root_modules.iter())
            .filter_map(ModuleGraphBuilder::graph)
            .map(|g| g.nodes().filter(|n| !n.content().is_external()).count())
            .sum()
    }

    /// Workspace packages in dependency order, then the root.
    pub fn summaries(&self) -> Vec<PackageSummary> {
        let skip = self.options.skip_converted;
        let mut summaries: Vec<PackageSummary> = self
            .packages
            .top_sort()
            .into_iter()
            .map(|node| {
                let pkg = node.content();
                self.summary(pkg.descriptor(), pkg.converted, skip && pkg.converted)
            })
            .collect();
        if let Some(root) = &self.root_modules {
            summaries.push(self.summary(
                root.package(),
                self.root_converted,
                skip && self.root_converted,
            ));
        }
        summaries
    }

    fn summary(&self, pkg: &PackageDescriptor, converted: bool, skipped: bool) -> PackageSummary {
        let root = relative_slash_path(&self.root, pkg.root())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| ".".to_string());
        PackageSummary { name: pkg.name().to_string(), root, kind: pkg.kind(), converted, skipped }
    }

    fn apply_options(&self, descriptor: &mut PackageDescriptor) {
        for pattern in &self.options.include {
            descriptor.add_include(pattern.clone());
        }
        for pattern in &self.options.exclude {
            descriptor.add_exclude(pattern.clone());
        }
        descriptor.set_include_tests(self.options.include_tests);
    }

    fn build_entrypoint(&mut self, entry: PathBuf) -> Result<MigrationOrder> {
        info!("Discovering files reachable from {}", entry.display());
        let name = Manifest::read(&self.root.join(MANIFEST_FILE))
            .ok()
            .and_then(|m| m.name)
            .unwrap_or_else(|| dir_name(&self.root));

        let mut descriptor = PackageDescriptor::detached(&self.root, name.clone());
        self.apply_options(&mut descriptor);
        let mut builder = ModuleGraphBuilder::new(Rc::new(descriptor))
            .with_entrypoint(entry)
            .with_external(self.options.include_external);

        let paths = builder.order(&mut self.resolver)?;
        let files = paths.into_iter().map(|p| ordered_file(&self.root, p, &name)).collect();
        self.root_modules = Some(builder);
        Ok(MigrationOrder { files, packages: Vec::new() })
    }

    fn build_workspace(&mut self) -> Result<MigrationOrder> {
        info!("Discovering packages under {}", self.root.display());
        let mut root_pkg = PackageDescriptor::load(&self.root)?;
        self.apply_options(&mut root_pkg);
        let root_pkg = Rc::new(root_pkg);

        let mut visited = HashSet::from([self.root.clone()]);
        self.discover_workspace(&root_pkg, &mut visited)?;
        self.connect_packages()?;
        info!("Found {} workspace packages", self.packages.len());

        let package_order: Vec<(String, bool)> = self
            .packages
            .top_sort()
            .into_iter()
            .map(|node| (node.key().to_string(), node.content().converted))
            .collect();

        let mut files = Vec::new();
        for (name, converted) in &package_order {
            if *converted && self.options.skip_converted {
                info!("Skipping converted package '{}'", name);
                continue;
            }
            let Some(builder) = self.modules.get_mut(name) else {
                continue;
            };
            let paths = builder.order(&mut self.resolver)?;
            debug!("Package '{}' contributes {} files", name, paths.len());
            files.extend(paths.into_iter().map(|p| ordered_file(&self.root, p, name)));
        }

        self.root_converted = root_pkg.is_converted(ConversionLevel::SourceOnly)?;
        let root_name = root_pkg.name().to_string();
        let mut root_builder =
            ModuleGraphBuilder::new(root_pkg).with_external(self.options.include_external);
        if self.root_converted && self.options.skip_converted {
            info!("Skipping converted project root '{}'", root_name);
        } else {
            let paths = root_builder.order(&mut self.resolver)?;
            debug!("Project root contributes {} files", paths.len());
            files.extend(paths.into_iter().map(|p| ordered_file(&self.root, p, &root_name)));
        }
        self.root_modules = Some(root_builder);

        let packages = package_order.into_iter().map(|(name, _)| name).collect();
        Ok(MigrationOrder { files, packages })
    }

    fn discover_workspace(
        &mut self,
        parent: &PackageDescriptor,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<()> {
        if !parent.is_workspace_root() {
            return Ok(());
        }
        debug!("Expanding workspaces of '{}': {:?}", parent.name(), parent.workspaces());
        let dirs = collect_dirs(parent.root(), parent.workspaces(), WORKSPACE_SKIP_DIRS)?;

        for dir in dirs {
            if !visited.insert(dir.clone()) {
                trace!("Already visited {}", dir.display());
                continue;
            }
            if !dir.join(MANIFEST_FILE).is_file() {
                debug!("No {} in {}, not a package", MANIFEST_FILE, dir.display());
                continue;
            }

            let mut descriptor = PackageDescriptor::load(&dir)?;
            let name = descriptor.name().to_string();
            if self.options.ignore_package.contains(&name) {
                info!("Ignoring package '{}'", name);
                continue;
            }
            if let Some(existing) = self.packages.get_node(&name) {
                warn!(
                    "Duplicate package name '{}' at {}, keeping {}",
                    name,
                    dir.display(),
                    existing.content().descriptor().root().display()
                );
                continue;
            }

            self.apply_options(&mut descriptor);
            let converted = descriptor.is_converted(ConversionLevel::SourceOnly)?;
            let descriptor = Rc::new(descriptor);
            debug!("Registered package '{}' at {}", name, dir.display());
            self.packages.add_node(PackageNode {
                key: name.clone(),
                descriptor: Rc::clone(&descriptor),
                converted,
            });
            self.modules.insert(
                name,
                ModuleGraphBuilder::new(Rc::clone(&descriptor))
                    .with_external(self.options.include_external),
            );

            self.discover_workspace(&descriptor, visited)?;
        }
        Ok(())
    }

    fn connect_packages(&mut self) -> Result<()> {
        let mut edges = Vec::new();
        for node in self.packages.nodes() {
            let pkg = node.content().descriptor();
            let mut names: Vec<&String> = Vec::new();
            if self.options.crawl_dependencies {
                names.extend(pkg.dependencies());
            }
            if self.options.crawl_dev_dependencies {
                names.extend(pkg.dev_dependencies());
            }
            for dep in names {
                if dep != node.key() && self.packages.has_node(dep) {
                    edges.push((node.key().to_string(), dep.clone()));
                }
            }
        }

        for (from, to) in edges {
            trace!("Package '{}' depends on '{}'", from, to);
            self.packages.add_edge(&from, &to)?;
        }
        debug!("Package graph has {} edges", self.packages.edge_count());
        Ok(())
    }
}

fn ordered_file(root: &Path, absolute_path: PathBuf, package: &str) -> OrderedFile {
    let relative_path = relative_slash_path(root, &absolute_path)
        .unwrap_or_else(|| absolute_path.to_string_lossy().to_string());
    OrderedFile { absolute_path, relative_path, package: package.to_string() }
}
