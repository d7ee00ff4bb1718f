//! Dependency graph construction.

use crate::package::{Package, PackageGraph};
use crate::resolver::{ImportResolver, ResolveError, ResolvedUnit, ROOT_UNIT};
use std::collections::{HashSet, VecDeque};
use std::path::Path;
use tracing::{debug, info};

/// Builds a [`PackageGraph`] from the unit rooted at a directory.
///
/// Traversal is a visited-set worklist: every unit is resolved at most once,
/// so diamonds and cycles terminate without a depth limit. Standard-library
/// units and units outside the working prefix are recorded as leaves and
/// their imports are never resolved.
pub struct GraphBuilder<R> {
    resolver: R,
    working_prefix: String,
}

impl<R: ImportResolver> GraphBuilder<R> {
    #[must_use]
    pub fn new(resolver: R, working_prefix: impl Into<String>) -> Self {
        Self {
            resolver,
            working_prefix: working_prefix.into(),
        }
    }

    /// Resolves the root unit of `root_dir` and everything it reaches.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the root or any traversed import cannot
    /// be resolved. The partial graph is discarded.
    pub fn build(&self, root_dir: &Path) -> Result<PackageGraph, ResolveError> {
        info!(root = %root_dir.display(), prefix = %self.working_prefix, "Building package graph");

        let mut graph = PackageGraph::new();
        let mut seen = HashSet::new();
        let mut pending = VecDeque::new();

        let root = self.resolver.resolve(ROOT_UNIT, root_dir)?;
        let root_name = root.name.clone();
        seen.insert(root_name.clone());
        graph.insert(self.expand(root_name, root, &mut seen, &mut pending));

        while let Some(name) = pending.pop_front() {
            let unit = self.resolver.resolve(&name, root_dir)?;
            graph.insert(self.expand(name, unit, &mut seen, &mut pending));
        }

        info!(packages = graph.len(), "Package graph complete");
        Ok(graph)
    }

    fn expand(
        &self,
        name: String,
        unit: ResolvedUnit,
        seen: &mut HashSet<String>,
        pending: &mut VecDeque<String>,
    ) -> Package {
        let mut package = Package::new(name, unit.is_standard_library);

        if !self.is_traversed(&package) {
            debug!(package = %package, "Leaf");
            return package;
        }

        for import in unit.imports {
            // In-package tests report the package itself as an import.
            if import == package.name || import == unit.name {
                continue;
            }
            if seen.insert(import.clone()) {
                pending.push_back(import.clone());
            }
            package.add_dependency(import);
        }

        debug!(
            package = %package,
            dependencies = package.depends_on.len(),
            "Resolved"
        );
        package
    }

    fn is_traversed(&self, package: &Package) -> bool {
        !package.is_standard_library && package.name.starts_with(&self.working_prefix)
    }
}
