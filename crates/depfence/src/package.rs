//! Package graph model.
//!
//! [`PackageGraph`] is the single owner of every [`Package`] node. Edges are
//! stored on each package as dependency names and resolved back through the
//! graph, so a node shared by many dependents exists exactly once.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub is_standard_library: bool,
    /// Direct dependencies in import order, without duplicates.
    pub depends_on: Vec<String>,
}

impl Package {
    #[must_use]
    pub fn new(name: impl Into<String>, is_standard_library: bool) -> Self {
        Self {
            name: name.into(),
            is_standard_library,
            depends_on: Vec::new(),
        }
    }

    /// Records an edge to `dependency`. Repeated edges are ignored.
    pub fn add_dependency(&mut self, dependency: impl Into<String>) {
        let dependency = dependency.into();
        if !self.depends_on.contains(&dependency) {
            self.depends_on.push(dependency);
        }
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_standard_library {
            write!(f, "<{}>", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Registry of all packages reachable from a project root, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PackageGraph {
    packages: BTreeMap<String, Package>,
}

impl PackageGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `package`, replacing any node with the same name.
    pub fn insert(&mut self, package: Package) {
        self.packages.insert(package.name.clone(), package);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Iterates packages in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Resolves `package`'s edges to nodes, in import order.
    ///
    /// An edge name without a node yields a non-standard-library leaf of
    /// that name; a graph produced by
    /// [`GraphBuilder`](crate::graph::GraphBuilder) never has such edges.
    pub fn dependencies_of<'a>(
        &'a self,
        package: &'a Package,
    ) -> impl Iterator<Item = Cow<'a, Package>> + 'a {
        package.depends_on.iter().map(|name| {
            self.packages
                .get(name)
                .map_or_else(|| Cow::Owned(Package::new(name.as_str(), false)), Cow::Borrowed)
        })
    }
}

impl<'a> IntoIterator for &'a PackageGraph {
    type Item = &'a Package;
    type IntoIter = std::collections::btree_map::Values<'a, String, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.values()
    }
}

impl FromIterator<Package> for PackageGraph {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut graph = Self::new();
        for package in iter {
            graph.insert(package);
        }
        graph
    }
}
