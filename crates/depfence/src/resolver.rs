//! Import resolution boundary.
//!
//! The graph builder never inspects source files itself. It asks an
//! [`ImportResolver`] for a unit's canonical name, standard-library status
//! and direct imports. [`GoListResolver`] answers through the Go toolchain;
//! [`StaticResolver`] answers from an in-memory table.

use crate::error::ErrorCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Identifier of the unit rooted at the resolver's working directory.
pub const ROOT_UNIT: &str = ".";

/// Default Go binary name.
pub const DEFAULT_GO_BINARY: &str = "go";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to import {unit}: {message}")]
    Failed { unit: String, message: String },

    #[error("failed to decode resolver output for {unit}: {source}")]
    Decode {
        unit: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ResolveError {
    pub fn failed(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            unit: unit.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ResolveError {
    fn code(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "RESOLVE_SPAWN",
            Self::Failed { .. } => "RESOLVE_FAILED",
            Self::Decode { .. } => "RESOLVE_DECODE",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Decode { .. })
    }
}

/// What a resolver knows about one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    /// Canonical qualified name (the import path).
    pub name: String,
    pub is_standard_library: bool,
    /// Direct imports as reported, possibly with duplicates or a self-reference.
    pub imports: Vec<String>,
}

/// Resolves a unit identifier relative to a directory.
pub trait ImportResolver {
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the unit cannot be resolved.
    fn resolve(&self, unit: &str, dir: &Path) -> Result<ResolvedUnit, ResolveError>;
}

impl<R: ImportResolver + ?Sized> ImportResolver for &R {
    fn resolve(&self, unit: &str, dir: &Path) -> Result<ResolvedUnit, ResolveError> {
        (**self).resolve(unit, dir)
    }
}

/// Resolves Go packages with `go list -json`.
#[derive(Debug, Clone)]
pub struct GoListResolver {
    go: PathBuf,
}

impl GoListResolver {
    #[must_use]
    pub fn new(go: impl Into<PathBuf>) -> Self {
        Self { go: go.into() }
    }
}

/// Subset of the `go list -json` record the graph needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
    import_path: String,
    #[serde(default)]
    goroot: bool,
    #[serde(default)]
    standard: bool,
    #[serde(default)]
    imports: Vec<String>,
}

impl GoListPackage {
    fn into_unit(self) -> ResolvedUnit {
        ResolvedUnit {
            name: self.import_path,
            is_standard_library: self.goroot || self.standard,
            imports: self.imports,
        }
    }
}

fn decode_go_list(unit: &str, stdout: &[u8]) -> Result<ResolvedUnit, ResolveError> {
    let listed: GoListPackage =
        serde_json::from_slice(stdout).map_err(|source| ResolveError::Decode {
            unit: unit.to_string(),
            source,
        })?;
    Ok(listed.into_unit())
}

impl ImportResolver for GoListResolver {
    fn resolve(&self, unit: &str, dir: &Path) -> Result<ResolvedUnit, ResolveError> {
        debug!(unit, dir = %dir.display(), "go list");

        let output = Command::new(&self.go)
            .args(["list", "-json", unit])
            .current_dir(dir)
            .output()
            .map_err(|source| ResolveError::Spawn {
                program: self.go.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::failed(unit, stderr.trim()));
        }

        decode_go_list(unit, &output.stdout)
    }
}

/// Resolver backed by a fixed table of units.
///
/// The directory argument is ignored. [`ROOT_UNIT`] resolves to the unit
/// registered with [`StaticResolver::with_root`].
///
/// ```
/// use depfence::resolver::{ImportResolver, StaticResolver, ROOT_UNIT};
/// use std::path::Path;
///
/// let resolver = StaticResolver::new()
///     .with_root("acme/app", ["fmt"])
///     .with_standard_library("fmt");
/// let root = resolver.resolve(ROOT_UNIT, Path::new(".")).expect("root resolves");
/// assert_eq!(root.name, "acme/app");
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    root: Option<String>,
    units: BTreeMap<String, ResolvedUnit>,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the root unit and its imports.
    #[must_use]
    pub fn with_root<I, S>(mut self, name: &str, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.root = Some(name.to_string());
        self.with_package(name, imports)
    }

    /// Registers a non-standard-library unit.
    #[must_use]
    pub fn with_package<I, S>(mut self, name: &str, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.units.insert(
            name.to_string(),
            ResolvedUnit {
                name: name.to_string(),
                is_standard_library: false,
                imports: imports.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// Registers `unit` under its own name.
    #[must_use]
    pub fn with_unit(mut self, unit: ResolvedUnit) -> Self {
        self.units.insert(unit.name.clone(), unit);
        self
    }

    /// Registers a standard-library unit without imports.
    #[must_use]
    pub fn with_standard_library(mut self, name: &str) -> Self {
        self.units.insert(
            name.to_string(),
            ResolvedUnit {
                name: name.to_string(),
                is_standard_library: true,
                imports: Vec::new(),
            },
        );
        self
    }
}

impl ImportResolver for StaticResolver {
    fn resolve(&self, unit: &str, _dir: &Path) -> Result<ResolvedUnit, ResolveError> {
        let name = if unit == ROOT_UNIT {
            self.root
                .as_deref()
                .ok_or_else(|| ResolveError::failed(unit, "no root unit registered"))?
        } else {
            unit
        };
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::failed(unit, "cannot find package"))
    }
}
