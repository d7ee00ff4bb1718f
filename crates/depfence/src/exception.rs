//! Declared exceptions (`expected` entries).
//!
//! An entry is either generic (`"child"`: some package matched by the rule
//! depends on `child`) or specific (`"parent -> child"`: `parent` itself
//! depends on `child`). Both names are relative to the working prefix.

use std::collections::{BTreeMap, BTreeSet};

/// Separator between parent and child in a specific exception.
pub const ARROW: &str = "->";

/// One parsed `expected` entry, with names already qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    Generic { dependency: String },
    Specific { package: String, dependency: String },
}

/// Parses `entry` and prefixes its names with `<working_prefix>/`.
///
/// Returns `None` for entries with more than one `->` or an empty side.
#[must_use]
pub fn parse_exception(working_prefix: &str, entry: &str) -> Option<Exception> {
    let parts: Vec<&str> = entry.split(ARROW).map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let qualify = |name: &str| format!("{working_prefix}/{name}");

    match parts.as_slice() {
        &[dependency] => Some(Exception::Generic {
            dependency: qualify(dependency),
        }),
        &[package, dependency] => Some(Exception::Specific {
            package: qualify(package),
            dependency: qualify(dependency),
        }),
        _ => None,
    }
}

/// Exceptions of one rule, grouped for evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exceptions {
    pub generic: BTreeSet<String>,
    pub specific: BTreeMap<String, BTreeSet<String>>,
}

impl Exceptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, exception: Exception) {
        match exception {
            Exception::Generic { dependency } => {
                self.generic.insert(dependency);
            }
            Exception::Specific {
                package,
                dependency,
            } => {
                self.specific.entry(package).or_default().insert(dependency);
            }
        }
    }

    /// Specific exception targets declared for `package`.
    #[must_use]
    pub fn specific_for(&self, package: &str) -> Option<&BTreeSet<String>> {
        self.specific.get(package)
    }
}

impl FromIterator<Exception> for Exceptions {
    fn from_iter<I: IntoIterator<Item = Exception>>(iter: I) -> Self {
        let mut exceptions = Self::new();
        for exception in iter {
            exceptions.insert(exception);
        }
        exceptions
    }
}
