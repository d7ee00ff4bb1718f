//! Rule evaluation.
//!
//! A [`Rule`] is immutable once compiled. Everything a run learns about it
//! goes into a separate [`RuleOutcome`], so the same rule set can be run
//! any number of times.

use crate::exception::Exceptions;
use crate::package::{Package, PackageGraph};
use crate::pattern::DependencyPattern;
use crate::types::{RuleReport, Violation};
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// One dependency constraint.
#[derive(Debug, Clone)]
pub struct Rule {
    name: String,
    package_selector: Regex,
    allowed: Vec<DependencyPattern>,
    exceptions: Exceptions,
}

impl Rule {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        package_selector: Regex,
        allowed: Vec<DependencyPattern>,
        exceptions: Exceptions,
    ) -> Self {
        Self {
            name: name.into(),
            package_selector,
            allowed,
            exceptions,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn package_selector(&self) -> &Regex {
        &self.package_selector
    }

    #[must_use]
    pub fn allowed_dependency_patterns(&self) -> &[DependencyPattern] {
        &self.allowed
    }

    #[must_use]
    pub fn exceptions(&self) -> &Exceptions {
        &self.exceptions
    }

    /// Whether this rule evaluates `package`.
    #[must_use]
    pub fn applies_to(&self, package: &Package) -> bool {
        self.package_selector.is_match(&package.name)
    }

    /// Evaluates every outgoing edge of `package`.
    ///
    /// Edges are checked against the allowed patterns, then the generic
    /// exceptions, then the specific exceptions of `package`. Uncovered
    /// edges are reported as disallowed in import order; declared
    /// exceptions this package does not use are then reported as expected.
    ///
    /// Accumulation is append-only: processing the same package twice
    /// reports its violations twice.
    pub fn process(&self, graph: &PackageGraph, package: &Package, outcome: &mut RuleOutcome) {
        outcome.processed_packages.insert(package.name.clone());

        let specific = self.exceptions.specific_for(&package.name);
        let mut generic_used = BTreeSet::new();
        let mut specific_used = BTreeSet::new();
        let mut disallowed = Vec::new();

        for dependency in graph.dependencies_of(package) {
            if self.allowed.iter().any(|p| p.matches(&dependency)) {
                continue;
            }
            if self.exceptions.generic.contains(&dependency.name) {
                generic_used.insert(dependency.name.clone());
                continue;
            }
            if specific.is_some_and(|targets| targets.contains(&dependency.name)) {
                specific_used.insert(dependency.name.clone());
                continue;
            }
            disallowed.push(Violation::Disallowed {
                package: package.to_string(),
                dependency: dependency.name.clone(),
            });
        }

        let before = outcome.violations.len();
        outcome.violations.extend(disallowed);

        for expected in &self.exceptions.generic {
            // A package cannot be expected to depend on itself.
            if *expected == package.name || generic_used.contains(expected) {
                continue;
            }
            outcome.violations.push(Violation::Expected {
                package: package.to_string(),
                dependency: expected.clone(),
            });
        }

        for expected in specific.into_iter().flatten() {
            if !specific_used.contains(expected) {
                outcome.violations.push(Violation::Expected {
                    package: package.to_string(),
                    dependency: expected.clone(),
                });
            }
        }

        debug!(
            rule = %self.name,
            package = %package,
            violations = outcome.violations.len() - before,
            "Processed"
        );
    }

    /// Reports specific exceptions whose source package was never processed.
    pub fn process_missing_packages(&self, outcome: &mut RuleOutcome) {
        for package in self.exceptions.specific.keys() {
            if !outcome.processed_packages.contains(package) {
                outcome.violations.push(Violation::Missing {
                    package: package.clone(),
                });
            }
        }
    }
}

/// Per-run accumulator of one rule.
#[derive(Debug, Clone, Default)]
pub struct RuleOutcome {
    processed_packages: BTreeSet<String>,
    violations: Vec<Violation>,
}

impl RuleOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn processed_packages(&self) -> &BTreeSet<String> {
        &self.processed_packages
    }

    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    #[must_use]
    pub fn into_report(self, rule: &Rule) -> RuleReport {
        RuleReport {
            rule: rule.name.clone(),
            violations: self.violations,
        }
    }
}
