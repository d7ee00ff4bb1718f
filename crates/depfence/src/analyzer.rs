use crate::config::{Config, ConfigError};
use crate::error::Error;
use crate::graph::GraphBuilder;
use crate::resolver::{GoListResolver, ImportResolver};
use crate::ruleset::RuleSet;
use crate::types::CheckResult;

use std::borrow::Cow;
use std::path::PathBuf;
use tracing::info;

/// Builds the package graph of a project and runs a rule set over it.
pub struct Analyzer<R> {
    root: PathBuf,
    rule_set: RuleSet,
    resolver: R,
    rule_filter: Option<String>,
}

impl Analyzer<GoListResolver> {
    /// Compiles `config` and resolves with the Go toolchain it names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not compile.
    pub fn from_config(root: PathBuf, config: &Config) -> Result<Self, Error> {
        let rule_set = config.compile()?;
        let resolver = GoListResolver::new(config.resolver.go.clone());
        Ok(Self::new(root, rule_set, resolver))
    }
}

impl<R: ImportResolver> Analyzer<R> {
    #[must_use]
    pub fn new(root: PathBuf, rule_set: RuleSet, resolver: R) -> Self {
        Self {
            root,
            rule_set,
            resolver,
            rule_filter: None,
        }
    }

    /// Restricts the run to the rule with this name.
    #[must_use]
    pub fn with_rule_filter(mut self, filter: Option<&str>) -> Self {
        self.rule_filter = filter.map(String::from);
        self
    }

    #[must_use]
    pub fn rule_set(&self) -> &RuleSet {
        &self.rule_set
    }

    /// Builds the graph and evaluates every active rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the rule filter names no rule, and
    /// [`Error::Resolve`] if the graph cannot be built.
    pub fn analyze(&self) -> Result<CheckResult, Error> {
        info!("Starting analysis at {:?}", self.root);

        let rule_set = self.active_rules()?;
        let graph = GraphBuilder::new(&self.resolver, rule_set.working_prefix()).build(&self.root)?;
        let result = rule_set.run(&graph);

        info!(
            "Analysis complete: {} violations in {} packages",
            result.violation_count(),
            result.packages_checked
        );

        Ok(result)
    }

    fn active_rules(&self) -> Result<Cow<'_, RuleSet>, ConfigError> {
        let Some(ref filter) = self.rule_filter else {
            return Ok(Cow::Borrowed(&self.rule_set));
        };
        let mut filtered = self.rule_set.clone();
        if filtered.retain_rule(filter) {
            Ok(Cow::Owned(filtered))
        } else {
            Err(ConfigError::UnknownRule(filter.clone()))
        }
    }
}
