//! Run-wide orchestration.

use crate::package::PackageGraph;
use crate::rule::{Rule, RuleOutcome};
use crate::types::CheckResult;
use tracing::info;

/// The working prefix plus the ordered rules compiled from a rule file.
#[derive(Debug, Clone)]
pub struct RuleSet {
    working_prefix: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(working_prefix: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            working_prefix: working_prefix.into(),
            rules,
        }
    }

    #[must_use]
    pub fn working_prefix(&self) -> &str {
        &self.working_prefix
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Keeps only the rule named `name`. Returns `false` if none matched.
    pub fn retain_rule(&mut self, name: &str) -> bool {
        self.rules.retain(|r| r.name() == name);
        !self.rules.is_empty()
    }

    /// Names of the rules whose selector matches `package`.
    pub fn rules_matching<'a>(&'a self, package: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.package_selector().is_match(package))
            .map(Rule::name)
    }

    /// Runs every package of `graph` through every rule that selects it,
    /// then reports specific exceptions for packages never processed.
    #[must_use]
    pub fn run(&self, graph: &PackageGraph) -> CheckResult {
        let mut outcomes: Vec<RuleOutcome> = self.rules.iter().map(|_| RuleOutcome::new()).collect();

        for package in graph {
            for (rule, outcome) in self.rules.iter().zip(outcomes.iter_mut()) {
                if rule.applies_to(package) {
                    rule.process(graph, package, outcome);
                }
            }
        }

        for (rule, outcome) in self.rules.iter().zip(outcomes.iter_mut()) {
            rule.process_missing_packages(outcome);
        }

        let result = CheckResult {
            reports: self
                .rules
                .iter()
                .zip(outcomes)
                .map(|(rule, outcome)| outcome.into_report(rule))
                .collect(),
            packages_checked: graph.len(),
        };

        info!(
            rules = self.rules.len(),
            packages = result.packages_checked,
            violations = result.violation_count(),
            "Rule evaluation complete"
        );
        result
    }
}
