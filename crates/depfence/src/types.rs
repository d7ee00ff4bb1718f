use serde::{Deserialize, Serialize};
use std::fmt;

/// One rule violation.
///
/// `package` is the evaluated package in display form (`<fmt>` for a
/// standard-library package). `dependency` is always the bare name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Violation {
    /// An edge no allowed pattern or exception covers.
    Disallowed { package: String, dependency: String },
    /// A declared exception the package does not actually use.
    Expected { package: String, dependency: String },
    /// A specific exception declared for a package the rule never evaluated.
    Missing { package: String },
}

impl Violation {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disallowed { .. } => "disallowed",
            Self::Expected { .. } => "expected",
            Self::Missing { .. } => "missing",
        }
    }

    fn subject(&self) -> String {
        match self {
            Self::Disallowed {
                package,
                dependency,
            }
            | Self::Expected {
                package,
                dependency,
            } => format!("{package} -> {dependency}"),
            Self::Missing { package } => package.clone(),
        }
    }

    /// Report form with the kind column aligned: `- expected   a -> b`.
    #[must_use]
    pub fn report_line(&self) -> String {
        format!("- {:<10} {}", self.kind(), self.subject())
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.subject())
    }
}

/// Violations accumulated by one rule over one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReport {
    pub rule: String,
    pub violations: Vec<Violation>,
}

impl RuleReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CheckResult {
    /// One entry per rule, in rule-file order.
    pub reports: Vec<RuleReport>,
    pub packages_checked: usize,
}

impl CheckResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_violations(&self) -> bool {
        self.reports.iter().any(|r| !r.is_clean())
    }

    #[must_use]
    pub fn violation_count(&self) -> usize {
        self.reports.iter().map(|r| r.violations.len()).sum()
    }

    /// Reports of rules with at least one violation.
    pub fn failing(&self) -> impl Iterator<Item = &RuleReport> {
        self.reports.iter().filter(|r| !r.is_clean())
    }

    /// Rule name followed by its violations, for every failing rule.
    #[must_use]
    pub fn render(&self) -> String {
        self.to_string()
    }

    pub fn print_report(&self) {
        print!("{}", self.render());

        let failing = self.failing().count();
        eprintln!(
            "\n{} violation(s) in {} of {} rule(s), {} package(s) checked",
            self.violation_count(),
            failing,
            self.reports.len(),
            self.packages_checked
        );
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in self.failing() {
            writeln!(f, "{}", report.rule)?;
            for v in &report.violations {
                writeln!(f, "{}", v.report_line())?;
            }
        }
        Ok(())
    }
}
