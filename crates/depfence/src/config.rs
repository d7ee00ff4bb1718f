//! Rule file loading and validation.
//!
//! The rule file is TOML by default; files ending in `.yaml` / `.yml` are
//! read as YAML with the same schema. Loading is two-step: serde
//! deserializes the raw [`Config`], then [`Config::compile`] validates it
//! and produces a [`RuleSet`].
//!
//! # Environment Variables
//!
//! - `DEPFENCE_WORKING_PACKAGE`: overrides `options.working_package`
//! - `DEPFENCE_GO`: overrides `resolver.go`

use crate::error::ErrorCode;
use crate::exception::{parse_exception, Exceptions};
use crate::pattern::{DependencyPattern, PatternError};
use crate::resolver::DEFAULT_GO_BINARY;
use crate::rule::Rule;
use crate::ruleset::RuleSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default rule file name.
pub const CONFIG_FILE: &str = "depfence.toml";

/// Starter rule file written by `depfence init`.
pub const DEFAULT_CONFIG: &str = r#"[options]
# Import path of the module under check.
working_package = "github.com/example/project"

[[rules]]
name = "domain depends only on the standard library"
packages = "domain(/.*)?"
may_depend = ["<.*>", "github.com/example/project/domain(/.*)?"]
expected = []

[[rules]]
name = "handlers do not reach into storage"
packages = "handlers(/.*)?"
may_depend = ["<.*>", "third_parties", "github.com/example/project/(domain|handlers)(/.*)?"]
expected = []
"#;

const ENV_WORKING_PACKAGE: &str = "DEPFENCE_WORKING_PACKAGE";
const ENV_GO: &str = "DEPFENCE_GO";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: Options,

    #[serde(default)]
    pub rules: Vec<RuleConfig>,

    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Options {
    #[serde(default)]
    pub working_package: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,

    /// Selector relative to the working package.
    pub packages: String,

    #[serde(default)]
    pub may_depend: Vec<String>,

    #[serde(default)]
    pub expected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_go")]
    pub go: PathBuf,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { go: default_go() }
    }
}

fn default_go() -> PathBuf {
    PathBuf::from(DEFAULT_GO_BINARY)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// Picks the format from the file extension; anything but `.yaml`/`.yml` is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

impl Config {
    /// Reads and parses a rule file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), "Loaded rule file");
        Self::parse(&content, ConfigFormat::from_path(path))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if `content` is not a valid rule file.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => Ok(toml::from_str(content)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(content)?),
        }
    }

    /// Applies `DEPFENCE_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] for empty override values.
    pub fn apply_env_vars(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup(ENV_WORKING_PACKAGE) {
            if val.is_empty() {
                return Err(ConfigError::invalid_env_var(ENV_WORKING_PACKAGE, "must not be empty"));
            }
            self.options.working_package = val;
        }
        if let Some(val) = lookup(ENV_GO) {
            if val.is_empty() {
                return Err(ConfigError::invalid_env_var(ENV_GO, "must not be empty"));
            }
            self.resolver.go = PathBuf::from(val);
        }
        Ok(())
    }

    /// Validates the configuration and compiles every rule.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found, in rule-file order.
    pub fn compile(&self) -> Result<RuleSet, ConfigError> {
        let prefix = &self.options.working_package;
        if prefix.is_empty() || prefix.ends_with('/') {
            return Err(ConfigError::MalformedWorkingPackage(prefix.clone()));
        }

        let rules = self
            .rules
            .iter()
            .map(|r| r.compile(prefix))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(prefix = %prefix, rules = rules.len(), "Compiled rule set");
        Ok(RuleSet::new(prefix.clone(), rules))
    }
}

impl RuleConfig {
    /// Compiles this rule relative to `working_package`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid selector, pattern or exception.
    pub fn compile(&self, working_package: &str) -> Result<Rule, ConfigError> {
        let selector = format!("^{}/(?:{})$", regex::escape(working_package), self.packages);
        let package_selector =
            Regex::new(&selector).map_err(|source| ConfigError::InvalidSelector {
                rule: self.name.clone(),
                source,
            })?;

        let allowed = self
            .may_depend
            .iter()
            .map(|expr| {
                DependencyPattern::compile(working_package, expr).map_err(|source| {
                    ConfigError::Pattern {
                        rule: self.name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exceptions = self
            .expected
            .iter()
            .map(|entry| {
                parse_exception(working_package, entry)
                    .ok_or_else(|| ConfigError::MalformedExpectation(entry.clone()))
            })
            .collect::<Result<Exceptions, _>>()?;

        Ok(Rule::new(
            self.name.clone(),
            package_selector,
            allowed,
            exceptions,
        ))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML rule file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse YAML rule file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("working_package must be a package import path, was '{0}'")]
    MalformedWorkingPackage(String),

    #[error("malformed expectation '{0}'")]
    MalformedExpectation(String),

    #[error("invalid package selector in rule '{rule}': {source}")]
    InvalidSelector {
        rule: String,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule}': {source}")]
    Pattern {
        rule: String,
        #[source]
        source: PatternError,
    },

    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    #[error("no rule named '{0}'")]
    UnknownRule(String),
}

impl ConfigError {
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO",
            Self::Toml(_) | Self::Yaml(_) => "CONFIG_PARSE",
            Self::MalformedWorkingPackage(_) => "CONFIG_MALFORMED_WORKING_PACKAGE",
            Self::MalformedExpectation(_) => "CONFIG_MALFORMED_EXPECTATION",
            Self::InvalidSelector { .. } => "CONFIG_INVALID_SELECTOR",
            Self::Pattern { .. } => "CONFIG_INVALID_PATTERN",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::UnknownRule(_) => "CONFIG_UNKNOWN_RULE",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
