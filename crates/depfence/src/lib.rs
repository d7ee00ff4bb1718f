//! Package dependency constraints for Go module trees.
//!
//! depfence builds the import graph reachable from a project root and checks
//! it against declarative rules:
//!
//! | Violation | Meaning |
//! |-----------|---------|
//! | `disallowed a -> b` | `a` imports `b` and no allowed pattern or exception covers it |
//! | `expected a -> b` | an exception says `a` imports `b`, but it does not |
//! | `missing a` | an exception is declared for `a`, but the rule never evaluated `a` |
//!
//! # Usage
//!
//! ```bash
//! cargo run -p depfence -- check . --config depfence.toml
//! ```

#![forbid(unsafe_code)]

pub mod analyzer;
pub mod config;
pub mod error;
pub mod exception;
pub mod graph;
pub mod package;
pub mod pattern;
pub mod resolver;
pub mod rule;
pub mod ruleset;
pub mod types;

pub use analyzer::Analyzer;
pub use config::Config;
pub use error::{Error, ErrorCode};
pub use package::{Package, PackageGraph};
pub use ruleset::RuleSet;
pub use types::{CheckResult, RuleReport, Violation};
