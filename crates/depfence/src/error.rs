//! Crate-level error type.
//!
//! [`Error`] unifies the two fatal error kinds of a run: a rule file that
//! cannot be turned into a [`RuleSet`](crate::RuleSet), and a package graph
//! that cannot be resolved. Violations are never errors; they are the
//! output of a successful run.

use crate::config::ConfigError;
use crate::resolver::ResolveError;
use thiserror::Error;

/// Machine-readable classification shared by all depfence errors.
pub trait ErrorCode {
    /// Returns a stable UPPER_SNAKE_CASE error code.
    fn code(&self) -> &'static str;

    /// Returns whether the user can fix the cause without changing code
    /// (e.g. by editing the rule file or installing a toolchain).
    fn is_recoverable(&self) -> bool;
}

/// Unified depfence error.
///
/// # Example
///
/// ```
/// use depfence::{Error, ErrorCode};
/// use depfence::config::ConfigError;
///
/// let err: Error = ConfigError::MalformedWorkingPackage("acme/".into()).into();
/// assert_eq!(err.code(), "CONFIG_MALFORMED_WORKING_PACKAGE");
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// The rule file is unreadable or invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A unit reachable from the root could not be resolved.
    #[error("resolution error: {0}")]
    Resolve(#[from] ResolveError),
}

impl ErrorCode for Error {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Resolve(e) => e.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(e) => e.is_recoverable(),
            Self::Resolve(e) => e.is_recoverable(),
        }
    }
}
