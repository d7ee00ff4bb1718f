//! Dependency selectors.
//!
//! | Expression | Matches |
//! |------------|---------|
//! | `third_parties` | any package outside the working prefix |
//! | `<expr>` | standard-library packages whose name matches `expr` |
//! | `expr` | non-standard-library packages whose name matches `expr` |
//!
//! Regular expressions are unanchored, so `util` matches `acme/util/strings`.

use crate::package::Package;
use regex::Regex;
use std::fmt;
use thiserror::Error;

/// Token selecting every third-party package.
pub const THIRD_PARTIES: &str = "third_parties";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty dependency pattern '{0}'")]
    Empty(String),

    #[error("invalid dependency pattern '{expr}': {source}")]
    Regex {
        expr: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled dependency selector.
#[derive(Debug, Clone)]
pub enum DependencyPattern {
    StandardLibrary(Regex),
    NonStandardLibrary(Regex),
    ThirdParties { working_prefix: String },
}

impl DependencyPattern {
    /// Compiles `expr` in the context of `working_prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if `expr` (or the text inside `<...>`) is
    /// empty or not a valid regular expression.
    pub fn compile(working_prefix: &str, expr: &str) -> Result<Self, PatternError> {
        if expr == THIRD_PARTIES {
            return Ok(Self::ThirdParties {
                working_prefix: working_prefix.to_string(),
            });
        }

        let (inner, standard_library) = match expr
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
        {
            Some(inner) => (inner, true),
            None => (expr, false),
        };

        if inner.is_empty() {
            return Err(PatternError::Empty(expr.to_string()));
        }

        let regex = Regex::new(inner).map_err(|source| PatternError::Regex {
            expr: expr.to_string(),
            source,
        })?;

        Ok(if standard_library {
            Self::StandardLibrary(regex)
        } else {
            Self::NonStandardLibrary(regex)
        })
    }

    /// Tests `package` against this selector.
    ///
    /// The third-party wildcard ignores the standard-library flag: it only
    /// asks whether the name lies outside the working prefix.
    #[must_use]
    pub fn matches(&self, package: &Package) -> bool {
        match self {
            Self::ThirdParties { working_prefix } => !package.name.starts_with(working_prefix),
            Self::StandardLibrary(regex) => {
                package.is_standard_library && regex.is_match(&package.name)
            }
            Self::NonStandardLibrary(regex) => {
                !package.is_standard_library && regex.is_match(&package.name)
            }
        }
    }
}

impl fmt::Display for DependencyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StandardLibrary(regex) => write!(f, "<{}>", regex.as_str()),
            Self::NonStandardLibrary(regex) => write!(f, "{}", regex.as_str()),
            Self::ThirdParties { .. } => write!(f, "{THIRD_PARTIES}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "github.com/acme/app";

    fn compile(expr: &str) -> DependencyPattern {
        DependencyPattern::compile(PREFIX, expr).expect("pattern compiles")
    }

    fn std_pkg(name: &str) -> Package {
        Package::new(name, true)
    }

    fn pkg(name: &str) -> Package {
        Package::new(name, false)
    }

    #[test]
    fn angle_brackets_select_standard_library() {
        let p = compile("<fmt>");
        assert!(matches!(p, DependencyPattern::StandardLibrary(_)));
        assert!(p.matches(&std_pkg("fmt")));
        assert!(!p.matches(&pkg("fmt")));
    }

    #[test]
    fn bare_expression_selects_non_standard_library() {
        let p = compile("github.com/acme/app/util/.*");
        assert!(p.matches(&pkg("github.com/acme/app/util/strings")));
        assert!(!p.matches(&std_pkg("github.com/acme/app/util/strings")));
        assert!(!p.matches(&pkg("github.com/acme/app/domain")));
    }

    #[test]
    fn regex_is_unanchored() {
        let p = compile("bar");
        assert!(p.matches(&pkg("bar")));
        assert!(p.matches(&pkg("foobarbaz")));
    }

    #[test]
    fn third_parties_matches_outside_prefix() {
        let p = compile(THIRD_PARTIES);
        assert!(p.matches(&pkg("github.com/other/lib")));
        assert!(!p.matches(&pkg("github.com/acme/app/util")));
    }

    #[test]
    fn third_parties_ignores_standard_library_flag() {
        let p = compile(THIRD_PARTIES);
        assert!(p.matches(&std_pkg("fmt")));
        assert!(p.matches(&std_pkg("net/http")));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let err = DependencyPattern::compile(PREFIX, "<(unclosed>").expect_err("bad regex");
        assert!(matches!(err, PatternError::Regex { .. }));
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn empty_expression_is_rejected() {
        for expr in ["", "<>"] {
            let err = DependencyPattern::compile(PREFIX, expr).expect_err("empty pattern");
            assert!(matches!(err, PatternError::Empty(_)));
        }
    }

    #[test]
    fn lone_angle_bracket_is_a_plain_regex() {
        let p = compile("<fmt");
        assert!(matches!(p, DependencyPattern::NonStandardLibrary(_)));
        assert!(p.matches(&pkg("<fmt")));
    }

    #[test]
    fn display_round_trips_source_form() {
        for expr in ["<.*>", "util/.*", THIRD_PARTIES] {
            assert_eq!(compile(expr).to_string(), expr);
        }
    }
}
