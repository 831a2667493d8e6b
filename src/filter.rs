//! Request filtering
//!
//! Restricts which requests are aggregated, matched against the full request
//! path as displayed (`Group|Sub|name`). Supports plain regexes and negation
//! with a leading `!`.

use crate::error::{GstatError, Result};
use crate::identity::FullRequestPath;
use regex::Regex;

/// Decides which requests are kept during ingestion
#[derive(Debug, Clone)]
pub struct RequestFilter {
    pattern: Option<Regex>,
    negated: bool,
}

impl RequestFilter {
    /// Keep every request
    pub fn all() -> Self {
        Self {
            pattern: None,
            negated: false,
        }
    }

    /// Parse an expression like `^Checkout\|` or `!health`
    pub fn from_expr(expr: &str) -> Result<Self> {
        let (negated, pattern) = match expr.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, expr),
        };
        let regex = Regex::new(pattern).map_err(|e| {
            GstatError::Config(format!("invalid request filter `{}`: {}", expr, e))
        })?;
        Ok(Self {
            pattern: Some(regex),
            negated,
        })
    }

    /// Build from an optional expression; `None` keeps everything
    pub fn from_option(expr: Option<&str>) -> Result<Self> {
        match expr {
            Some(expr) => Self::from_expr(expr),
            None => Ok(Self::all()),
        }
    }

    pub fn matches(&self, path: &FullRequestPath) -> bool {
        match &self.pattern {
            None => true,
            Some(regex) => regex.is_match(&path.to_string()) != self.negated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(hierarchy: &[&str], name: &str) -> FullRequestPath {
        FullRequestPath::resolve(hierarchy, name)
    }

    #[test]
    fn test_all_keeps_everything() {
        let filter = RequestFilter::all();
        assert!(filter.matches(&path(&[], "X")));
        assert!(filter.matches(&path(&["A", "B"], "X")));
    }

    #[test]
    fn test_regex_matches_full_path() {
        let filter = RequestFilter::from_expr(r"^Checkout\|").unwrap();
        assert!(filter.matches(&path(&["Checkout"], "pay")));
        assert!(!filter.matches(&path(&["Browse"], "Checkout")));
        assert!(!filter.matches(&path(&[], "Checkout")));
    }

    #[test]
    fn test_negation() {
        let filter = RequestFilter::from_expr("!health").unwrap();
        assert!(!filter.matches(&path(&[], "healthcheck")));
        assert!(filter.matches(&path(&["A"], "login")));
    }

    #[test]
    fn test_invalid_regex() {
        assert!(matches!(
            RequestFilter::from_expr("(unclosed"),
            Err(GstatError::Config(_))
        ));
    }

    #[test]
    fn test_from_option() {
        assert!(RequestFilter::from_option(None)
            .unwrap()
            .matches(&path(&[], "anything")));
        assert!(!RequestFilter::from_option(Some("^a$"))
            .unwrap()
            .matches(&path(&[], "b")));
    }
}
