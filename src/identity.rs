//! Request identity: group hierarchy plus request name
//!
//! Two requests with the same leaf name are only the same request when they
//! ran under the same group hierarchy. The key is a struct compared by value,
//! so segment text can never collide with the delimiter used for display.

use serde::{Serialize, Serializer};
use std::fmt;

/// Delimiter used both in the `group_hierarchy` column and in display labels
pub const HIERARCHY_DELIMITER: char = '|';

/// Aggregation key for a request: the groups it ran under, outermost first,
/// followed by its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullRequestPath {
    hierarchy: Vec<String>,
    name: String,
}

impl FullRequestPath {
    /// Resolve the key for a request event. An empty hierarchy is a valid
    /// context of its own.
    pub fn resolve<S: AsRef<str>>(hierarchy: &[S], name: &str) -> Self {
        Self {
            hierarchy: hierarchy.iter().map(|s| s.as_ref().to_string()).collect(),
            name: name.to_string(),
        }
    }

    /// Split a `group_hierarchy` column value into segments. Empty segments
    /// left by stray delimiters are dropped.
    pub fn parse_hierarchy(column: &str) -> Vec<String> {
        column
            .split(HIERARCHY_DELIMITER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn has_context(&self) -> bool {
        !self.hierarchy.is_empty()
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, segment: &str) -> fmt::Result {
    for c in segment.chars() {
        if c == HIERARCHY_DELIMITER || c == '\\' {
            write!(f, "\\")?;
        }
        write!(f, "{}", c)?;
    }
    Ok(())
}

impl fmt::Display for FullRequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.hierarchy {
            write_escaped(f, segment)?;
            write!(f, "{}", HIERARCHY_DELIMITER)?;
        }
        write_escaped(f, &self.name)
    }
}

impl Serialize for FullRequestPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
