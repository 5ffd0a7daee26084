//! Navigation targets, settled locations and the history stack.

use std::fmt;

use super::route::{RouteDefinition, RouteMatch};

/// Where a navigation wants to go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavTarget {
    Name(String),
    Path(String),
}

impl NavTarget {
    pub fn name(name: impl Into<String>) -> Self {
        NavTarget::Name(name.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        NavTarget::Path(path.into())
    }
}

impl fmt::Display for NavTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavTarget::Name(name) => write!(f, "{{name: {}}}", name),
            NavTarget::Path(path) => write!(f, "{}", path),
        }
    }
}

/// A location a navigation settled on
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub path: String,
    /// Leaf record name; None when nothing matched
    pub name: Option<String>,
    /// Matched record names, root first
    pub matched: Vec<String>,
    /// Leaf record, for the view layer
    pub route: Option<RouteDefinition>,
}

impl Location {
    pub(crate) fn from_match(requested_path: &str, matched: Option<RouteMatch>) -> Self {
        match matched {
            Some(m) => Self {
                path: m.path.clone(),
                name: m.leaf().map(|r| r.name.clone()),
                matched: m.chain.iter().map(|r| r.name.clone()).collect(),
                route: m.leaf().cloned(),
            },
            None => Self {
                path: requested_path.to_string(),
                name: None,
                matched: Vec::new(),
                route: None,
            },
        }
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<Location>,
}

impl History {
    pub fn push(&mut self, location: Location) {
        self.entries.push(location);
    }

    /// Overwrite the current entry (acts as push on an empty history)
    pub fn replace(&mut self, location: Location) {
        match self.entries.last_mut() {
            Some(current) => *current = location,
            None => self.entries.push(location),
        }
    }

    pub fn current(&self) -> Option<&Location> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Location] {
        &self.entries
    }
}
