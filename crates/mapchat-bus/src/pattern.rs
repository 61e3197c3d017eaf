//! Subscription patterns.
//!
//! Patterns are stored under their raw string so that `listener_count` and
//! bookkeeping operate on exactly what the caller registered. [`Pattern`] is
//! the parsed view used for matching and for computing which registry keys
//! an emitted type reaches.

use std::fmt;

/// Root wildcard.
pub const ROOT_WILDCARD: &str = "*";

/// Suffix marking a namespace wildcard.
const NAMESPACE_SUFFIX: &str = ".*";

/// A parsed subscription pattern.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Pattern {
    /// Matches one event type exactly.
    Exact(String),
    /// Matches every type with this namespace as a strict dot-separated prefix.
    Namespace(String),
    /// Matches every event.
    All,
}

impl Pattern {
    /// Parse a caller-supplied pattern string. Never fails: anything that is
    /// not `*` or `<ns>.*` is an exact type.
    pub fn parse(raw: &str) -> Self {
        if raw == ROOT_WILDCARD {
            return Self::All;
        }
        match raw.strip_suffix(NAMESPACE_SUFFIX) {
            Some(ns) if !ns.is_empty() => Self::Namespace(ns.to_string()),
            _ => Self::Exact(raw.to_string()),
        }
    }

    /// Whether an event of `event_type` is delivered to this pattern.
    pub fn matches(&self, event_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Exact(t) => t == event_type,
            Self::Namespace(ns) => event_type
                .strip_prefix(ns.as_str())
                .is_some_and(|rest| rest.starts_with('.')),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ROOT_WILDCARD),
            Self::Exact(t) => f.write_str(t),
            Self::Namespace(ns) => write!(f, "{ns}{NAMESPACE_SUFFIX}"),
        }
    }
}

/// Registry keys an event of `event_type` is delivered to, in delivery order:
/// the exact type, then each namespace wildcard from the longest prefix to
/// the shortest, then `*`.
///
/// Keys are distinct. A type that is itself spelled like a wildcard
/// (`map.*`) reaches the `map.*` registrations once, not once as the exact
/// type and again as the namespace.
pub fn delivery_keys(event_type: &str) -> Vec<String> {
    let mut keys = Vec::with_capacity(4);
    keys.push(event_type.to_string());
    let namespaces = event_type
        .rmatch_indices('.')
        .map(|(idx, _)| &event_type[..idx])
        .filter(|ns| !ns.is_empty())
        .map(|ns| format!("{ns}{NAMESPACE_SUFFIX}"));
    for key in namespaces {
        if key != event_type {
            keys.push(key);
        }
    }
    if event_type != ROOT_WILDCARD {
        keys.push(ROOT_WILDCARD.to_string());
    }
    keys
}
