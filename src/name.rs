use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering::Relaxed};

/// Interned symbol used for source-language variables and builtin names.
///
/// Unlike the teacher's hierarchical `Name` (dotted namespaces, as Lean
/// declarations have), source variables in this language are flat
/// identifiers, so `Name` is just an `Arc`-wrapped string: cheap to clone,
/// compared and hashed structurally.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

/// Counter backing [`Name::fresh`]. A `$` prefix is lexically unavailable to
/// the source language, so fresh names can never collide with a user
/// binding (spec.md §4.5, "fresh-variable discipline").
static FRESH_COUNTER: AtomicU32 = AtomicU32::new(0);

impl Name {
    pub fn new(s: impl AsRef<str>) -> Self {
        Name(Arc::from(s.as_ref()))
    }

    /// Draws the next name from the process-wide `$0, $1, ...` counter.
    ///
    /// Per spec.md §5, callers that compile multiple programs in the same
    /// process either reset between runs or accept strictly increasing
    /// fresh names; both are acceptable and fresh names stay unique either
    /// way, so no reset hook is exposed here.
    pub fn fresh() -> Self {
        let n = FRESH_COUNTER.fetch_add(1, Relaxed);
        Name::new(format!("${}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Name {
        Name::new(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Name {
        Name(Arc::from(s.as_str()))
    }
}

#[cfg(test)]
mod name_tests {
    use super::*;

    #[test]
    fn equal_by_contents() {
        assert_eq!(Name::new("x"), Name::new("x"));
        assert_ne!(Name::new("x"), Name::new("y"));
    }

    #[test]
    fn fresh_names_are_unique_and_dollar_prefixed() {
        let a = Name::fresh();
        let b = Name::fresh();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with('$'));
        assert!(b.as_str().starts_with('$'));
    }
}
