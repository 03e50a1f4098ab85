//! # Local-state accessors.
//!
//! A [`LocalAccessor`] is the path of mount keys leading from the global
//! state to one module's mounted slice. A child's accessor is its parent's
//! accessor extended by the child's mount key, which chains to any depth.
//!
//! ```text
//! root()             → state
//! root().child("a")  → state["a"]
//!   .child("b")      → state["a"]["b"]
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

static NULL: Value = Value::Null;

/// Immutable path from global state to a module's slice.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalAccessor {
    path: Arc<[String]>,
}

impl LocalAccessor {
    /// The identity accessor (unmounted / merged modules).
    pub fn root() -> Self {
        Self::default()
    }

    /// This accessor followed by a lookup of `key`.
    pub fn child(&self, key: &str) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(key.to_string());
        Self { path: path.into() }
    }

    /// Mount keys from the global root, outermost first.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// True for the identity accessor.
    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Resolves the slice inside `state`; a missing segment yields `Value::Null`.
    pub fn resolve<'a>(&self, state: &'a Value) -> &'a Value {
        let mut current = state;
        for segment in self.path.iter() {
            match current.get(segment.as_str()) {
                Some(next) => current = next,
                None => return &NULL,
            }
        }
        current
    }
}

impl fmt::Debug for LocalAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str("LocalAccessor(<root>)")
        } else {
            write!(f, "LocalAccessor({})", self.path.join("."))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chains_to_arbitrary_depth() {
        let state = json!({ "a": { "b": { "c": 3 } } });
        let acc = LocalAccessor::root().child("a").child("b");

        assert_eq!(acc.resolve(&state), &json!({ "c": 3 }));
        assert_eq!(acc.child("c").resolve(&state), &json!(3));
        assert_eq!(acc.path(), ["a".to_string(), "b".to_string()]);
        assert!(!acc.is_root());
        assert!(LocalAccessor::root().is_root());
        assert_eq!(format!("{:?}", LocalAccessor::root()), "LocalAccessor(<root>)");
        assert_eq!(format!("{acc:?}"), "LocalAccessor(a.b)");
    }

    #[test]
    fn root_is_identity_and_missing_is_null() {
        let state = json!({ "a": 1 });
        assert_eq!(LocalAccessor::root().resolve(&state), &state);
        assert!(LocalAccessor::root().child("zzz").resolve(&state).is_null());
        assert!(LocalAccessor::root().child("a").child("b").resolve(&state).is_null());
    }
}
