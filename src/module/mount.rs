//! Where a module's state lives relative to its parent.

use crate::state::LocalAccessor;

/// Mount point descriptor passed to [`ModuleFactory::instantiate`](crate::ModuleFactory::instantiate).
///
/// - `Unmounted`: the module merges into its parent's namespace; its accessor
///   is the identity.
/// - `Key(name)`: the module occupies `state[name]`.
/// - `Nested { key, accessor }`: built by [`ModuleContext::add`](crate::ModuleContext::add);
///   `accessor` is the parent's accessor extended by `key`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mount {
    /// No mount name.
    #[default]
    Unmounted,
    /// A plain mount key under the global root.
    Key(String),
    /// A child mount with its inherited accessor.
    Nested {
        /// Mount key under the parent.
        key: String,
        /// Accessor from the global root to this slice.
        accessor: LocalAccessor,
    },
}

impl Mount {
    /// Builds the descriptor of a child mounted at `key` below `parent`.
    pub fn nested(parent: &LocalAccessor, key: &str) -> Self {
        Mount::Nested {
            key: key.to_string(),
            accessor: parent.child(key),
        }
    }

    /// The mount key, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Mount::Unmounted => None,
            Mount::Key(key) | Mount::Nested { key, .. } => Some(key),
        }
    }

    /// Accessor from the global state to the module's slice.
    pub fn accessor(&self) -> LocalAccessor {
        match self {
            Mount::Unmounted => LocalAccessor::root(),
            Mount::Key(key) => LocalAccessor::root().child(key),
            Mount::Nested { accessor, .. } => accessor.clone(),
        }
    }
}

impl From<&str> for Mount {
    fn from(key: &str) -> Self {
        Mount::Key(key.to_string())
    }
}

impl From<String> for Mount {
    fn from(key: String) -> Self {
        Mount::Key(key)
    }
}

impl From<Option<&str>> for Mount {
    fn from(key: Option<&str>) -> Self {
        key.map_or(Mount::Unmounted, Mount::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accessors_follow_the_descriptor() {
        let state = json!({ "a": { "b": 1 } });

        assert_eq!(Mount::Unmounted.accessor().resolve(&state), &state);
        assert_eq!(Mount::from("a").accessor().resolve(&state), &json!({ "b": 1 }));

        let parent = Mount::from("a").accessor();
        let nested = Mount::nested(&parent, "b");
        assert_eq!(nested.key(), Some("b"));
        assert_eq!(nested.accessor().resolve(&state), &json!(1));
        assert_eq!(Mount::from(None), Mount::Unmounted);
    }
}
