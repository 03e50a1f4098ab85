//! # Selectors and selector scoping.
//!
//! Module authors write selectors against their own slice. [`scope_selectors`]
//! turns them into selectors over the global state by resolving the module's
//! [`LocalAccessor`] first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::state::accessor::LocalAccessor;

/// A function deriving a value from state.
pub type Selector = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Named set of selectors.
#[derive(Clone, Default)]
pub struct Selectors {
    selectors: BTreeMap<String, Selector>,
}

impl Selectors {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a selector and returns the set, builder style.
    pub fn with<F>(mut self, name: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(selector));
        self
    }

    /// Adds (or replaces) a selector.
    pub fn insert(&mut self, name: impl Into<String>, selector: Selector) {
        self.selectors.insert(name.into(), selector);
    }

    /// Returns the selector registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Selector> {
        self.selectors.get(name)
    }

    /// Runs the selector registered under `name` against `state`.
    pub fn select(&self, name: &str, state: &Value) -> Option<Value> {
        self.selectors.get(name).map(|s| s(state))
    }

    /// Iterates selectors in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Selector)> {
        self.selectors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of selectors.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// True if there are no selectors.
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }
}

impl fmt::Debug for Selectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.selectors.keys()).finish()
    }
}

/// Returns selectors that read the slice `accessor` points at instead of global state.
pub fn scope_selectors(selectors: &Selectors, accessor: &LocalAccessor) -> Selectors {
    let mut scoped = Selectors::new();
    for (name, selector) in selectors.iter() {
        let inner = Arc::clone(selector);
        let accessor = accessor.clone();
        let wrapped: Selector = Arc::new(move |global: &Value| inner(accessor.resolve(global)));
        scoped.insert(name, wrapped);
    }
    scoped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scoped_selectors_read_the_mounted_slice() {
        let selectors = Selectors::new().with("count", |local| local["count"].clone());
        let accessor = LocalAccessor::root().child("a").child("b");
        let scoped = scope_selectors(&selectors, &accessor);

        let global = json!({ "count": 99, "a": { "b": { "count": 3 } } });
        assert_eq!(scoped.select("count", &global), Some(json!(3)));
        assert_eq!(selectors.select("count", &global), Some(json!(99)));
        assert_eq!(scoped.select("missing", &global), None);
    }

    #[test]
    fn unmounted_selectors_see_global_state() {
        let selectors = Selectors::new().with("all", |s| s.clone());
        let scoped = scope_selectors(&selectors, &LocalAccessor::root());
        let global = json!({ "x": 1 });
        assert_eq!(scoped.select("all", &global), Some(global.clone()));
    }
}
