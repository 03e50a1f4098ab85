//! # Reducer composition.
//!
//! Produces one reducer per module that reflects whatever children currently
//! exist while keeping the module's own fields that no child manages.
//!
//! ## Decision table (evaluated once, at construction, in this order)
//! ```text
//! own?  children  mount   root   → reducer
//! ───── ───────── ─────── ────── ─────────────────────────────────────────────
//! no    ≥1        any     any    → combine(children)                     (1)
//! no    0         any     any    → dynamic pass-through                  (2)
//! yes   ≥1        any     any    → own default must be an object, else   (3)
//!                                  ModuleError::Structural
//! yes   0         none    any    → own                                   (4)
//! yes   0         some    yes    → combine({ mount: own })               (5)
//! yes   0         some    no     → own
//! yes   ≥1        any     any    → merge(own, children)                  (6)
//! ```
//!
//! A root module with a mount name always occupies that key of the global
//! state, so the wrapping of (5) also applies to the root's (1), (2) and (6)
//! reducers. Its accessor (`root().child(mount)`) then resolves to its slice.
//!
//! ## Merge reducer (6)
//! ```text
//! managed   = keys(own(None, INIT))                   (computed once)
//! mine      = state restricted to managed
//! remainder = state without managed
//! reduced   = own(mine, action)
//! result    = { ..children(remainder, action), ..reduced }   (own keys win)
//! ```
//!
//! ## Children cell
//! A module's children combination lives in [`ChildReducers`], a cell
//! refreshed each time the module's context registers a child. Reducers (1),
//! (2) and (6) read the cell on every dispatch, so a late child becomes part
//! of the state on the next dispatch.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{Map, Value};

use crate::actions::Action;
use crate::core::ancestry::Ancestry;
use crate::error::ModuleError;
use crate::identity::ModuleId;
use crate::state::{Reducer, combine_reducers, combine_step};

/// The current set of a module's children reducers, keyed by mount name.
pub struct ChildReducers {
    cell: ArcSwap<BTreeMap<String, Reducer>>,
}

impl ChildReducers {
    /// Creates an empty cell.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            cell: ArcSwap::from_pointee(BTreeMap::new()),
        })
    }

    /// Adds (or replaces) the reducer mounted at `mount`.
    pub fn insert(&self, mount: &str, reducer: Reducer) {
        self.cell.rcu(|current| {
            let mut next = BTreeMap::clone(current);
            next.insert(mount.to_string(), Arc::clone(&reducer));
            next
        });
    }

    /// True if no child is registered yet.
    pub fn is_empty(&self) -> bool {
        self.cell.load().is_empty()
    }

    /// Number of registered children.
    pub fn len(&self) -> usize {
        self.cell.load().len()
    }

    /// Mount names of the registered children.
    pub fn mounts(&self) -> Vec<String> {
        self.cell.load().keys().cloned().collect()
    }

    /// Runs the current children combination.
    pub fn reduce(&self, state: Option<Value>, action: &Action) -> Value {
        let children = self.cell.load();
        combine_step(&children, state, action)
    }
}

/// Restricts a module's own reducer to actions it may observe.
///
/// With `None` state the reducer always runs (initialization). Otherwise it
/// runs only for actions tagged by `module` or a descendant, or for broadcast
/// actions tagged by an ancestor; any other action leaves the state untouched.
pub fn scope_reducer(own: Reducer, module: ModuleId, ancestry: Arc<Ancestry>) -> Reducer {
    Arc::new(move |state: Option<Value>, action: &Action| {
        let Some(current) = state else {
            return own(None, action);
        };
        if observes(&ancestry, module, action) {
            own(Some(current), action)
        } else {
            current
        }
    })
}

fn observes(ancestry: &Ancestry, module: ModuleId, action: &Action) -> bool {
    match action.module() {
        Some(tag) => {
            ancestry.is_ancestor(module, tag)
                || (action.meta.broadcast && ancestry.is_ancestor(tag, module))
        }
        None => false,
    }
}

/// Inputs of [`compose_reducer`].
pub struct ReducerParts<'a> {
    /// The module's own (already scoped) reducer.
    pub own: Option<Reducer>,
    /// The module's children cell.
    pub children: &'a Arc<ChildReducers>,
    /// Mount name of the module at its parent (or the root's state key).
    pub mount: Option<&'a str>,
    /// True for the application root.
    pub root: bool,
}

/// Applies the decision table and returns the module's composed reducer.
pub fn compose_reducer(parts: ReducerParts<'_>) -> Result<Reducer, ModuleError> {
    let root_key = match (parts.root, parts.mount) {
        (true, Some(key)) => Some(key.to_string()),
        _ => None,
    };
    let slice = compose_slice(parts)?;
    Ok(match root_key {
        Some(key) => {
            tracing::debug!(mount = %key, "compose: root occupies its mount key");
            combine_reducers(BTreeMap::from([(key, slice)]))
        }
        None => slice,
    })
}

/// The reducer of the module's own slice (cases 1 to 6, before root wrapping).
fn compose_slice(parts: ReducerParts<'_>) -> Result<Reducer, ModuleError> {
    let ReducerParts {
        own, children, mount, ..
    } = parts;
    let mount_label = mount.unwrap_or("<unmounted>");

    let Some(own) = own else {
        let cell = Arc::clone(children);
        if !children.is_empty() {
            tracing::debug!(mount = mount_label, children = children.len(), "compose: children only");
            return Ok(Arc::new(move |state: Option<Value>, action: &Action| {
                cell.reduce(state, action)
            }));
        }
        tracing::debug!(mount = mount_label, "compose: dynamic pass-through");
        return Ok(Arc::new(move |state: Option<Value>, action: &Action| {
            if cell.is_empty() {
                state.unwrap_or_else(|| Value::Object(Map::new()))
            } else {
                cell.reduce(state, action)
            }
        }));
    };

    let defaults = own(None, &Action::init());
    let managed: Option<BTreeSet<String>> = match &defaults {
        Value::Object(fields) => Some(fields.keys().cloned().collect()),
        _ => None,
    };

    if children.is_empty() {
        tracing::debug!(mount = mount_label, "compose: own reducer only");
        return Ok(own);
    }

    let Some(managed) = managed else {
        return Err(ModuleError::Structural {
            mount: mount_label.to_string(),
            returned: defaults.to_string(),
        });
    };

    tracing::debug!(
        mount = mount_label,
        children = children.len(),
        own_keys = managed.len(),
        "compose: merge own fields with children"
    );
    let cell = Arc::clone(children);
    Ok(Arc::new(move |state: Option<Value>, action: &Action| {
        let (mine, remainder) = split_managed(state, &managed);
        let reduced = own(mine, action);

        let mut merged = match cell.reduce(remainder, action) {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };
        if let Value::Object(fields) = reduced {
            merged.extend(fields);
        }
        Value::Object(merged)
    }))
}

/// Splits `state` into (own-managed slice, remainder for the children).
fn split_managed(
    state: Option<Value>,
    managed: &BTreeSet<String>,
) -> (Option<Value>, Option<Value>) {
    match state {
        None => (None, None),
        Some(Value::Object(fields)) => {
            let (mine, rest): (Map<String, Value>, Map<String, Value>) =
                fields.into_iter().partition(|(key, _)| managed.contains(key));
            (Some(Value::Object(mine)), Some(Value::Object(rest)))
        }
        Some(other) => (Some(other), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::reducer;
    use serde_json::json;

    /// `{ a, b }` where `a` counts `own/inc`.
    fn own_fields() -> Reducer {
        reducer(|state, action| {
            let mut s = state.unwrap_or_else(|| json!({ "a": 0, "b": "keep" }));
            if action.is("own/inc") {
                let n = s["a"].as_i64().unwrap_or(0);
                s["a"] = json!(n + 1);
            }
            s
        })
    }

    fn counter(kind: &'static str) -> Reducer {
        reducer(move |state, action| {
            let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
            if action.is(kind) { json!(n + 1) } else { json!(n) }
        })
    }

    fn compose(
        own: Option<Reducer>,
        children: &Arc<ChildReducers>,
        mount: Option<&str>,
        root: bool,
    ) -> Result<Reducer, ModuleError> {
        compose_reducer(ReducerParts {
            own,
            children,
            mount,
            root,
        })
    }

    #[test]
    fn children_only_combines_by_mount() {
        let children = ChildReducers::new();
        children.insert("x", counter("x/inc"));
        children.insert("y", counter("y/inc"));
        let r = compose(None, &children, Some("m"), false).unwrap();

        let s0 = r(None, &Action::init());
        assert_eq!(s0, json!({ "x": 0, "y": 0 }));
        assert_eq!(r(Some(s0), &Action::new("y/inc")), json!({ "x": 0, "y": 1 }));
    }

    #[test]
    fn dynamic_pass_through_switches_on_late_child() {
        let children = ChildReducers::new();
        let r = compose(None, &children, Some("lazy"), false).unwrap();

        let s0 = r(None, &Action::init());
        assert_eq!(s0, json!({}));
        let s1 = r(Some(json!({ "untouched": 1 })), &Action::new("x/inc"));
        assert_eq!(s1, json!({ "untouched": 1 }));

        children.insert("x", counter("x/inc"));
        let s2 = r(Some(s0), &Action::new("x/inc"));
        assert_eq!(s2, json!({ "x": 1 }));
    }

    #[test]
    fn scalar_default_with_children_is_structural() {
        let children = ChildReducers::new();
        children.insert("x", counter("x/inc"));
        let err = compose(Some(counter("own")), &children, Some("counter"), false)
            .err()
            .unwrap();
        assert_eq!(
            err,
            ModuleError::Structural {
                mount: "counter".into(),
                returned: "0".into()
            }
        );
    }

    #[test]
    fn leaf_without_mount_is_own_reducer() {
        let children = ChildReducers::new();
        let r = compose(Some(counter("inc")), &children, None, true).unwrap();
        assert_eq!(r(None, &Action::init()), json!(0));
    }

    #[test]
    fn root_leaf_occupies_its_key() {
        let children = ChildReducers::new();
        let r = compose(Some(counter("inc")), &children, Some("counter"), true).unwrap();
        let s0 = r(None, &Action::init());
        assert_eq!(s0, json!({ "counter": 0 }));
        assert_eq!(r(Some(s0), &Action::new("inc")), json!({ "counter": 1 }));
    }

    #[test]
    fn root_with_children_occupies_its_key() {
        let children = ChildReducers::new();
        children.insert("x", counter("x/inc"));
        let r = compose(Some(own_fields()), &children, Some("app"), true).unwrap();
        assert_eq!(
            r(None, &Action::init()),
            json!({ "app": { "a": 0, "b": "keep", "x": 0 } })
        );

        let dynamic = compose(None, &ChildReducers::new(), Some("lazy"), true).unwrap();
        assert_eq!(dynamic(None, &Action::init()), json!({ "lazy": {} }));
    }

    #[test]
    fn mounted_non_root_leaf_is_own_reducer() {
        let children = ChildReducers::new();
        let r = compose(Some(counter("inc")), &children, Some("counter"), false).unwrap();
        assert_eq!(r(None, &Action::init()), json!(0));
    }

    #[test]
    fn merge_preserves_own_fields_and_child_slice() {
        let children = ChildReducers::new();
        children.insert("c", counter("c/inc"));
        let r = compose(Some(own_fields()), &children, Some("m"), false).unwrap();

        let mut state = r(None, &Action::init());
        assert_eq!(state, json!({ "a": 0, "b": "keep", "c": 0 }));

        for kind in ["own/inc", "c/inc", "unrelated", "c/inc", "own/inc"] {
            state = r(Some(state), &Action::new(kind));
            let keys: Vec<&String> = state.as_object().unwrap().keys().collect();
            assert_eq!(keys, ["a", "b", "c"]);
        }
        assert_eq!(state, json!({ "a": 2, "b": "keep", "c": 2 }));
    }

    #[test]
    fn own_fields_win_over_same_named_child() {
        let children = ChildReducers::new();
        children.insert("a", counter("own/inc"));
        let r = compose(Some(own_fields()), &children, Some("m"), false).unwrap();

        let s0 = r(None, &Action::init());
        let s1 = r(Some(s0), &Action::new("own/inc"));
        assert_eq!(s1, json!({ "a": 1, "b": "keep" }));
    }

    #[test]
    fn merge_sees_late_children() {
        let children = ChildReducers::new();
        children.insert("c", counter("c/inc"));
        let r = compose(Some(own_fields()), &children, Some("m"), false).unwrap();
        let s0 = r(None, &Action::init());

        children.insert("d", counter("d/inc"));
        let s1 = r(Some(s0), &Action::new("d/inc"));
        assert_eq!(s1, json!({ "a": 0, "b": "keep", "c": 0, "d": 1 }));
    }

    #[test]
    fn scoped_reducer_ignores_foreign_and_untagged_actions() {
        let ancestry = Arc::new(Ancestry::new());
        let (parent, me, child, sibling) = (
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
            ModuleId::next(),
        );
        ancestry.link(me, parent);
        ancestry.link(child, me);
        ancestry.link(sibling, parent);

        let r = scope_reducer(counter("inc"), me, ancestry);
        let s0 = r(None, &Action::new("inc"));
        assert_eq!(s0, json!(1), "initialization always runs");

        let s = r(Some(s0), &Action::new("inc"));
        assert_eq!(s, json!(1), "untagged");
        let s = r(Some(s), &Action::new("inc").tagged(sibling));
        assert_eq!(s, json!(1), "sibling");
        let s = r(Some(s), &Action::new("inc").tagged(parent));
        assert_eq!(s, json!(1), "ancestor without broadcast");
        let s = r(Some(s), &Action::new("inc").tagged(me));
        assert_eq!(s, json!(2), "self");
        let s = r(Some(s), &Action::new("inc").tagged(child));
        assert_eq!(s, json!(3), "descendant");
        let s = r(Some(s), &Action::new("inc").tagged(parent).broadcast());
        assert_eq!(s, json!(4), "ancestor broadcast");
        let s = r(Some(s), &Action::new("inc").tagged(sibling).broadcast());
        assert_eq!(s, json!(4), "sibling broadcast");
    }
}
