//! # Reducers and the combination primitive.
//!
//! A [`Reducer`] is a pure, synchronous state transition: it receives the
//! current state (`None` before the first transition) and an action, and
//! returns the next state. Reducers never suspend and never fail.
//!
//! [`combine_reducers`] fans one object state out to named sub-reducers:
//!
//! ```text
//! combine({ a: ra, b: rb })(state, action)
//!   = { a: ra(state.a, action), b: rb(state.b, action) }
//! ```
//!
//! Keys of the incoming state that no reducer manages are dropped.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::actions::Action;

/// A state transition function.
pub type Reducer = Arc<dyn Fn(Option<Value>, &Action) -> Value + Send + Sync>;

/// Wraps a closure into a [`Reducer`].
///
/// ## Example
/// ```rust
/// use modtree::{Action, reducer};
/// use serde_json::json;
///
/// let counter = reducer(|state, action| {
///     let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
///     if action.is("increment") { json!(n + 1) } else { json!(n) }
/// });
///
/// let s0 = counter(None, &Action::init());
/// assert_eq!(counter(Some(s0), &Action::new("increment")), json!(1));
/// ```
pub fn reducer<F>(f: F) -> Reducer
where
    F: Fn(Option<Value>, &Action) -> Value + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Combines named reducers into one reducer over an object keyed the same way.
pub fn combine_reducers(reducers: BTreeMap<String, Reducer>) -> Reducer {
    Arc::new(move |state: Option<Value>, action: &Action| {
        combine_step(&reducers, state, action)
    })
}

/// One transition of a combination; shared with the composer's dynamic cells.
pub(crate) fn combine_step(
    reducers: &BTreeMap<String, Reducer>,
    state: Option<Value>,
    action: &Action,
) -> Value {
    let mut previous = match state {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut next = Map::with_capacity(reducers.len());
    for (key, reducer) in reducers {
        let slice = previous.remove(key);
        next.insert(key.clone(), reducer(slice, action));
    }
    Value::Object(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn counter() -> Reducer {
        reducer(|state, action| {
            let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
            if action.is("inc") { json!(n + 1) } else { json!(n) }
        })
    }

    #[test]
    fn initializes_every_key() {
        let combined = combine_reducers(BTreeMap::from([
            ("a".to_string(), counter()),
            ("b".to_string(), counter()),
        ]));
        assert_eq!(combined(None, &Action::init()), json!({ "a": 0, "b": 0 }));
    }

    #[test]
    fn feeds_each_key_its_slice_and_drops_unknown_keys() {
        let combined = combine_reducers(BTreeMap::from([("a".to_string(), counter())]));
        let next = combined(Some(json!({ "a": 4, "stray": true })), &Action::new("inc"));
        assert_eq!(next, json!({ "a": 5 }));
    }

    #[test]
    fn non_object_state_is_treated_as_empty() {
        let combined = combine_reducers(BTreeMap::from([("a".to_string(), counter())]));
        assert_eq!(combined(Some(json!(12)), &Action::new("inc")), json!({ "a": 1 }));
    }
}
