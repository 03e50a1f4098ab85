//! # Actions dispatched through the store.
//!
//! An [`Action`] is an application event: a `kind` string, a JSON payload and
//! [`Meta`] data. Actions produced through a scoped creator carry the identity
//! of the emitting module in `meta.module`; actions built directly carry none
//! and are invisible to scoped reducers and scoped subscriptions.
//!
//! ## Example
//! ```rust
//! use modtree::Action;
//! use serde_json::json;
//!
//! let action = Action::new("todo/add")
//!     .with_payload(json!({ "title": "write docs" }))
//!     .with_meta("source", json!("keyboard"));
//!
//! assert_eq!(&*action.kind, "todo/add");
//! assert!(action.module().is_none());
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::identity::ModuleId;

/// Kind of the action used to ask reducers for their initial state.
pub const INIT_KIND: &str = "@@modtree/INIT";

/// Metadata attached to an [`Action`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Meta {
    /// Identity of the module whose scoped creator produced the action.
    pub module: Option<ModuleId>,
    /// Also deliver to the own reducers of the emitter's descendants.
    pub broadcast: bool,
    /// Free-form metadata set by the action creator.
    pub extra: Map<String, Value>,
}

/// Application event routed through the store.
#[derive(Clone, Debug, PartialEq)]
pub struct Action {
    /// Event type name.
    pub kind: Arc<str>,
    /// Event payload (`Value::Null` when absent).
    pub payload: Value,
    /// Routing and free-form metadata.
    pub meta: Meta,
}

impl Action {
    /// Creates an untagged action with a null payload.
    pub fn new(kind: impl Into<Arc<str>>) -> Self {
        Self {
            kind: kind.into(),
            payload: Value::Null,
            meta: Meta::default(),
        }
    }

    /// The action reducers receive when asked for their initial state.
    pub fn init() -> Self {
        Self::new(INIT_KIND)
    }

    /// Attaches a payload.
    #[inline]
    pub fn with_payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Attaches one free-form metadata entry.
    #[inline]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.extra.insert(key.into(), value.into());
        self
    }

    /// Marks the action for downward delivery to descendants' own reducers.
    #[inline]
    pub fn broadcast(mut self) -> Self {
        self.meta.broadcast = true;
        self
    }

    /// Tags the action with the emitting module's identity, replacing any previous tag.
    #[inline]
    pub fn tagged(mut self, module: ModuleId) -> Self {
        self.meta.module = Some(module);
        self
    }

    /// Identity of the emitting module, if the action is tagged.
    #[inline]
    pub fn module(&self) -> Option<ModuleId> {
        self.meta.module
    }

    /// True if the action's kind equals `kind`.
    #[inline]
    pub fn is(&self, kind: &str) -> bool {
        &*self.kind == kind
    }
}

/// A function producing an action from a payload.
pub type ActionCreator = Arc<dyn Fn(Value) -> Action + Send + Sync>;

/// Named set of action creators.
#[derive(Clone, Default)]
pub struct ActionCreators {
    creators: BTreeMap<String, ActionCreator>,
}

impl ActionCreators {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a creator and returns the set, builder style.
    pub fn with<F>(mut self, name: impl Into<String>, creator: F) -> Self
    where
        F: Fn(Value) -> Action + Send + Sync + 'static,
    {
        self.insert(name, Arc::new(creator));
        self
    }

    /// Adds (or replaces) a creator.
    pub fn insert(&mut self, name: impl Into<String>, creator: ActionCreator) {
        self.creators.insert(name.into(), creator);
    }

    /// Returns the creator registered under `name`.
    pub fn get(&self, name: &str) -> Option<&ActionCreator> {
        self.creators.get(name)
    }

    /// Invokes the creator registered under `name`.
    pub fn create(&self, name: &str, payload: impl Into<Value>) -> Option<Action> {
        self.creators.get(name).map(|c| c(payload.into()))
    }

    /// Iterates creators in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ActionCreator)> {
        self.creators.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of creators.
    pub fn len(&self) -> usize {
        self.creators.len()
    }

    /// True if there are no creators.
    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl fmt::Debug for ActionCreators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.creators.keys()).finish()
    }
}
