//! # Module specification.
//!
//! A module's setup closure returns a [`ModuleSpec`]: the raw, unscoped
//! pieces the factory turns into a [`ModuleRecord`](crate::ModuleRecord).
//!
//! Every piece is optional:
//! - reducer initializer: receives the module's initial state
//! - routine initializer: receives a [`RoutineScope`]
//! - action creators and selectors, written against the module's own slice
//! - view initializer: receives a [`ViewScope`]

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::actions::{ActionCreators, TakeLocal};
use crate::identity::ModuleId;
use crate::routines::RoutineRef;
use crate::state::{LocalAccessor, Reducer, Selectors};

/// Type-erased module view (whatever the view initializer built).
pub type View = Arc<dyn Any + Send + Sync>;

pub(crate) type ReducerInit = Box<dyn FnOnce(Option<Value>) -> Reducer>;
pub(crate) type RoutineInit = Box<dyn FnOnce(RoutineScope) -> RoutineRef>;
pub(crate) type ViewInit = Box<dyn FnOnce(ViewScope) -> View>;

/// What a module's routine initializer receives.
#[derive(Clone, Debug)]
pub struct RoutineScope {
    /// The module being built.
    pub module: ModuleId,
    /// Scoped action creators: every action is tagged with `module`.
    pub actions: ActionCreators,
    /// Scoped selectors: they read the module's slice of the global state.
    pub selectors: Selectors,
    /// Subscriptions limited to the module and its descendants.
    pub take_local: TakeLocal,
}

/// What a module's view initializer receives.
#[derive(Clone, Debug)]
pub struct ViewScope {
    /// The module being built.
    pub module: ModuleId,
    /// Scoped action creators.
    pub actions: ActionCreators,
    /// Scoped selectors.
    pub selectors: Selectors,
    /// Accessor from the global state to the module's slice.
    pub accessor: LocalAccessor,
}

/// Raw module definition returned by a setup closure.
///
/// ## Example
/// ```rust
/// use modtree::{Action, ActionCreators, ModuleSpec, Selectors, reducer};
/// use serde_json::json;
///
/// let spec = ModuleSpec::new()
///     .reducer(|initial| {
///         let start = initial.unwrap_or(json!(0));
///         reducer(move |state, action| {
///             let n = state.unwrap_or_else(|| start.clone()).as_i64().unwrap_or(0);
///             if action.is("inc") { json!(n + 1) } else { json!(n) }
///         })
///     })
///     .actions(ActionCreators::new().with("inc", |_| Action::new("inc")))
///     .selectors(Selectors::new().with("count", |local| local.clone()));
/// assert!(spec.has_reducer());
/// assert!(!spec.has_routine());
/// ```
#[derive(Default)]
pub struct ModuleSpec {
    pub(crate) reducer: Option<ReducerInit>,
    pub(crate) routine: Option<RoutineInit>,
    pub(crate) actions: ActionCreators,
    pub(crate) selectors: Selectors,
    pub(crate) view: Option<ViewInit>,
}

impl ModuleSpec {
    /// An empty spec: no own state, routine, actions, selectors or view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reducer initializer.
    pub fn reducer<F>(mut self, init: F) -> Self
    where
        F: FnOnce(Option<Value>) -> Reducer + 'static,
    {
        self.reducer = Some(Box::new(init));
        self
    }

    /// Sets the routine initializer.
    pub fn routine<F>(mut self, init: F) -> Self
    where
        F: FnOnce(RoutineScope) -> RoutineRef + 'static,
    {
        self.routine = Some(Box::new(init));
        self
    }

    /// Sets the unscoped action creators.
    pub fn actions(mut self, actions: ActionCreators) -> Self {
        self.actions = actions;
        self
    }

    /// Sets the unscoped selectors.
    pub fn selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Sets the view initializer.
    pub fn view<F, V>(mut self, init: F) -> Self
    where
        F: FnOnce(ViewScope) -> V + 'static,
        V: Any + Send + Sync,
    {
        self.view = Some(Box::new(move |scope| Arc::new(init(scope)) as View));
        self
    }

    /// True if an own reducer is declared.
    pub fn has_reducer(&self) -> bool {
        self.reducer.is_some()
    }

    /// True if an own routine is declared.
    pub fn has_routine(&self) -> bool {
        self.routine.is_some()
    }
}

impl fmt::Debug for ModuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleSpec")
            .field("reducer", &self.reducer.is_some())
            .field("routine", &self.routine.is_some())
            .field("actions", &self.actions)
            .field("selectors", &self.selectors)
            .field("view", &self.view.is_some())
            .finish()
    }
}
