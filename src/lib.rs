//! # modtree
//!
//! **modtree** composes independently authored state modules into one tree.
//!
//! Each module owns a reducer, action creators, selectors and a background
//! routine. Nesting modules wires them into one combined store and one
//! supervised routine tree, with action routing scoped so sibling modules
//! never observe or mutate each other's state unless asked to.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌────────────────┐  ctx.add(factory, "a")  ┌────────────────┐
//!     │ ModuleFactory  │ ──────────────────────► │ ModuleFactory  │ ...
//!     │    (root)      │                         │  (child "a")   │
//!     └───────┬────────┘                         └───────┬────────┘
//!             ▼ instantiate_root                         ▼ build + register
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry (explicit Arc handle)                                   │
//! │  - records by id, children by mount name                          │
//! │  - Ancestry: parent edges + positive-answer cache                 │
//! └───────┬──────────────────────────┬───────────────────────┬────────┘
//!         ▼                          ▼                       ▼
//!   compose_reducer            scope_actions /          compose_routine
//!   (decision table,           scope_selectors /        (JoinSet per module,
//!    ChildReducers cell)       TakeLocal                 FailurePolicy)
//!         │                                                  │
//!         ▼                                                  ▼
//! ┌──────────────────────────┐   publish   ┌───────────────────────────┐
//! │ Store                    │ ──────────► │ ActionBus (broadcast)     │
//! │ - state: serde_json      │             │  └─► ActionStream per     │
//! │ - root reducer           │             │      routine (TakeLocal   │
//! │ - Listeners              │             │      filters by ancestry) │
//! └──────────────────────────┘             └───────────────────────────┘
//! ```
//!
//! ### Routing
//! ```text
//! scoped creator ─► Action { meta.module = Some(X) }
//!
//! own reducer of M runs  ⇔  state is None
//!                          ∨ is_ancestor(M, X)
//!                          ∨ (broadcast ∧ is_ancestor(X, M))
//! take_local of M sees   ⇔  is_ancestor(M, X) ∧ pattern matches
//! ```
//!
//! ## Features
//! | Area            | Description                                                   | Key types / traits                               |
//! |-----------------|---------------------------------------------------------------|--------------------------------------------------|
//! | **Modules**     | Define modules and nest them by mount key.                    | [`ModuleFactory`], [`ModuleContext`], [`ModuleSpec`] |
//! | **Registry**    | Track the tree, answer ancestry queries, render it for debug. | [`Registry`], [`RegistrySnapshot`]               |
//! | **State**       | Reducers, combination, scoped selectors.                      | [`Reducer`], [`combine_reducers`], [`Selectors`] |
//! | **Actions**     | Tagged actions, scoped creators and subscriptions.            | [`Action`], [`ActionCreators`], [`TakeLocal`]    |
//! | **Routines**    | Supervised background work per module.                        | [`Routine`], [`RoutineFn`], [`SupervisedRoutine`] |
//! | **Runtime**     | Store wiring, OS signals, grace period.                       | [`Runtime`], [`App`], [`Config`]                 |
//! | **Errors**      | Typed construction, routine and runtime errors.               | [`ModuleError`], [`RoutineError`], [`RuntimeError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] listener _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use modtree::{Action, ActionCreators, Config, ModuleFactory, ModuleSpec, Runtime, reducer};
//! use serde_json::json;
//!
//! let counter = ModuleFactory::new(|ctx| {
//!     let start = ctx.initial_state(json!(0));
//!     Ok(ModuleSpec::new()
//!         .reducer(move |_| {
//!             reducer(move |state, action| {
//!                 let n = state.unwrap_or_else(|| start.clone()).as_i64().unwrap_or(0);
//!                 if action.is("inc") { json!(n + 1) } else { json!(n) }
//!             })
//!         })
//!         .actions(ActionCreators::new().with("inc", |_| Action::new("inc"))))
//! });
//!
//! let pair = {
//!     let counter = counter.clone();
//!     ModuleFactory::new(move |ctx| {
//!         ctx.add(&counter, "left", None)?;
//!         ctx.add(&counter, "right", Some(json!(10)))?;
//!         Ok(ModuleSpec::new())
//!     })
//! };
//!
//! let app = Runtime::new(Config::default()).start(&pair, "pair", None).unwrap();
//! assert_eq!(app.state(), json!({ "pair": { "left": 0, "right": 10 } }));
//!
//! let right = app.registry().child(app.root().id(), "right").unwrap();
//! app.dispatch(right.actions().create("inc", json!(null)).unwrap());
//! assert_eq!(app.state(), json!({ "pair": { "left": 0, "right": 11 } }));
//! ```
mod actions;
mod config;
mod core;
mod error;
mod identity;
mod module;
mod routines;
mod state;
mod store;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{
    Action, ActionCreator, ActionCreators, INIT_KIND, Meta, Pattern, TakeLocal, scope_actions,
};
pub use config::{Config, ENV_FAILURE_POLICY, ENV_GRACE_MS, FailurePolicy};
pub use core::{
    Ancestry, App, ChildReducers, ModuleEntry, ReducerParts, Registry, RegistrySnapshot, Runtime,
    compose_reducer, scope_reducer,
};
pub use error::{ModuleError, RoutineError, RuntimeError};
pub use identity::ModuleId;
pub use module::{ModuleContext, ModuleFactory, ModuleRecord, ModuleSpec, Mount, RoutineScope, View, ViewScope};
pub use routines::{Routine, RoutineContext, RoutineFn, RoutineRef, SupervisedRoutine, compose_routine};
pub use state::{LocalAccessor, Reducer, Selector, Selectors, combine_reducers, reducer, scope_selectors};
pub use store::{ActionBus, ActionStream, Applied, Listeners, Store};
pub use subscribers::Subscribe;

// Optional: expose a simple built-in action logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
