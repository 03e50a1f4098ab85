//! # Store: state container driving the composed root reducer.
//!
//! The [`Store`] owns the current state and the root [`Reducer`]. Dispatch is
//! serialized: one action at a time runs through the reducer. Listeners then
//! receive the action with the state it produced, and the action is published
//! on the [`ActionBus`], both in dispatch order.
//!
//! ## Dispatch path
//! ```text
//! dispatch(action)
//!   ├─► lock state
//!   ├─► next  = reducer(Some(state.clone()), &action)
//!   ├─► state = next                        (skipped if the reducer panics)
//!   ├─► Listeners::notify(&action, &state)  (non-blocking)
//!   ├─► ActionBus::publish(action)          (non-blocking)
//!   └─► unlock
//! ```
//!
//! Publishing happens under the state lock so concurrent dispatchers can never
//! deliver actions to routines in an order different from the order the
//! reducer saw them.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::config::Config;
use crate::state::{Reducer, Selector};
use crate::store::bus::{ActionBus, ActionStream};
use crate::store::listeners::Listeners;
use crate::subscribers::Subscribe;

/// State container for a composed module tree.
pub struct Store {
    state: Mutex<Value>,
    reducer: Reducer,
    bus: ActionBus,
    listeners: Listeners,
}

impl Store {
    /// Creates a store and initializes state with `reducer(None, &Action::init())`.
    pub fn new(reducer: Reducer, cfg: &Config) -> Arc<Self> {
        Self::with_listeners(reducer, cfg, Vec::new())
    }

    /// Creates a store with listeners.
    ///
    /// Must be called from within a tokio runtime when `listeners` is non-empty.
    pub fn with_listeners(
        reducer: Reducer,
        cfg: &Config,
        listeners: Vec<Arc<dyn Subscribe>>,
    ) -> Arc<Self> {
        let initial = reducer(None, &Action::init());
        Arc::new(Self {
            state: Mutex::new(initial),
            reducer,
            bus: ActionBus::new(cfg.bus_capacity_clamped()),
            listeners: Listeners::new(listeners),
        })
    }

    /// Applies `action` to the state and publishes it.
    pub fn dispatch(&self, action: Action) {
        let mut state = self.state.lock();
        // A panicking reducer unwinds before the assignment and leaves the
        // previous state in place.
        let next = (self.reducer)(Some(state.clone()), &action);
        *state = next;

        self.listeners.notify(&action, &state);
        self.bus.publish(action);
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> Value {
        self.state.lock().clone()
    }

    /// Runs `f` against the current state without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&*self.state.lock())
    }

    /// Evaluates a (scoped or global) selector against the current state.
    pub fn select(&self, selector: &Selector) -> Value {
        self.with_state(|state| selector(state))
    }

    /// Opens a stream of subsequently dispatched actions.
    pub fn actions(&self, token: CancellationToken) -> ActionStream {
        self.bus.stream(token)
    }

    /// The store's listeners.
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// The underlying action bus.
    pub fn bus(&self) -> &ActionBus {
        &self.bus
    }
}
