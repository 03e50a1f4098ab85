//! # Routine execution context.
//!
//! [`RoutineContext`] is what a running routine sees: its cancellation token
//! and the store it belongs to. Supervisors hand each child a context with a
//! child token, so cancelling a group cancels every routine below it.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::state::Selector;
use crate::store::{ActionStream, Store};

/// Cancellation token plus store handle for one running routine.
#[derive(Clone)]
pub struct RoutineContext {
    token: CancellationToken,
    store: Arc<Store>,
}

impl RoutineContext {
    /// Creates a context bound to `store` and `token`.
    pub fn new(store: Arc<Store>, token: CancellationToken) -> Self {
        Self { token, store }
    }

    /// Context for a sub-routine: same store, child token.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            store: Arc::clone(&self.store),
        }
    }

    /// The routine's cancellation token.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the routine has been asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes when the routine is asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Opens a stream of actions dispatched from now on.
    ///
    /// The stream reports [`RoutineError::Canceled`](crate::RoutineError::Canceled)
    /// once this context is cancelled.
    pub fn actions(&self) -> ActionStream {
        self.store.actions(self.token.clone())
    }

    /// Dispatches `action` through the store.
    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    /// Copy of the current global state.
    pub fn state(&self) -> Value {
        self.store.state()
    }

    /// Evaluates `selector` against the current state.
    pub fn select(&self, selector: &Selector) -> Value {
        self.store.select(selector)
    }

    /// The store this routine belongs to.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}

impl std::fmt::Debug for RoutineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutineContext")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}
