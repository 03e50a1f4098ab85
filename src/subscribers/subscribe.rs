//! # Core listener trait
//!
//! `Subscribe` is the extension point for observing every dispatch the store
//! applies (redux-style store listeners). Each listener is driven by its own
//! worker fed by a bounded queue owned by the store's
//! [`Listeners`](crate::Listeners).
//!
//! ## Contract
//! - Called **after** the reducer applied the action, with the resulting
//!   global state.
//! - Implementations may be slow (I/O, batching); they do **not** block
//!   dispatch nor other listeners.
//! - Each listener declares its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. On overflow, dispatches for that listener
//!   are **dropped** and counted.
//!
//! Listeners see *every* action, tagged or not. Scoped observation is the job
//! of [`TakeLocal`](crate::TakeLocal).

use crate::store::Applied;
use async_trait::async_trait;

/// Contract for store listeners.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle one applied dispatch.
    async fn on_dispatch(&self, applied: &Applied);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this listener's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
