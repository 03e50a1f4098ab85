//! State container: store, dispatch and the action bus.
//!
//! ## Contents
//! - [`Store`] owns state and the root reducer, serializes dispatch
//! - [`ActionBus`] thin wrapper over `tokio::sync::broadcast`
//! - [`ActionStream`] one routine's cancellable view of the bus
//! - [`Listeners`] post-dispatch notification of [`Applied`] records
//!
//! ## Quick reference
//! - **Publishers**: `Store::dispatch` (only).
//! - **Consumers**: routines via `RoutineContext::actions()` and
//!   [`TakeLocal::take`](crate::TakeLocal::take); store listeners via
//!   [`Subscribe`](crate::Subscribe).

mod bus;
mod listeners;
#[allow(clippy::module_inception)]
mod store;

pub use bus::{ActionBus, ActionStream};
pub use listeners::{Applied, Listeners};
pub use store::Store;
