//! # Store listeners.
//!
//! This module provides the [`Subscribe`] trait implemented by store
//! listeners, and the built-in listeners. The queues feeding them belong to
//! the store ([`Listeners`](crate::Listeners)).
//!
//! ## Architecture
//! ```text
//! Store::dispatch(action)
//!   ├──► reducer(state, action)
//!   ├──► Listeners::notify(&action, &state) ──┬──► LogWriter
//!   │                                          ├──► Metrics
//!   │                                          └──► Custom ...
//!   └──► ActionBus::publish(action) ─────────► routines (TakeLocal)
//! ```
//!
//! ## Implementing custom listeners
//! ```no_run
//! use modtree::{Applied, Subscribe};
//! use async_trait::async_trait;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_dispatch(&self, applied: &Applied) {
//!         if applied.action.is("user/delete") {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

#[cfg(feature = "logging")]
mod embedded;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscribe::Subscribe;
