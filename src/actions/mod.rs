//! Actions: data model, scoping and scoped subscriptions.
//!
//! ## Contents
//! - [`Action`], [`Meta`], [`ActionCreators`] the event data model
//! - [`scope_actions`] tags every action a module's creators produce
//! - [`TakeLocal`], [`Pattern`] scoped matching for background routines
//!
//! Actions reach routines through the store's [`ActionBus`](crate::store::ActionBus);
//! see `store/mod.rs` for the dispatch wiring.

mod action;
mod scope;
mod take;

pub use action::{Action, ActionCreator, ActionCreators, INIT_KIND, Meta};
pub use scope::scope_actions;
pub use take::{Pattern, TakeLocal};
