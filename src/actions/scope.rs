//! # Action scoping.
//!
//! [`scope_actions`] wraps every creator of a module so that the produced
//! action carries the module's identity. Everything else the creator put into
//! [`Meta`](crate::Meta) survives untouched.

use std::sync::Arc;

use crate::actions::action::{ActionCreator, ActionCreators};
use crate::identity::ModuleId;

/// Returns creators equivalent to `creators` whose actions are tagged with `module`.
pub fn scope_actions(creators: &ActionCreators, module: ModuleId) -> ActionCreators {
    let mut scoped = ActionCreators::new();
    for (name, creator) in creators.iter() {
        let inner = Arc::clone(creator);
        let wrapped: ActionCreator = Arc::new(move |payload| inner(payload).tagged(module));
        scoped.insert(name, wrapped);
    }
    scoped
}
