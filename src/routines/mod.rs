//! Background routines and their supervision.
//!
//! ## Contents
//! - [`Routine`], [`RoutineRef`] the async, cancelable unit of background work
//! - [`RoutineFn`] closure-backed routine
//! - [`RoutineContext`] what a running routine sees (token + store)
//! - [`SupervisedRoutine`], [`compose_routine`] one group per module, run
//!   under a [`FailurePolicy`](crate::FailurePolicy)

mod context;
mod routine;
mod routine_fn;
mod supervised;

pub use context::RoutineContext;
pub use routine::{Routine, RoutineRef};
pub use routine_fn::RoutineFn;
pub use supervised::{SupervisedRoutine, compose_routine};
