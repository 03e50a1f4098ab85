//! # Routine abstraction.
//!
//! A [`Routine`] is a module's background work: an async, cancelable unit that
//! reads actions from the store and dispatches new ones. The common handle type
//! is [`RoutineRef`], an `Arc<dyn Routine>` shared between the module record and
//! its parent's supervised group.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RoutineError;
use crate::routines::context::RoutineContext;

/// # Asynchronous, cancelable background routine.
///
/// A `Routine` has a stable [`name`](Routine::name) and an async
/// [`run`](Routine::run) method receiving a [`RoutineContext`]. Implementors
/// should stop promptly once the context is cancelled, returning
/// [`RoutineError::Canceled`] or `Ok(())`.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use modtree::{Routine, RoutineContext, RoutineError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Routine for Ticker {
///     fn name(&self) -> &str { "ticker" }
///
///     async fn run(&self, ctx: RoutineContext) -> Result<(), RoutineError> {
///         let mut actions = ctx.actions();
///         loop {
///             let action = actions.recv().await?;
///             if action.is("stop") {
///                 return Ok(());
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Routine: Send + Sync + 'static {
    /// Returns a stable, human-readable routine name.
    fn name(&self) -> &str;

    /// Runs until completion, failure or cancellation.
    async fn run(&self, ctx: RoutineContext) -> Result<(), RoutineError>;
}

/// Shared handle to a routine.
pub type RoutineRef = Arc<dyn Routine>;
