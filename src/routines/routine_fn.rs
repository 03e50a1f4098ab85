//! # Function-backed routine (`RoutineFn`)
//!
//! [`RoutineFn`] wraps a closure `F: Fn(RoutineContext) -> Fut`, producing a
//! fresh future per run. State shared between runs must be held explicitly
//! (e.g. `Arc<...>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use modtree::{RoutineContext, RoutineError, RoutineFn, RoutineRef};
//!
//! let r: RoutineRef = RoutineFn::arc("worker", |ctx: RoutineContext| async move {
//!     ctx.cancelled().await;
//!     Ok::<_, RoutineError>(())
//! });
//!
//! assert_eq!(r.name(), "worker");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RoutineError;
use crate::routines::context::RoutineContext;
use crate::routines::routine::Routine;

/// Function-backed routine implementation.
#[derive(Debug)]
pub struct RoutineFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> RoutineFn<F> {
    /// Creates a new function-backed routine.
    ///
    /// Prefer [`RoutineFn::arc`] when you immediately need a [`RoutineRef`](crate::RoutineRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the routine and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Routine for RoutineFn<F>
where
    F: Fn(RoutineContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RoutineError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: RoutineContext) -> Result<(), RoutineError> {
        (self.f)(ctx).await
    }
}
