//! # Supervised routine group (one per module).
//!
//! [`SupervisedRoutine`] runs a module's own routine together with every
//! child's (already supervised) routine, concurrently, under one group token.
//!
//! ## Flow
//! ```text
//! run(ctx)
//!   ├─► group = ctx.child()
//!   ├─► spawn own      ─► own.run(group.child())      (JoinSet)
//!   ├─► spawn child 1  ─► child.run(group.child())
//!   ├─► spawn child N  ─► child.run(group.child())
//!   └─► join all:
//!         Ok / Canceled        → continue
//!         Fail / Fatal / panic → FailurePolicy:
//!              Isolate   → error! log, siblings keep running
//!              Propagate → cancel group, drain, return Supervision
//! ```
//!
//! ## Rules
//! - Cancelling `ctx` cancels the whole group (tokens are children of it).
//! - Panics are caught per routine and handled like failures.
//! - Nested groups compose: a child group returning `Supervision` is a
//!   failure of the parent group.

use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::task::JoinSet;

use crate::config::FailurePolicy;
use crate::error::RoutineError;
use crate::routines::context::RoutineContext;
use crate::routines::routine::{Routine, RoutineRef};

/// A module's own routine plus its children's, supervised as one unit.
pub struct SupervisedRoutine {
    name: Cow<'static, str>,
    own: Option<RoutineRef>,
    children: Vec<RoutineRef>,
    policy: FailurePolicy,
}

impl SupervisedRoutine {
    /// Creates a group.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        own: Option<RoutineRef>,
        children: Vec<RoutineRef>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            name: name.into(),
            own,
            children,
            policy,
        }
    }

    /// Number of routines the group starts.
    pub fn len(&self) -> usize {
        self.children.len() + usize::from(self.own.is_some())
    }

    /// True if the group starts nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The group's failure policy.
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    fn members(&self) -> impl Iterator<Item = &RoutineRef> {
        self.own.iter().chain(self.children.iter())
    }
}

/// Builds the supervised routine of one module.
pub fn compose_routine(
    name: impl Into<Cow<'static, str>>,
    own: Option<RoutineRef>,
    children: Vec<RoutineRef>,
    policy: FailurePolicy,
) -> RoutineRef {
    Arc::new(SupervisedRoutine::new(name, own, children, policy))
}

#[async_trait]
impl Routine for SupervisedRoutine {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: RoutineContext) -> Result<(), RoutineError> {
        let group = ctx.child();
        let mut set = JoinSet::new();

        for member in self.members() {
            let member = Arc::clone(member);
            let member_ctx = group.child();
            set.spawn(async move {
                let name = member.name().to_string();
                let outcome = AssertUnwindSafe(member.run(member_ctx))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(RoutineError::Fatal {
                            error: panic_message(panic.as_ref()),
                        })
                    });
                (name, outcome)
            });
        }
        tracing::debug!(group = %self.name, routines = self.len(), policy = ?self.policy, "routine group started");

        let mut failure = None;
        while let Some(joined) = set.join_next().await {
            let (member, outcome) = match joined {
                Ok(done) => done,
                Err(e) => (
                    "<unknown>".to_string(),
                    Err(RoutineError::Fatal {
                        error: e.to_string(),
                    }),
                ),
            };

            let err = match outcome {
                Ok(()) => continue,
                Err(e) if e.is_cancellation() => continue,
                Err(e) => e,
            };

            match self.policy {
                FailurePolicy::Isolate => {
                    tracing::error!(
                        group = %self.name,
                        routine = %member,
                        error = %err,
                        "routine failed; siblings keep running"
                    );
                }
                FailurePolicy::Propagate if failure.is_none() => {
                    tracing::error!(
                        group = %self.name,
                        routine = %member,
                        error = %err,
                        "routine failed; cancelling group"
                    );
                    group.token().cancel();
                    failure = Some(RoutineError::Supervision {
                        module: self.name.to_string(),
                        error: err.to_string(),
                    });
                }
                FailurePolicy::Propagate => {
                    tracing::debug!(group = %self.name, routine = %member, error = %err, "failure while draining");
                }
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
