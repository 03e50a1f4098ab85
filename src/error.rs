//! Error types used by module construction, routines and the runtime.
//!
//! This module defines three error enums:
//!
//! - [`ModuleError`]: errors raised while building the module tree.
//! - [`RoutineError`]: errors raised by background routines and their supervisors.
//! - [`RuntimeError`]: errors raised by the application bootstrap itself.
//!
//! All types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::time::Duration;
use thiserror::Error;

use crate::identity::ModuleId;

/// # Errors produced while instantiating and wiring modules.
///
/// These are deterministic configuration/authoring errors: they surface at
/// construction time and are never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// A module declares children but its own reducer's default state is not an object.
    #[error(
        "{mount} has children, so its own reducer must default to an object; {returned} was returned instead"
    )]
    Structural {
        /// Mount point of the offending module (`<unmounted>` when it has none).
        mount: String,
        /// Rendered default state that was returned.
        returned: String,
    },

    /// Registry lookup of an identity that was never registered.
    #[error("module {id} is not registered")]
    NotFound {
        /// The identity that was looked up.
        id: ModuleId,
    },

    /// Context lookup of a mount key that no child occupies.
    #[error("module {parent} has no child mounted at {mount:?}")]
    UnknownMount {
        /// The parent whose children were searched.
        parent: ModuleId,
        /// The mount key that was requested.
        mount: String,
    },

    /// An identity was registered twice.
    #[error("module {id} is already registered")]
    Duplicate {
        /// The identity registered twice.
        id: ModuleId,
    },

    /// The module's setup closure rejected its inputs.
    #[error("module setup failed: {error}")]
    Setup {
        /// The underlying error message.
        error: String,
    },
}

impl ModuleError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modtree::ModuleError;
    ///
    /// let err = ModuleError::Setup { error: "bad".into() };
    /// assert_eq!(err.as_label(), "module_setup");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ModuleError::Structural { .. } => "module_structural",
            ModuleError::NotFound { .. } => "module_not_found",
            ModuleError::UnknownMount { .. } => "module_unknown_mount",
            ModuleError::Duplicate { .. } => "module_duplicate",
            ModuleError::Setup { .. } => "module_setup",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ModuleError::Structural { mount, returned } => {
                format!("reducer sanity: mount={mount} default={returned}")
            }
            ModuleError::NotFound { id } => format!("not found: id={id}"),
            ModuleError::UnknownMount { parent, mount } => {
                format!("unknown mount: parent={parent} mount={mount}")
            }
            ModuleError::Duplicate { id } => format!("duplicate: id={id}"),
            ModuleError::Setup { error } => format!("setup: {error}"),
        }
    }

    /// Convenience constructor for [`ModuleError::Setup`].
    pub fn setup(error: impl Into<String>) -> Self {
        ModuleError::Setup {
            error: error.into(),
        }
    }
}

/// # Errors produced by background routines.
///
/// A routine reports `Fail`/`Fatal` for its own failures and `Canceled` when it
/// observed cancellation. Supervisors wrap a child failure into `Supervision`
/// when running under [`FailurePolicy::Propagate`](crate::FailurePolicy::Propagate).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutineError {
    /// Routine execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable error reported by the routine.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Routine was cancelled because its supervisor group stopped.
    #[error("context cancelled")]
    Canceled,

    /// A routine inside a supervised group failed and the group was torn down.
    #[error("supervised group {module} failed: {error}")]
    Supervision {
        /// Name of the supervised group that failed.
        module: String,
        /// Rendered failure of the routine that brought the group down.
        error: String,
    },
}

impl RoutineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use modtree::RoutineError;
    ///
    /// assert_eq!(RoutineError::Canceled.as_label(), "routine_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutineError::Fail { .. } => "routine_failed",
            RoutineError::Fatal { .. } => "routine_fatal",
            RoutineError::Canceled => "routine_canceled",
            RoutineError::Supervision { .. } => "routine_supervision",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RoutineError::Fail { error } => format!("error: {error}"),
            RoutineError::Fatal { error } => format!("fatal: {error}"),
            RoutineError::Canceled => "context cancelled".to_string(),
            RoutineError::Supervision { module, error } => {
                format!("supervision: group={module} error={error}")
            }
        }
    }

    /// Convenience constructor for [`RoutineError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        RoutineError::Fail {
            error: error.into(),
        }
    }

    /// Indicates whether the error only reports cooperative cancellation.
    ///
    /// Cancellation is a graceful exit and is never counted as a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, RoutineError::Canceled)
    }
}

/// # Errors produced by the application runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some routines were still running.
    #[error("shutdown timeout {grace:?} exceeded; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// The root module could not be built.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// The root routine failed under the propagate policy.
    #[error(transparent)]
    Routine(#[from] RoutineError),

    /// OS signal handlers could not be installed.
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Module(e) => e.as_label(),
            RuntimeError::Routine(e) => e.as_label(),
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace } => format!("grace exceeded after {grace:?}"),
            RuntimeError::Module(e) => e.as_message(),
            RuntimeError::Routine(e) => e.as_message(),
            RuntimeError::Signal(e) => format!("signal: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_error_names_the_mount() {
        let err = ModuleError::Structural {
            mount: "counter".into(),
            returned: "3".into(),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("counter has children"));
        assert!(rendered.contains("3 was returned instead"));
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(
            ModuleError::NotFound { id: ModuleId::from_raw(7) }.as_label(),
            "module_not_found"
        );
        assert_eq!(RoutineError::fail("x").as_label(), "routine_failed");
        assert_eq!(
            RuntimeError::GraceExceeded {
                grace: Duration::from_secs(1)
            }
            .as_label(),
            "runtime_grace_exceeded"
        );
    }

    #[test]
    fn only_canceled_is_cancellation() {
        assert!(RoutineError::Canceled.is_cancellation());
        assert!(!RoutineError::fail("boom").is_cancellation());
    }
}
