//! # Global runtime configuration.
//!
//! Provides [`Config`], the centralized settings for the store and the
//! routine supervisors.
//!
//! Config is used in three places:
//! 1. **Module instantiation**: the runtime builds its [`Registry`](crate::Registry)
//!    with `failure_policy`; every [`SupervisedRoutine`](crate::SupervisedRoutine)
//!    composed in that registry uses it.
//! 2. **Store creation**: `bus_capacity` sizes the action broadcast channel.
//! 3. **Runtime shutdown**: `grace` bounds the wait after a termination signal.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `grace = 0s` → no wait, force immediately

use std::time::Duration;

/// Environment variable selecting the failure policy (`strict`/`propagate` or `isolate`).
pub const ENV_FAILURE_POLICY: &str = "MODTREE_FAILURE_POLICY";
/// Environment variable overriding the shutdown grace period, in milliseconds.
pub const ENV_GRACE_MS: &str = "MODTREE_GRACE_MS";

/// What a supervisor does when one of its routines fails.
///
/// The policy is an explicit choice: there is no implicit dependency on the
/// build profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure and keep every other routine in the group running (default).
    #[default]
    Isolate,
    /// Cancel the whole group and return the failure to the parent supervisor.
    Propagate,
}

impl FailurePolicy {
    /// Parses a policy name. Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "isolate" | "best-effort" | "lenient" => Some(FailurePolicy::Isolate),
            "propagate" | "strict" => Some(FailurePolicy::Propagate),
            _ => None,
        }
    }
}

/// Global configuration for stores and supervisors.
///
/// ## Field semantics
/// - `failure_policy`: how supervisors react to routine failures
/// - `bus_capacity`: action bus ring buffer size (min 1; clamped)
/// - `grace`: maximum wait for routines to stop after a shutdown signal
#[derive(Clone, Debug)]
pub struct Config {
    /// Failure policy applied by every composed supervisor routine.
    pub failure_policy: FailurePolicy,

    /// Capacity of the action broadcast channel ring buffer.
    ///
    /// Routines that lag behind more than `bus_capacity` actions skip the
    /// oldest ones (a warning is logged).
    pub bus_capacity: usize,

    /// Maximum time to wait for routines after a shutdown signal.
    pub grace: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Defaults overridden by [`ENV_FAILURE_POLICY`] and [`ENV_GRACE_MS`].
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(raw) = std::env::var(ENV_FAILURE_POLICY) {
            match FailurePolicy::parse(&raw) {
                Some(policy) => cfg.failure_policy = policy,
                None => tracing::warn!(value = %raw, "ignoring unknown {ENV_FAILURE_POLICY}"),
            }
        }
        if let Ok(raw) = std::env::var(ENV_GRACE_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => cfg.grace = Duration::from_millis(ms),
                Err(_) => tracing::warn!(value = %raw, "ignoring invalid {ENV_GRACE_MS}"),
            }
        }
        cfg
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `failure_policy = FailurePolicy::Isolate`
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::Isolate,
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_policy_names() {
        assert_eq!(FailurePolicy::parse("strict"), Some(FailurePolicy::Propagate));
        assert_eq!(FailurePolicy::parse(" Propagate "), Some(FailurePolicy::Propagate));
        assert_eq!(FailurePolicy::parse("isolate"), Some(FailurePolicy::Isolate));
        assert_eq!(FailurePolicy::parse("whatever"), None);
    }

    #[test]
    fn capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
