//! # LogWriter: simple action logger
//!
//! A minimal listener that writes every applied action through `tracing`
//! at `info` level, and the resulting state at `debug` level. Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! INFO action applied kind="counter/increment" module=Some(3) broadcast=false
//! INFO action applied kind="@@app/boot" module=None broadcast=false
//! ```

use crate::store::Applied;
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Action writer listener.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_dispatch(&self, applied: &Applied) {
        let action = &applied.action;
        tracing::info!(
            kind = %action.kind,
            module = ?action.module().map(|id| id.as_u64()),
            broadcast = action.meta.broadcast,
            "action applied"
        );
        tracing::debug!(kind = %action.kind, state = %applied.state, "state after action");
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
