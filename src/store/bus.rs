//! # Action bus for routines.
//!
//! [`ActionBus`] is a thin wrapper around [`tokio::sync::broadcast`]. The
//! store publishes every dispatched action on it, after the reducer has
//! applied the action; routines read it through an [`ActionStream`].
//!
//! ## Architecture
//! ```text
//! Store::dispatch ──► reducer ──► ActionBus.publish ──┬──► ActionStream (routine 1)
//!                                  (broadcast chan)    ├──► ActionStream (routine 2)
//!                                                      └──► ActionStream (routine N)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Global order**: every stream observes actions in dispatch order; scoped
//!   filtering (see [`TakeLocal`](crate::TakeLocal)) only drops, never reorders.
//! - **Lag handling**: a stream that falls more than `capacity` actions behind
//!   skips the oldest ones and logs a warning.
//! - **No replay**: a stream only sees actions published after it was created.

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::error::RoutineError;

/// Broadcast channel of dispatched actions.
#[derive(Clone, Debug)]
pub struct ActionBus {
    tx: broadcast::Sender<Action>,
}

impl ActionBus {
    /// Creates a new bus with the given channel capacity (min 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Action>(capacity);
        Self { tx }
    }

    /// Publishes an action to all live streams; dropped if there are none.
    pub fn publish(&self, action: Action) {
        let _ = self.tx.send(action);
    }

    /// Opens a stream that stops with `Canceled` once `token` is cancelled.
    pub fn stream(&self, token: CancellationToken) -> ActionStream {
        ActionStream {
            rx: self.tx.subscribe(),
            token,
        }
    }

    /// Number of live streams.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// One routine's view of the action bus.
#[derive(Debug)]
pub struct ActionStream {
    rx: broadcast::Receiver<Action>,
    token: CancellationToken,
}

impl ActionStream {
    /// Waits for the next dispatched action.
    ///
    /// Returns [`RoutineError::Canceled`] when the stream's token is cancelled
    /// or the bus has been dropped.
    pub async fn recv(&mut self) -> Result<Action, RoutineError> {
        loop {
            tokio::select! {
                biased;
                _ = self.token.cancelled() => return Err(RoutineError::Canceled),
                msg = self.rx.recv() => match msg {
                    Ok(action) => return Ok(action),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "action stream lagged; oldest actions skipped");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => return Err(RoutineError::Canceled),
                }
            }
        }
    }

    /// Waits for the next action accepted by `accept`.
    pub async fn next_matching<F>(&mut self, accept: F) -> Result<Action, RoutineError>
    where
        F: Fn(&Action) -> bool,
    {
        loop {
            let action = self.recv().await?;
            if accept(&action) {
                return Ok(action);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn streams_see_actions_in_publish_order() {
        let bus = ActionBus::new(8);
        let mut stream = bus.stream(CancellationToken::new());

        bus.publish(Action::new("a"));
        bus.publish(Action::new("b"));

        assert!(stream.recv().await.unwrap().is("a"));
        assert!(stream.recv().await.unwrap().is("b"));
    }

    #[tokio::test]
    async fn cancellation_ends_the_stream() {
        let bus = ActionBus::new(8);
        let token = CancellationToken::new();
        let mut stream = bus.stream(token.clone());

        token.cancel();
        assert_eq!(stream.recv().await, Err(RoutineError::Canceled));
    }

    #[tokio::test]
    async fn lagged_stream_skips_oldest() {
        let bus = ActionBus::new(2);
        let mut stream = bus.stream(CancellationToken::new());
        for kind in ["a", "b", "c", "d"] {
            bus.publish(Action::new(kind));
        }
        assert!(stream.recv().await.unwrap().is("c"));
        assert!(stream.next_matching(|a| a.is("d")).await.unwrap().is("d"));
    }
}
