//! # Store listeners: post-dispatch notification.
//!
//! After the root reducer applied an action, the [`Store`](crate::Store)
//! hands every listener an [`Applied`] record: the action plus the state it
//! produced. Listeners never slow down dispatch.
//!
//! ```text
//! Store::dispatch(action)
//!   ├─► state = reducer(state, action)
//!   └─► Listeners::notify(&action, &state)
//!         │   Arc<Applied> built once, only if there are listeners
//!         ├──► [queue L1] ─► worker L1 ─► on_dispatch()
//!         └──► [queue LN] ─► worker LN ─► on_dispatch()
//! ```
//!
//! ## Rules
//! - Each listener sees applied dispatches in dispatch order.
//! - A full queue drops the notification for that listener only. Drops are
//!   counted per listener; a warning is logged when a listener starts falling
//!   behind, and an info line with the count once it keeps up again.
//! - Listener panics are caught and logged; the worker keeps serving.
//! - Workers stop once the store (and with it every queue sender) is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::actions::Action;
use crate::subscribers::Subscribe;

/// One applied dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    /// The action the reducer received.
    pub action: Action,
    /// Global state right after the action was applied.
    pub state: Value,
}

struct Channel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Applied>>,
    dropped: AtomicU64,
    lagging: AtomicBool,
}

/// Listener queues owned by a store.
pub struct Listeners {
    channels: Vec<Channel>,
}

impl Listeners {
    /// Spawns one worker per listener.
    ///
    /// Must be called from within a tokio runtime when `subs` is non-empty.
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let channels = subs
            .into_iter()
            .map(|sub| {
                let name = sub.name();
                let (sender, mut rx) = mpsc::channel::<Arc<Applied>>(sub.queue_capacity().max(1));
                tokio::spawn(async move {
                    while let Some(applied) = rx.recv().await {
                        let handled = std::panic::AssertUnwindSafe(sub.on_dispatch(&applied))
                            .catch_unwind()
                            .await;
                        if handled.is_err() {
                            tracing::error!(
                                listener = name,
                                kind = %applied.action.kind,
                                "store listener panicked"
                            );
                        }
                    }
                });
                Channel {
                    name,
                    sender,
                    dropped: AtomicU64::new(0),
                    lagging: AtomicBool::new(false),
                }
            })
            .collect();
        Self { channels }
    }

    /// Queues `action` and the resulting `state` for every listener.
    pub fn notify(&self, action: &Action, state: &Value) {
        if self.channels.is_empty() {
            return;
        }
        let applied = Arc::new(Applied {
            action: action.clone(),
            state: state.clone(),
        });
        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&applied)) {
                Ok(()) => {
                    if channel.lagging.swap(false, Ordering::Relaxed) {
                        tracing::info!(
                            listener = channel.name,
                            dropped = channel.dropped.load(Ordering::Relaxed),
                            "listener caught up"
                        );
                    }
                }
                Err(err) => {
                    channel.dropped.fetch_add(1, Ordering::Relaxed);
                    if !channel.lagging.swap(true, Ordering::Relaxed) {
                        let reason = match err {
                            mpsc::error::TrySendError::Full(_) => "queue full",
                            mpsc::error::TrySendError::Closed(_) => "worker gone",
                        };
                        tracing::warn!(listener = channel.name, reason, "listener dropping dispatches");
                    }
                }
            }
        }
    }

    /// Notifications dropped so far, per listener, in registration order.
    pub fn dropped(&self) -> Vec<(&'static str, u64)> {
        self.channels
            .iter()
            .map(|c| (c.name, c.dropped.load(Ordering::Relaxed)))
            .collect()
    }

    /// True if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::{Semaphore, mpsc::UnboundedSender};

    struct Forward {
        tx: UnboundedSender<Applied>,
        capacity: usize,
        gate: Option<Arc<Semaphore>>,
    }

    #[async_trait]
    impl Subscribe for Forward {
        async fn on_dispatch(&self, applied: &Applied) {
            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await.unwrap();
            }
            let _ = self.tx.send(applied.clone());
        }

        fn name(&self) -> &'static str {
            "forward"
        }

        fn queue_capacity(&self) -> usize {
            self.capacity
        }
    }

    struct Panicky;

    #[async_trait]
    impl Subscribe for Panicky {
        async fn on_dispatch(&self, _applied: &Applied) {
            panic!("listener blew up");
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Applied>) -> Applied {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn listeners_see_actions_with_resulting_state_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let forward: Arc<dyn Subscribe> = Arc::new(Forward {
            tx,
            capacity: 16,
            gate: None,
        });
        let subs = vec![forward, Arc::new(Panicky) as Arc<dyn Subscribe>];
        let listeners = Listeners::new(subs);
        assert_eq!(listeners.len(), 2);

        listeners.notify(&Action::new("first"), &json!(1));
        listeners.notify(&Action::new("second"), &json!(2));

        let first = next(&mut rx).await;
        assert!(first.action.is("first"));
        assert_eq!(first.state, json!(1));
        let second = next(&mut rx).await;
        assert!(second.action.is("second"));
        assert_eq!(second.state, json!(2));
        assert_eq!(listeners.dropped(), vec![("forward", 0), (std::any::type_name::<Panicky>(), 0)]);
    }

    #[tokio::test]
    async fn full_queue_drops_are_counted_per_listener() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let gate = Arc::new(Semaphore::new(0));
        let slow: Arc<dyn Subscribe> = Arc::new(Forward {
            tx,
            capacity: 1,
            gate: Some(Arc::clone(&gate)),
        });
        let subs = vec![slow];
        let listeners = Listeners::new(subs);

        // No await in between: the worker has not taken anything yet.
        for n in 0..5 {
            listeners.notify(&Action::new("tick"), &json!(n));
        }
        assert_eq!(listeners.dropped(), vec![("forward", 4)]);

        gate.add_permits(8);
        assert_eq!(next(&mut rx).await.state, json!(0));
    }

    #[test]
    fn no_listeners_need_no_runtime() {
        let listeners = Listeners::new(Vec::new());
        assert!(listeners.is_empty());
        listeners.notify(&Action::new("ignored"), &Value::Null);
        assert!(listeners.dropped().is_empty());
    }
}
