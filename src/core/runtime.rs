//! # Runtime: application bootstrap and graceful shutdown.
//!
//! The [`Runtime`] turns a root [`ModuleFactory`] into a running application:
//!
//! ```text
//! Runtime::run(root_factory, mount)
//!   ├─► registry = Registry::with_policy(cfg.failure_policy)
//!   ├─► root     = root_factory.instantiate_root(registry, mount)?
//!   ├─► store    = Store::with_listeners(root.reducer, cfg, listeners)
//!   ├─► spawn root.routine(RoutineContext { store, token })
//!   └─► select:
//!         routine finished      → Ok / Err(Routine) under Propagate
//!         termination signal    → cancel token
//!                                 wait ≤ cfg.grace → Ok
//!                                 still running    → Err(GraceExceeded)
//! ```
//!
//! [`Runtime::start`] exposes the intermediate [`App`] so callers can dispatch
//! and inspect state, and [`Runtime::run_until`] replaces the OS signal with
//! any future.
//!
//! ## Example
//! ```rust,no_run
//! use modtree::{Config, ModuleFactory, ModuleSpec, Runtime};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let root = ModuleFactory::new(|_ctx| Ok(ModuleSpec::new()));
//!     Runtime::new(Config::from_env()).run(&root, "app").await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::actions::Action;
use crate::config::Config;
use crate::core::registry::Registry;
use crate::core::shutdown;
use crate::error::{RoutineError, RuntimeError};
use crate::module::{ModuleFactory, ModuleRecord, Mount};
use crate::routines::RoutineContext;
use crate::store::Store;
use crate::subscribers::Subscribe;

/// Application bootstrap.
pub struct Runtime {
    cfg: Config,
    listeners: Vec<Arc<dyn Subscribe>>,
}

/// A built application: registry, root module and store.
#[derive(Clone)]
pub struct App {
    registry: Arc<Registry>,
    root: Arc<ModuleRecord>,
    store: Arc<Store>,
}

impl App {
    /// The registry the tree was built in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The root module.
    pub fn root(&self) -> &Arc<ModuleRecord> {
        &self.root
    }

    /// The store driving the root reducer.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Dispatches `action` through the store.
    pub fn dispatch(&self, action: Action) {
        self.store.dispatch(action);
    }

    /// Copy of the current global state.
    pub fn state(&self) -> Value {
        self.store.state()
    }
}

impl Runtime {
    /// Creates a runtime with the given configuration and no listeners.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            listeners: Vec::new(),
        }
    }

    /// Adds a store listener.
    pub fn with_listener(mut self, listener: Arc<dyn Subscribe>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// The runtime's configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Builds the module tree and the store without running any routine.
    ///
    /// Must be called from within a tokio runtime when listeners are set.
    pub fn start(
        &self,
        root: &ModuleFactory,
        mount: impl Into<Mount>,
        initial_state: Option<Value>,
    ) -> Result<App, RuntimeError> {
        let registry = Registry::with_policy(self.cfg.failure_policy);
        let record = root.instantiate_root(&registry, mount, initial_state)?;
        let store = Store::with_listeners(
            Arc::clone(record.reducer()),
            &self.cfg,
            self.listeners.clone(),
        );
        tracing::info!(
            root = %record.id(),
            modules = registry.len(),
            policy = ?self.cfg.failure_policy,
            "application built"
        );
        Ok(App {
            registry,
            root: record,
            store,
        })
    }

    /// Builds the application and runs it until its routines finish or a
    /// termination signal arrives.
    pub async fn run(&self, root: &ModuleFactory, mount: impl Into<Mount>) -> Result<(), RuntimeError> {
        let app = self.start(root, mount, None)?;
        self.drive(&app, async {
            shutdown::wait_for_shutdown_signal()
                .await
                .map_err(RuntimeError::from)
        })
        .await
    }

    /// Runs `app`'s root routine until it finishes or `shutdown` completes.
    pub async fn run_until<F>(&self, app: &App, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = ()>,
    {
        self.drive(app, async {
            shutdown.await;
            Ok(())
        })
        .await
    }

    async fn drive<F>(&self, app: &App, shutdown: F) -> Result<(), RuntimeError>
    where
        F: Future<Output = Result<(), RuntimeError>>,
    {
        let token = CancellationToken::new();
        let routine = Arc::clone(app.root.routine());
        let ctx = RoutineContext::new(Arc::clone(&app.store), token.clone());
        let mut handle = tokio::spawn(async move { routine.run(ctx).await });

        tokio::select! {
            requested = shutdown => {
                tracing::info!("shutdown requested; cancelling routines");
                token.cancel();
                let grace = self.cfg.grace;
                let outcome = match tokio::time::timeout(grace, &mut handle).await {
                    Ok(joined) => finish(joined),
                    Err(_) => {
                        handle.abort();
                        tracing::warn!(?grace, "routines still running after grace period");
                        Err(RuntimeError::GraceExceeded { grace })
                    }
                };
                requested.and(outcome)
            }
            joined = &mut handle => finish(joined),
        }
    }
}

fn finish(joined: Result<Result<(), RoutineError>, JoinError>) -> Result<(), RuntimeError> {
    match joined {
        Ok(Ok(())) => {
            tracing::info!("routines stopped");
            Ok(())
        }
        Ok(Err(e)) if e.is_cancellation() => Ok(()),
        Ok(Err(e)) => Err(RuntimeError::Routine(e)),
        Err(e) => Err(RuntimeError::Routine(RoutineError::Fatal {
            error: e.to_string(),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FailurePolicy;
    use crate::module::ModuleSpec;
    use crate::routines::{RoutineFn, RoutineRef};
    use crate::state::reducer;
    use serde_json::json;
    use std::time::Duration;

    fn counter() -> ModuleFactory {
        ModuleFactory::new(|_ctx| {
            Ok(ModuleSpec::new().reducer(|_| {
                reducer(|state, action| {
                    let n = state.and_then(|s| s.as_i64()).unwrap_or(0);
                    if action.is("inc") { json!(n + 1) } else { json!(n) }
                })
            }))
        })
    }

    fn with_routine(routine: fn() -> RoutineRef) -> ModuleFactory {
        ModuleFactory::new(move |_ctx| Ok(ModuleSpec::new().routine(move |_| routine())))
    }

    #[tokio::test]
    async fn start_builds_store_from_root_reducer() {
        let app = Runtime::new(Config::default())
            .start(&counter(), "counter", None)
            .unwrap();
        assert_eq!(app.state(), json!({ "counter": 0 }));
        assert_eq!(app.registry().len(), 1);

        let tagged = Action::new("inc").tagged(app.root().id());
        app.dispatch(tagged);
        assert_eq!(app.state(), json!({ "counter": 1 }));
    }

    #[tokio::test]
    async fn finished_routines_end_the_run() {
        let factory = with_routine(|| -> RoutineRef {
            RoutineFn::arc("done", |_ctx: RoutineContext| async { Ok(()) })
        });
        let runtime = Runtime::new(Config::default());
        let app = runtime.start(&factory, "app", None).unwrap();
        runtime.run_until(&app, std::future::pending()).await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_cancels_cooperative_routines() {
        let factory = with_routine(|| -> RoutineRef {
            RoutineFn::arc("waiter", |ctx: RoutineContext| async move {
                ctx.cancelled().await;
                Err(RoutineError::Canceled)
            })
        });
        let runtime = Runtime::new(Config::default());
        let app = runtime.start(&factory, "app", None).unwrap();
        runtime.run_until(&app, async {}).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_routines_exceed_the_grace_period() {
        let factory = with_routine(|| -> RoutineRef {
            RoutineFn::arc("stuck", |_ctx: RoutineContext| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })
        });
        let cfg = Config {
            grace: Duration::from_millis(50),
            ..Config::default()
        };
        let runtime = Runtime::new(cfg);
        let app = runtime.start(&factory, "app", None).unwrap();
        let err = runtime.run_until(&app, async {}).await.unwrap_err();
        assert!(matches!(err, RuntimeError::GraceExceeded { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn propagate_surfaces_routine_failures() {
        let factory = with_routine(|| -> RoutineRef {
            RoutineFn::arc("broken", |_ctx: RoutineContext| async {
                Err(RoutineError::fail("broken"))
            })
        });
        let cfg = Config {
            failure_policy: FailurePolicy::Propagate,
            ..Config::default()
        };
        let runtime = Runtime::new(cfg);
        let app = runtime.start(&factory, "app", None).unwrap();
        let err = runtime.run_until(&app, std::future::pending()).await.unwrap_err();
        assert_eq!(err.as_label(), "routine_supervision");
    }

    #[tokio::test]
    async fn isolate_swallows_routine_failures() {
        let factory = with_routine(|| -> RoutineRef {
            RoutineFn::arc("broken", |_ctx: RoutineContext| async {
                Err(RoutineError::fail("broken"))
            })
        });
        let runtime = Runtime::new(Config::default());
        let app = runtime.start(&factory, "app", None).unwrap();
        runtime.run_until(&app, std::future::pending()).await.unwrap();
    }
}
