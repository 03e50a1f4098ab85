//! # Example: nested_counters
//!
//! Two counter modules nested under a dashboard module.
//!
//! Shows how to:
//! - Define modules with [`ModuleFactory`] and nest them with `ctx.add`.
//! - Drive a child's state from its own routine with scoped actions.
//! - Observe descendants from a parent routine with [`TakeLocal`].
//! - Attach the built-in [`LogWriter`] listener and stop on Ctrl-C.
//!
//! ## Tree
//! ```text
//! dashboard          { ticks_seen, fast: n, slow: n }
//! ├── fast           ticks every 200ms
//! └── slow           ticks every 700ms
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example nested_counters --features logging
//! MODTREE_GRACE_MS=500 cargo run --example nested_counters --features logging
//! ```

use std::sync::Arc;
use std::time::Duration;

use modtree::{
    Action, ActionCreators, Config, LogWriter, ModuleFactory, ModuleSpec, RoutineContext,
    RoutineError, RoutineFn, Runtime, Selectors, reducer,
};
use serde_json::{Value, json};

fn counter(period: Duration) -> ModuleFactory {
    ModuleFactory::new(move |ctx| {
        let start = ctx.initial_state(json!(0));
        Ok(ModuleSpec::new()
            .reducer(move |_| {
                reducer(move |state, action| {
                    let n = state.unwrap_or_else(|| start.clone()).as_i64().unwrap_or(0);
                    if action.is("counter/tick") { json!(n + 1) } else { json!(n) }
                })
            })
            .actions(ActionCreators::new().with("tick", |_| Action::new("counter/tick")))
            .routine(move |scope| {
                RoutineFn::arc("ticker", move |ctx: RoutineContext| {
                    let actions = scope.actions.clone();
                    async move {
                        let mut every = tokio::time::interval(period);
                        loop {
                            tokio::select! {
                                _ = ctx.cancelled() => return Err(RoutineError::Canceled),
                                _ = every.tick() => {
                                    if let Some(tick) = actions.create("tick", Value::Null) {
                                        ctx.dispatch(tick);
                                    }
                                }
                            }
                        }
                    }
                })
            }))
    })
}

fn dashboard() -> ModuleFactory {
    let fast = counter(Duration::from_millis(200));
    let slow = counter(Duration::from_millis(700));
    ModuleFactory::new(move |ctx| {
        ctx.add(&fast, "fast", None)?;
        ctx.add(&slow, "slow", Some(json!(100)))?;

        Ok(ModuleSpec::new()
            .reducer(|_| {
                reducer(|state, action| {
                    let seen = state
                        .as_ref()
                        .and_then(|s| s["ticks_seen"].as_i64())
                        .unwrap_or(0);
                    let seen = if action.is("counter/tick") { seen + 1 } else { seen };
                    json!({ "ticks_seen": seen })
                })
            })
            .selectors(
                Selectors::new()
                    .with("fast", |local| local["fast"].clone())
                    .with("slow", |local| local["slow"].clone()),
            )
            .routine(|scope| {
                RoutineFn::arc("summary", move |ctx: RoutineContext| {
                    let take = scope.take_local.clone();
                    let selectors = scope.selectors.clone();
                    async move {
                        let mut stream = ctx.actions();
                        loop {
                            take.take(&mut stream, "counter/tick").await?;
                            let state = ctx.state();
                            tracing::info!(
                                fast = %selectors.select("fast", &state).unwrap_or_default(),
                                slow = %selectors.select("slow", &state).unwrap_or_default(),
                                "dashboard"
                            );
                        }
                    }
                })
            }))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .init();

    let runtime = Runtime::new(Config::from_env()).with_listener(Arc::new(LogWriter::new()));
    let app = runtime.start(&dashboard(), "dashboard", None)?;
    println!("{}", app.registry().render_tree());

    runtime
        .run_until(&app, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    println!("final state: {}", app.state());
    Ok(())
}
