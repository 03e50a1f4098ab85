//! # Module factory.
//!
//! A [`ModuleFactory`] wraps a module's setup closure. Instantiating it builds
//! a [`ModuleRecord`]:
//!
//! ```text
//! instantiate(registry, mount, initial_state)
//!   1. id        = ModuleId::next()
//!   2. accessor  = mount.accessor()           (Nested inherits, Key derives, Unmounted = identity)
//!   3. ctx       = ModuleContext(id, accessor, initial_state)
//!   4. spec      = setup(&ctx)?               (children added here)
//!   5. actions   = scope_actions(spec.actions, id)
//!      selectors = scope_selectors(spec.selectors, accessor)
//!      reducer   = compose_reducer(scope_reducer(own), children, mount, root)?
//!      routine   = compose_routine(own routine, children routines, policy)
//!      view      = view_init(ViewScope)
//!   6. record
//!   on error: children registered in step 4 are discarded
//! ```
//!
//! The caller mounts the record: [`ModuleContext::add`](crate::ModuleContext::add)
//! registers children under their parent, [`ModuleFactory::instantiate_root`]
//! registers a top-level module, and [`Runtime`](crate::Runtime) builds the
//! store and runs the routine.

use std::sync::Arc;

use serde_json::Value;

use crate::actions::{TakeLocal, scope_actions};
use crate::core::{ChildReducers, ReducerParts, Registry, compose_reducer, scope_reducer};
use crate::error::ModuleError;
use crate::identity::ModuleId;
use crate::module::context::ModuleContext;
use crate::module::mount::Mount;
use crate::module::record::ModuleRecord;
use crate::module::spec::{ModuleSpec, RoutineScope, ViewScope};
use crate::routines::{RoutineRef, compose_routine};
use crate::state::scope_selectors;

type Setup = dyn Fn(&ModuleContext) -> Result<ModuleSpec, ModuleError> + Send + Sync;

/// Reusable module definition.
///
/// ## Example
/// ```rust
/// use modtree::{ModuleFactory, ModuleSpec, Registry, reducer};
/// use serde_json::json;
///
/// let counter = ModuleFactory::new(|_ctx| {
///     Ok(ModuleSpec::new().reducer(|_| reducer(|state, _| state.unwrap_or(json!(0)))))
/// });
///
/// let registry = Registry::new();
/// let root = counter.instantiate_root(&registry, "counter", None).unwrap();
/// assert_eq!(root.mount(), Some("counter"));
/// assert_eq!((root.reducer())(None, &modtree::Action::init()), json!({ "counter": 0 }));
/// ```
#[derive(Clone)]
pub struct ModuleFactory {
    setup: Arc<Setup>,
}

impl ModuleFactory {
    /// Creates a factory from a setup closure.
    pub fn new<F>(setup: F) -> Self
    where
        F: Fn(&ModuleContext) -> Result<ModuleSpec, ModuleError> + Send + Sync + 'static,
    {
        Self {
            setup: Arc::new(setup),
        }
    }

    /// Builds a module that is not created through a parent's context.
    ///
    /// It is the application root if `registry` is still empty. The record is
    /// not registered; see [`instantiate_root`](Self::instantiate_root).
    pub fn instantiate(
        &self,
        registry: &Arc<Registry>,
        mount: impl Into<Mount>,
        initial_state: Option<Value>,
    ) -> Result<Arc<ModuleRecord>, ModuleError> {
        let root = registry.is_empty();
        self.build(registry, mount.into(), initial_state, root)
    }

    /// Builds a module and registers it as a top-level module (no parent).
    pub fn instantiate_root(
        &self,
        registry: &Arc<Registry>,
        mount: impl Into<Mount>,
        initial_state: Option<Value>,
    ) -> Result<Arc<ModuleRecord>, ModuleError> {
        let record = self.instantiate(registry, mount, initial_state)?;
        registry.register(None, Arc::clone(&record), record.mount())?;
        Ok(record)
    }

    /// Builds one module. On failure, children it already registered are
    /// discarded so the registry only ever holds complete subtrees.
    pub(crate) fn build(
        &self,
        registry: &Arc<Registry>,
        mount: Mount,
        initial_state: Option<Value>,
        root: bool,
    ) -> Result<Arc<ModuleRecord>, ModuleError> {
        let id = ModuleId::next();
        self.assemble(id, registry, mount, initial_state, root)
            .inspect_err(|err| {
                let discarded = registry.discard_descendants(id);
                tracing::debug!(module = %id, discarded, error = %err, "module build failed");
            })
    }

    fn assemble(
        &self,
        id: ModuleId,
        registry: &Arc<Registry>,
        mount: Mount,
        initial_state: Option<Value>,
        root: bool,
    ) -> Result<Arc<ModuleRecord>, ModuleError> {
        let accessor = mount.accessor();
        let key = mount.key().map(str::to_string);
        let children = ChildReducers::new();
        let ctx = ModuleContext::new(
            id,
            Arc::clone(registry),
            accessor.clone(),
            initial_state.clone(),
            Arc::clone(&children),
        );

        let spec = (self.setup)(&ctx)?;
        tracing::debug!(
            module = %id,
            mount = ?key,
            root,
            children = children.len(),
            own_reducer = spec.has_reducer(),
            own_routine = spec.has_routine(),
            "building module"
        );

        let actions = scope_actions(&spec.actions, id);
        let selectors = scope_selectors(&spec.selectors, &accessor);

        let own = spec
            .reducer
            .map(|init| scope_reducer(init(initial_state), id, registry.ancestry()));
        let reducer = compose_reducer(ReducerParts {
            own,
            children: &children,
            mount: key.as_deref(),
            root,
        })?;

        let own_routine = spec.routine.map(|init| {
            init(RoutineScope {
                module: id,
                actions: actions.clone(),
                selectors: selectors.clone(),
                take_local: TakeLocal::new(id, registry.ancestry()),
            })
        });
        let child_routines: Vec<RoutineRef> = registry
            .children(id)
            .into_values()
            .map(|child| Arc::clone(child.routine()))
            .collect();
        let group = match &key {
            Some(key) => format!("{key}#{id}"),
            None => format!("module#{id}"),
        };
        let routine = compose_routine(group, own_routine, child_routines, registry.failure_policy());

        let view = spec.view.map(|init| {
            init(ViewScope {
                module: id,
                actions: actions.clone(),
                selectors: selectors.clone(),
                accessor: accessor.clone(),
            })
        });

        Ok(Arc::new(ModuleRecord {
            id,
            reducer,
            routine,
            actions,
            selectors,
            view,
            mount: key,
            accessor,
        }))
    }
}

impl std::fmt::Debug for ModuleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleFactory").finish_non_exhaustive()
    }
}
