//! # Child-registration context.
//!
//! A [`ModuleContext`] is handed to a module's setup closure. It is bound to
//! the module's identity and accessor, and lets the module instantiate and
//! look up its children by mount key.
//!
//! ## Registration flow
//! ```text
//! ctx.add(factory, "b", initial)
//!   ├─► factory builds the child (non-root, Mount::Nested)
//!   ├─► registry.register(Some(ctx.id), child, "b")
//!   └─► children cell refreshed ─► parent's reducer sees "b" on next dispatch
//! ```
//!
//! The context is a cheap `Clone`. A retained context can add children after
//! the module has been wired into a store; their reducers become visible on
//! the next dispatch. Their routines are not started automatically: run the
//! returned record's routine from one of the module's own routines.

use std::sync::Arc;

use serde_json::Value;

use crate::actions::ActionCreators;
use crate::core::{ChildReducers, Registry};
use crate::error::ModuleError;
use crate::identity::ModuleId;
use crate::module::factory::ModuleFactory;
use crate::module::mount::Mount;
use crate::module::record::ModuleRecord;
use crate::module::spec::View;
use crate::routines::RoutineRef;
use crate::state::{LocalAccessor, Selectors};

struct ContextInner {
    id: ModuleId,
    registry: Arc<Registry>,
    accessor: LocalAccessor,
    initial_state: Option<Value>,
    children: Arc<ChildReducers>,
}

/// Handle bound to one module under construction.
#[derive(Clone)]
pub struct ModuleContext {
    inner: Arc<ContextInner>,
}

impl ModuleContext {
    pub(crate) fn new(
        id: ModuleId,
        registry: Arc<Registry>,
        accessor: LocalAccessor,
        initial_state: Option<Value>,
        children: Arc<ChildReducers>,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                id,
                registry,
                accessor,
                initial_state,
                children,
            }),
        }
    }

    /// Identity of the module this context belongs to.
    pub fn id(&self) -> ModuleId {
        self.inner.id
    }

    /// Accessor from the global state to this module's slice.
    pub fn accessor(&self) -> &LocalAccessor {
        &self.inner.accessor
    }

    /// The registry the module is being built in.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Instantiates `factory` as a child mounted at `key` and registers it.
    ///
    /// Mounting a second child at the same key replaces the first one in this
    /// module's state.
    pub fn add(
        &self,
        factory: &ModuleFactory,
        key: &str,
        initial_state: Option<Value>,
    ) -> Result<Arc<ModuleRecord>, ModuleError> {
        let mount = Mount::nested(&self.inner.accessor, key);
        let record = factory.build(&self.inner.registry, mount, initial_state, false)?;
        self.inner
            .registry
            .register(Some(self.inner.id), Arc::clone(&record), Some(key))?;
        self.inner.children.insert(key, Arc::clone(record.reducer()));
        Ok(record)
    }

    /// The child mounted at `key`.
    pub fn get(&self, key: &str) -> Result<Arc<ModuleRecord>, ModuleError> {
        self.inner.registry.child(self.inner.id, key)
    }

    /// Scoped action creators of the child mounted at `key`.
    pub fn actions(&self, key: &str) -> Result<ActionCreators, ModuleError> {
        Ok(self.get(key)?.actions().clone())
    }

    /// Scoped selectors of the child mounted at `key`.
    pub fn selectors(&self, key: &str) -> Result<Selectors, ModuleError> {
        Ok(self.get(key)?.selectors().clone())
    }

    /// View of the child mounted at `key` (`None` if it declared none).
    pub fn view(&self, key: &str) -> Result<Option<View>, ModuleError> {
        Ok(self.get(key)?.view().cloned())
    }

    /// Supervised routine of the child mounted at `key`.
    pub fn routine(&self, key: &str) -> Result<RoutineRef, ModuleError> {
        Ok(Arc::clone(self.get(key)?.routine()))
    }

    /// Mount keys of the children added so far.
    pub fn children(&self) -> Vec<String> {
        self.inner.children.mounts()
    }

    /// The initial state the module was instantiated with, or `default`.
    pub fn initial_state(&self, default: Value) -> Value {
        self.inner.initial_state.clone().unwrap_or(default)
    }
}

impl std::fmt::Debug for ModuleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleContext")
            .field("id", &self.inner.id)
            .field("accessor", &self.inner.accessor)
            .field("children", &self.children())
            .finish_non_exhaustive()
    }
}
