//! # Module record: the composed, scoped pieces of one module instance.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::actions::ActionCreators;
use crate::identity::ModuleId;
use crate::module::spec::View;
use crate::routines::RoutineRef;
use crate::state::{LocalAccessor, Reducer, Selectors};

/// One instantiated module.
///
/// Records are built by [`ModuleFactory`](crate::ModuleFactory) and owned by
/// the [`Registry`](crate::Registry) for the rest of the process; they are
/// never torn down.
pub struct ModuleRecord {
    pub(crate) id: ModuleId,
    pub(crate) reducer: Reducer,
    pub(crate) routine: RoutineRef,
    pub(crate) actions: ActionCreators,
    pub(crate) selectors: Selectors,
    pub(crate) view: Option<View>,
    pub(crate) mount: Option<String>,
    pub(crate) accessor: LocalAccessor,
}

impl ModuleRecord {
    /// Module identity.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Composed reducer (own fields plus current children).
    pub fn reducer(&self) -> &Reducer {
        &self.reducer
    }

    /// Supervised routine running the module's own routine and its children's.
    pub fn routine(&self) -> &RoutineRef {
        &self.routine
    }

    /// Scoped action creators.
    pub fn actions(&self) -> &ActionCreators {
        &self.actions
    }

    /// Scoped selectors.
    pub fn selectors(&self) -> &Selectors {
        &self.selectors
    }

    /// Type-erased view, if the module declared one.
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    /// The view downcast to `T`.
    pub fn view_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.view.clone()?.downcast::<T>().ok()
    }

    /// Mount name (`None` for unmounted modules).
    pub fn mount(&self) -> Option<&str> {
        self.mount.as_deref()
    }

    /// Accessor from the global state to this module's slice.
    pub fn accessor(&self) -> &LocalAccessor {
        &self.accessor
    }

    /// A record with no state, no routine and nothing scoped.
    #[cfg(test)]
    pub(crate) fn bare(id: ModuleId) -> Self {
        use crate::config::FailurePolicy;
        use crate::routines::compose_routine;

        Self {
            id,
            reducer: crate::state::reducer(|state, _| {
                state.unwrap_or_else(|| serde_json::Value::Object(Default::default()))
            }),
            routine: compose_routine(format!("bare#{id}"), None, Vec::new(), FailurePolicy::Isolate),
            actions: ActionCreators::new(),
            selectors: Selectors::new(),
            view: None,
            mount: None,
            accessor: LocalAccessor::root(),
        }
    }
}

impl fmt::Debug for ModuleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRecord")
            .field("id", &self.id)
            .field("mount", &self.mount)
            .field("accessor", &self.accessor)
            .field("routine", &self.routine.name())
            .field("actions", &self.actions)
            .field("selectors", &self.selectors)
            .field("view", &self.view.is_some())
            .finish()
    }
}
