//! Composition core: the module registry, ancestry, reducer composition and
//! the application runtime.
//!
//! Internal modules:
//! - `ancestry`: parent edges and the positive-answer cache;
//! - `registry`: module records indexed by identity and by mount name;
//! - `compose`: event-scoped own reducers and the composition decision table;
//! - `runtime`: bootstrap, store wiring and graceful shutdown;
//! - `shutdown`: cross-platform termination signal handling.

mod ancestry;
mod compose;
mod registry;
mod runtime;
mod shutdown;

pub use ancestry::Ancestry;
pub use compose::{ChildReducers, ReducerParts, compose_reducer, scope_reducer};
pub use registry::{ModuleEntry, Registry, RegistrySnapshot};
pub use runtime::{App, Runtime};
