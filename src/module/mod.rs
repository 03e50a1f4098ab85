//! Module definition and instantiation.
//!
//! ## Contents
//! - [`ModuleFactory`] wraps a setup closure; instantiates records
//! - [`ModuleContext`] child registration and lookup during setup
//! - [`ModuleSpec`], [`RoutineScope`], [`ViewScope`] what setup returns / initializers receive
//! - [`ModuleRecord`] the composed, scoped module
//! - [`Mount`] where a module's state lives

mod context;
mod factory;
mod mount;
mod record;
mod spec;


pub use context::ModuleContext;
pub use factory::ModuleFactory;
pub use mount::Mount;
pub use record::ModuleRecord;
pub use spec::{ModuleSpec, RoutineScope, View, ViewScope};
