//! State: reducers, the combination primitive, accessors and selectors.
//!
//! State is a `serde_json::Value`; a module's mounted slice is addressed by a
//! [`LocalAccessor`]. The reducer composition algorithm that builds on these
//! pieces lives in `core::compose`.

mod accessor;
mod reducer;
mod selectors;

pub use accessor::LocalAccessor;
pub(crate) use reducer::combine_step;
pub use reducer::{Reducer, combine_reducers, reducer};
pub use selectors::{Selector, Selectors, scope_selectors};
