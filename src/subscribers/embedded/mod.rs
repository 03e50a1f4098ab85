//! # Built-in listeners
//!
//! - [`LogWriter`]: logs applied actions through `tracing` (demo/debug).

mod log;

pub use log::LogWriter;
