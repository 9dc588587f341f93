//! Compute session discovery and binding for notebook outputs.
//!
//! Provides:
//! - `SessionBinder` - Find the session an output should run remediation on
//! - In-memory session directory and scripted kernel (feature: memory)

pub mod binder;
pub mod directory;

pub use binder::{Binding, BindingSource, SessionBinder};
