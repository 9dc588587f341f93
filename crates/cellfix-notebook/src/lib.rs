//! Cell insertion and content injection after notebook outputs.
//!
//! Provides:
//! - `CellInjector` - Insert a cell after an output and populate it once its editor exists
//! - In-memory notebook, render loop and command registry (feature: memory)

pub mod injector;

#[cfg(feature = "memory")]
pub mod memory;

pub use injector::{CellInjector, Population, PopulationStatus};
