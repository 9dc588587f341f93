//! Session directory implementations.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "memory")]
pub use memory::{KernelScript, MemoryDirectory, MemoryKernel};
