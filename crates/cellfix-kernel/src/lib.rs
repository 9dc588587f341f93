//! Execute-request correlation against a live compute session.
//!
//! Provides:
//! - `Correlator` - Submit remediation code and reduce the reply to one outcome
//! - `ExecutionOutcome` - Success value, error traceback or abort

pub mod correlator;
pub mod outcome;

pub use correlator::{Correlator, ExecuteError};
pub use outcome::ExecutionOutcome;
