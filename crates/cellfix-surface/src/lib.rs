//! Remediation controls for error outputs.
//!
//! Provides:
//! - `Remediator` - Decide eligibility, render controls, run the activation pipeline
//! - `ActivationReport` - What one activation did

pub mod remediator;
pub mod report;

pub use remediator::Remediator;
pub use report::ActivationReport;
