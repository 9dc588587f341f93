//! Record of one control activation.

use cellfix_core::SessionId;
use cellfix_kernel::ExecutionOutcome;
use cellfix_notebook::PopulationStatus;
use serde::Serialize;

/// What one activation of a remediation control did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Session the code ran on.
    pub session: SessionId,
    /// `None` if the request never produced a reply.
    pub outcome: Option<ExecutionOutcome>,
    /// Index of the inserted cell, if one was inserted.
    pub inserted_at: Option<usize>,
    pub population: Option<PopulationStatus>,
}

impl ActivationReport {
    pub(crate) const fn abandoned(session: SessionId) -> Self {
        Self {
            session,
            outcome: None,
            inserted_at: None,
            population: None,
        }
    }

    /// Whether a cell was inserted and filled in.
    #[must_use]
    pub fn is_populated(&self) -> bool {
        self.population == Some(PopulationStatus::Populated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serialization() {
        let report = ActivationReport {
            session: SessionId::nil(),
            outcome: Some(ExecutionOutcome::Success { value: "42".into() }),
            inserted_at: Some(2),
            population: Some(PopulationStatus::Populated),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"]["outcome"], "success");
        assert_eq!(json["outcome"]["value"], "42");
        assert_eq!(json["population"], "populated");
        assert!(report.is_populated());
        assert!(!ActivationReport::abandoned(SessionId::nil()).is_populated());
    }
}
