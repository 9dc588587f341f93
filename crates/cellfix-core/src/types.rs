//! Plain data shared by every remediation component.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Compute session (kernel) identifier.
pub type SessionId = Uuid;

/// Identity of a cell, stable for the lifetime of the cell.
pub type CellId = Uuid;

/// Kind of content unit a remediation result is inserted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Executable code cell.
    Code,
    /// Narrative (markdown) cell.
    #[serde(alias = "markdown")]
    Narrative,
}

impl ContentKind {
    /// The notebook format's `cell_type` for this kind.
    #[must_use]
    pub const fn cell_type(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Narrative => "markdown",
        }
    }
}

/// A remediation action offered next to an error output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemediationOption {
    /// Kind of cell the result is inserted as.
    pub kind: ContentKind,
    /// Code executed against the session.
    pub code: String,
    /// Control label.
    pub label: String,
}

impl RemediationOption {
    /// Create a new option.
    #[must_use]
    pub fn new(kind: ContentKind, code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            label: label.into(),
        }
    }
}

/// A running session as reported by the session directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionModel {
    /// Session identifier.
    pub id: SessionId,
    /// Kernel name (e.g. `python3`).
    pub name: String,
}

/// Rendering description of a remediation control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSpec {
    /// Text shown on the control.
    pub label: String,
    /// Host styling classes.
    #[serde(default)]
    pub classes: Vec<String>,
}
