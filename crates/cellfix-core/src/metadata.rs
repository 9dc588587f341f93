//! Metadata attached to cells inserted by remediation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ContentKind;

/// Cell metadata written at insertion time.
///
/// Only the trust flag is interpreted here; everything else is carried
/// through for the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellMetadata {
    /// Whether the cell content is trusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted: Option<bool>,

    /// Arbitrary metadata for host-specific needs.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl CellMetadata {
    /// Metadata for a programmatically produced cell of `kind`.
    ///
    /// Code cells are trusted; narrative cells carry no trust flag.
    #[must_use]
    pub fn for_inserted(kind: ContentKind) -> Self {
        Self {
            trusted: (kind == ContentKind::Code).then_some(true),
            extra: HashMap::new(),
        }
    }

    /// Whether the trust flag is set.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.trusted == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trust_follows_kind() {
        assert!(CellMetadata::for_inserted(ContentKind::Code).is_trusted());
        let narrative = CellMetadata::for_inserted(ContentKind::Narrative);
        assert!(!narrative.is_trusted());
        assert_eq!(serde_json::to_value(&narrative).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_extra_fields_flatten() {
        let meta: CellMetadata =
            serde_json::from_value(serde_json::json!({"trusted": true, "tags": ["remediation"]}))
                .unwrap();
        assert!(meta.is_trusted());
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["trusted"], true);
        assert_eq!(json["tags"][0], "remediation");
    }
}
