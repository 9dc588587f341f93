//! Remediation configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::{ContentKind, PollPolicy, RemediationOption};

/// Placeholder remediation code shared by the built-in options.
const PLACEHOLDER_CODE: &str = "result=\"hello world\" \nprint(result)";

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// User expression evaluated with every remediation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpressionBinding {
    /// Key of the result in the reply's user expressions.
    pub name: String,
    /// Expression evaluated by the kernel.
    pub expr: String,
}

impl Default for ExpressionBinding {
    fn default() -> Self {
        Self {
            name: "output".into(),
            expr: "result".into(),
        }
    }
}

/// Host command run after a cell has been populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FollowOnCommand {
    pub command: String,
    pub args: Value,
}

impl Default for FollowOnCommand {
    fn default() -> Self {
        Self {
            command: "notebook:run-cell-and-select-next".into(),
            args: json!({ "toolbar": true }),
        }
    }
}

/// Remediation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemediationConfig {
    /// Output mime type that is offered remediation.
    pub error_mime_type: String,
    /// One control is rendered per option, in order.
    pub options: Vec<RemediationOption>,
    pub expression: ExpressionBinding,
    /// Budget for notebook and session lookups.
    pub session_poll: PollPolicy,
    /// Budget, in frames, for a new cell's editor to appear.
    pub editor_frames: u32,
    pub follow_on: FollowOnCommand,
    /// Styling classes passed to the host with each control.
    pub control_classes: Vec<String>,
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            error_mime_type: "application/vnd.jupyter.stderr".into(),
            options: vec![
                RemediationOption::new(ContentKind::Code, PLACEHOLDER_CODE, "Fix Error"),
                RemediationOption::new(
                    ContentKind::Narrative,
                    PLACEHOLDER_CODE,
                    "Show Error Explanation",
                ),
            ],
            expression: ExpressionBinding::default(),
            session_poll: PollPolicy::default(),
            editor_frames: 20,
            follow_on: FollowOnCommand::default(),
            control_classes: vec!["jp-Button".into(), "jp-mod-small".into()],
        }
    }
}

impl RemediationConfig {
    /// Parse and validate a JSON config.
    ///
    /// Missing fields take their defaults at every level, and unknown fields
    /// are rejected.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or the config is invalid.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Check the config's invariants.
    ///
    /// # Errors
    /// Returns error describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.options.is_empty() {
            return Err(ConfigError::Invalid("at least one option is required".into()));
        }
        if self.expression.name.is_empty() {
            return Err(ConfigError::Invalid("expression name is empty".into()));
        }
        if self.session_poll.max_attempts == 0 {
            return Err(ConfigError::Invalid("session_poll.max_attempts must be >= 1".into()));
        }
        if self.editor_frames == 0 {
            return Err(ConfigError::Invalid("editor_frames must be >= 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RemediationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.options.len(), 2);
        assert_eq!(config.options[0].kind, ContentKind::Code);
        assert_eq!(config.options[1].kind, ContentKind::Narrative);
        assert_eq!(config.options[0].code, config.options[1].code);
        assert_eq!(config.session_poll, PollPolicy::new(20, 50));
        assert_eq!(config.follow_on.args["toolbar"], true);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RemediationConfig::from_json_str(
            r#"{"editor_frames": 5, "options": [{"kind": "markdown", "code": "x", "label": "Explain"}]}"#,
        )
        .unwrap();
        assert_eq!(config.editor_frames, 5);
        assert_eq!(config.options[0].kind, ContentKind::Narrative);
        assert_eq!(config.error_mime_type, "application/vnd.jupyter.stderr");
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(matches!(
            RemediationConfig::from_json_str(r#"{"options": []}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RemediationConfig::from_json_str(r#"{"session_poll": {"max_attempts": 0, "interval_ms": 50}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RemediationConfig::from_json_str(r#"{"unknown": 1}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_partial_nested_objects_keep_defaults() {
        let config = RemediationConfig::from_json_str(
            r#"{"session_poll": {"max_attempts": 5}, "follow_on": {"command": "notebook:run-cell"}, "expression": {"expr": "answer"}}"#,
        )
        .unwrap();
        assert_eq!(config.session_poll, PollPolicy::new(5, 50));
        assert_eq!(config.follow_on.command, "notebook:run-cell");
        assert_eq!(config.follow_on.args["toolbar"], true);
        assert_eq!(config.expression.name, "output");
        assert_eq!(config.expression.expr, "answer");
    }

    #[test]
    fn test_rejects_unknown_nested_fields() {
        for json in [
            r#"{"follow_on": {"command": "x", "argz": {"toolbar": true}}}"#,
            r#"{"session_poll": {"max_attempts": 5, "interval": 10}}"#,
            r#"{"expression": {"nme": "output"}}"#,
            r#"{"options": [{"kind": "code", "code": "x", "label": "Fix", "lable": "Fix"}]}"#,
        ] {
            assert!(
                matches!(RemediationConfig::from_json_str(json), Err(ConfigError::Json(_))),
                "accepted {json}"
            );
        }
    }
}
