//! Reduced result of one execute request.

use cellfix_core::{ExecuteReply, UserExpressionResult};
use serde::{Deserialize, Serialize};

/// Outcome of a remediation execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExecutionOutcome {
    /// Code ran; `value` is the named expression's text representation.
    Success { value: String },
    /// Code raised; traceback lines joined with newlines.
    Error { traceback: String },
    /// Execution was aborted by the kernel.
    Aborted,
}

impl ExecutionOutcome {
    /// Reduce a terminal reply, reading the value from user expression `name`.
    ///
    /// A successful reply without a text value for `name` yields an empty value.
    #[must_use]
    pub fn from_reply(reply: &ExecuteReply, name: &str) -> Self {
        match reply {
            ExecuteReply::Ok {
                user_expressions, ..
            } => {
                let value = user_expressions.get(name).and_then(UserExpressionResult::text_plain);
                if value.is_none() {
                    tracing::warn!(expression = name, "Reply has no value for expression");
                }
                Self::Success {
                    value: value.unwrap_or_default().to_string(),
                }
            }
            ExecuteReply::Error { traceback, .. } => Self::Error {
                traceback: traceback.join("\n"),
            },
            ExecuteReply::Abort {} => Self::Aborted,
        }
    }

    /// Value inserted into the new cell. Empty unless the execution succeeded.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Success { value } => value,
            Self::Error { .. } | Self::Aborted => "",
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn ok_reply(expressions: &[(&str, UserExpressionResult)]) -> ExecuteReply {
        ExecuteReply::Ok {
            execution_count: Some(1),
            user_expressions: expressions
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_error_joins_traceback() {
        let reply = ExecuteReply::Error {
            ename: "ValueError".into(),
            evalue: "bad".into(),
            traceback: vec!["A".into(), "B".into()],
        };
        let outcome = ExecutionOutcome::from_reply(&reply, "output");
        assert_eq!(
            outcome,
            ExecutionOutcome::Error {
                traceback: "A\nB".into()
            }
        );
        assert_eq!(outcome.value(), "");
    }

    #[test]
    fn test_abort() {
        let outcome = ExecutionOutcome::from_reply(&ExecuteReply::Abort {}, "output");
        assert_eq!(outcome, ExecutionOutcome::Aborted);
        assert_eq!(outcome.value(), "");
    }

    #[test]
    fn test_success_reads_named_expression() {
        let reply = ok_reply(&[("result", UserExpressionResult::text("42"))]);
        assert_eq!(
            ExecutionOutcome::from_reply(&reply, "result"),
            ExecutionOutcome::Success { value: "42".into() }
        );
    }

    #[test]
    fn test_success_without_named_expression_is_empty() {
        let missing = ok_reply(&[]);
        assert_eq!(
            ExecutionOutcome::from_reply(&missing, "result"),
            ExecutionOutcome::Success {
                value: String::new()
            }
        );

        let failed_expr = ok_reply(&[(
            "result",
            UserExpressionResult::Error {
                ename: "NameError".into(),
                evalue: "name 'result' is not defined".into(),
                traceback: vec![],
            },
        )]);
        let outcome = ExecutionOutcome::from_reply(&failed_expr, "result");
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), "");
    }
}
