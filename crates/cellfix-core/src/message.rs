//! Kernel execute request/reply messages.
//!
//! Field names and status tags follow the Jupyter messaging protocol so a host
//! transport can (de)serialize these directly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `execute_request` content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
    pub silent: bool,
    pub store_history: bool,
    /// Expressions evaluated after the code runs, keyed by result name.
    pub user_expressions: HashMap<String, String>,
    pub allow_stdin: bool,
    pub stop_on_error: bool,
}

impl ExecuteRequest {
    /// Create a request with protocol defaults and no user expressions.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            silent: false,
            store_history: true,
            user_expressions: HashMap::new(),
            allow_stdin: false,
            stop_on_error: true,
        }
    }

    /// Add a named user expression.
    #[must_use]
    pub fn with_user_expression(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.user_expressions.insert(name.into(), expr.into());
        self
    }
}

/// Result of evaluating one user expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UserExpressionResult {
    Ok {
        /// Mime bundle of the evaluated value.
        #[serde(default)]
        data: HashMap<String, Value>,
        #[serde(default)]
        metadata: Map<String, Value>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl UserExpressionResult {
    /// Successful result with a `text/plain` representation.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Ok {
            data: HashMap::from([("text/plain".to_string(), Value::String(value.into()))]),
            metadata: Map::new(),
        }
    }

    /// The `text/plain` representation, if this result carries a value.
    #[must_use]
    pub fn text_plain(&self) -> Option<&str> {
        match self {
            Self::Ok { data, .. } => data.get("text/plain").and_then(Value::as_str),
            Self::Error { .. } => None,
        }
    }
}

/// `execute_reply` content, the terminal message of an execute request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecuteReply {
    Ok {
        #[serde(default)]
        execution_count: Option<u32>,
        #[serde(default)]
        user_expressions: HashMap<String, UserExpressionResult>,
    },
    Error {
        #[serde(default)]
        ename: String,
        #[serde(default)]
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
    #[serde(alias = "aborted")]
    Abort {},
}

impl ExecuteReply {
    /// Protocol status string.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Ok { .. } => "ok",
            Self::Error { .. } => "error",
            Self::Abort {} => "abort",
        }
    }
}

/// A message published on the session's broadcast channel while a request runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IopubMessage {
    /// Protocol message type (`status`, `stream`, `error`, ...).
    pub msg_type: String,
    #[serde(default)]
    pub content: Value,
}

impl IopubMessage {
    /// Create a new message.
    #[must_use]
    pub fn new(msg_type: impl Into<String>, content: Value) -> Self {
        Self {
            msg_type: msg_type.into(),
            content,
        }
    }

    /// Kernel busy/idle notification.
    #[must_use]
    pub fn is_status(&self) -> bool {
        self.msg_type == "status"
    }
}
