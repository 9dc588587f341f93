//! Execute-request correlation.

use cellfix_core::{
    ComputeSession, ExecuteHandle, ExecuteRequest, ExpressionBinding, HostError, IopubMessage,
    RemediationOption, SessionId,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::{Stream, StreamExt, wrappers::UnboundedReceiverStream};

use crate::ExecutionOutcome;

/// Correlation error.
///
/// Only raised when no reply can exist; remote failures are outcomes.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("Submit failed: {0}")]
    Submit(#[from] HostError),
    #[error("Session dropped the request before replying")]
    ReplyDropped,
}

/// Submits remediation code and reduces the reply stream to one outcome.
#[derive(Debug, Clone, Default)]
pub struct Correlator {
    expression: ExpressionBinding,
}

impl Correlator {
    /// Create a correlator that evaluates `expression` with every request.
    #[must_use]
    pub const fn new(expression: ExpressionBinding) -> Self {
        Self { expression }
    }

    /// Build the execute request for an option.
    #[must_use]
    pub fn request_for(&self, option: &RemediationOption) -> ExecuteRequest {
        ExecuteRequest::new(option.code.clone())
            .with_user_expression(self.expression.name.clone(), self.expression.expr.clone())
    }

    /// Run `option` once on `session` and wait for its terminal reply.
    ///
    /// Intermediate messages are only logged. Not retried.
    ///
    /// # Errors
    /// Returns error if the request could not be submitted or the session
    /// dropped it without a reply.
    pub async fn execute(
        &self,
        session: &dyn ComputeSession,
        option: &RemediationOption,
    ) -> Result<ExecutionOutcome, ExecuteError> {
        let session_id = session.id();
        tracing::info!(session = %session_id, label = %option.label, "Submitting remediation code");

        let ExecuteHandle { iopub, done } = session.request_execute(self.request_for(option)).await?;
        spawn_iopub_logger(session_id, iopub);

        let reply = done.await.map_err(|_| ExecuteError::ReplyDropped)?;
        tracing::debug!(session = %session_id, status = reply.status(), "Execute reply");

        let outcome = ExecutionOutcome::from_reply(&reply, &self.expression.name);
        match &outcome {
            ExecutionOutcome::Error { traceback } => {
                tracing::warn!(session = %session_id, "Remediation code raised:\n{traceback}");
            }
            ExecutionOutcome::Aborted => {
                tracing::warn!(session = %session_id, "Remediation code aborted");
            }
            ExecutionOutcome::Success { .. } => {}
        }
        Ok(outcome)
    }
}

/// Iopub messages worth logging: everything except kernel status updates.
fn loggable(iopub: mpsc::UnboundedReceiver<IopubMessage>) -> impl Stream<Item = IopubMessage> {
    UnboundedReceiverStream::new(iopub).filter(|msg| !msg.is_status())
}

/// Ends once the session closes the iopub sender.
fn spawn_iopub_logger(
    session_id: SessionId,
    iopub: mpsc::UnboundedReceiver<IopubMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut messages = std::pin::pin!(loggable(iopub));
        while let Some(msg) = messages.next().await {
            tracing::debug!(session = %session_id, msg_type = %msg.msg_type, content = %msg.content, "iopub");
        }
    })
}
