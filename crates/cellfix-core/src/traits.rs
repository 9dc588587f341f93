//! Host collaborator traits.
//!
//! The notebook UI, the kernel transport and the render loop are owned by the
//! host. Remediation only needs the narrow surface described here.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    CellMetadata, ContentKind, ControlSpec,
    message::{ExecuteReply, ExecuteRequest, IopubMessage},
    types::{CellId, SessionId, SessionModel},
};

/// Host collaborator error.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("Cell index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Host error: {0}")]
    Internal(String),
}

/// Directory of running compute sessions.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Resolves once the directory has its first listing.
    async fn ready(&self) -> Result<(), HostError>;

    /// Currently running sessions, in listing order.
    async fn running(&self) -> Result<Vec<SessionModel>, HostError>;

    /// Open a new connection to a running session.
    async fn connect(&self, id: SessionId) -> Result<Arc<dyn ComputeSession>, HostError>;
}

/// In-flight execute request.
pub struct ExecuteHandle {
    /// Intermediate messages published while the request runs.
    ///
    /// The session must drop the sender once the request is idle; the
    /// consumer drains this channel until it closes.
    pub iopub: mpsc::UnboundedReceiver<IopubMessage>,
    /// Terminal reply.
    pub done: oneshot::Receiver<ExecuteReply>,
}

/// A live compute session (kernel connection).
#[async_trait]
pub trait ComputeSession: Send + Sync {
    /// Session identifier.
    fn id(&self) -> SessionId;

    /// Submit an execute request.
    async fn request_execute(&self, request: ExecuteRequest) -> Result<ExecuteHandle, HostError>;
}

/// Text editing surface of a cell.
pub trait TextEditor: Send + Sync {
    /// Replace the whole document.
    fn set_text(&self, text: &str);

    /// Current document text.
    fn text(&self) -> String;

    /// Give the editor input focus.
    fn focus(&self);
}

/// A cell in a notebook.
pub trait Cell: Send + Sync {
    fn id(&self) -> CellId;

    fn kind(&self) -> ContentKind;

    fn metadata(&self) -> CellMetadata;

    /// The editor, once the host has rendered one.
    fn editor(&self) -> Option<Arc<dyn TextEditor>>;
}

/// A notebook document.
pub trait Notebook: Send + Sync {
    /// Cells in document order.
    fn cells(&self) -> Vec<Arc<dyn Cell>>;

    /// Cell at `index`.
    fn cell_at(&self, index: usize) -> Option<Arc<dyn Cell>>;

    /// Insert a new, empty cell at `index`.
    ///
    /// # Errors
    /// Returns error if `index` is past the end of the notebook.
    fn insert_cell(
        &self,
        index: usize,
        kind: ContentKind,
        metadata: CellMetadata,
    ) -> Result<(), HostError>;

    /// Session attached to the notebook's active editing context, if any.
    fn session(&self) -> Option<Arc<dyn ComputeSession>>;
}

/// Handler invoked by the host each time a control is activated.
pub type Activation = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A rendered output area.
pub trait RenderedOutput: Send + Sync {
    /// Cell containing this output.
    fn containing_cell(&self) -> Option<CellId>;

    /// Notebook containing this output, once attached.
    fn notebook(&self) -> Option<Arc<dyn Notebook>>;

    /// Render a control below the output.
    fn append_control(&self, spec: ControlSpec, on_activate: Activation);
}

/// Host command registry.
pub trait CommandRegistry: Send + Sync {
    /// Execute a named command.
    ///
    /// # Errors
    /// Returns error if the command is unknown or fails.
    fn execute(&self, command: &str, args: &Value) -> Result<(), HostError>;
}

/// Callback run on a later frame.
pub type FrameCallback = Box<dyn FnOnce() + Send + 'static>;

/// Host render loop.
pub trait FrameScheduler: Send + Sync {
    /// Run `callback` after the next render pass.
    fn request_frame(&self, callback: FrameCallback);
}
