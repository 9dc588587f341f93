//! In-memory session directory and scripted kernels.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use cellfix_core::{
    ComputeSession, ExecuteHandle, ExecuteReply, ExecuteRequest, HostError, IopubMessage,
    SessionDirectory, SessionId, SessionModel, UserExpressionResult,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// How a [`MemoryKernel`] answers an execute request.
#[derive(Debug, Clone)]
pub enum KernelScript {
    /// Succeed, reporting this text for every requested user expression.
    Value(String),
    /// Answer with a fixed reply.
    Reply(ExecuteReply),
    /// Drop the request without replying.
    Hangup,
}

/// Scripted kernel.
///
/// Useful for development and tests. Nothing is actually executed.
pub struct MemoryKernel {
    model: SessionModel,
    script: KernelScript,
    queued: Mutex<VecDeque<KernelScript>>,
    requests: Mutex<Vec<ExecuteRequest>>,
}

impl MemoryKernel {
    /// Create a kernel that answers every request with `script`.
    #[must_use]
    pub fn new(name: impl Into<String>, script: KernelScript) -> Arc<Self> {
        Arc::new(Self {
            model: SessionModel {
                id: Uuid::new_v4(),
                name: name.into(),
            },
            script,
            queued: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Directory listing entry for this kernel.
    #[must_use]
    pub fn model(&self) -> SessionModel {
        self.model.clone()
    }

    /// Answer the next request with `script`, then fall back to the default.
    pub fn queue(&self, script: KernelScript) {
        lock(&self.queued).push_back(script);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ExecuteRequest> {
        lock(&self.requests).clone()
    }

    fn next_script(&self) -> KernelScript {
        lock(&self.queued)
            .pop_front()
            .unwrap_or_else(|| self.script.clone())
    }
}

#[async_trait]
impl ComputeSession for MemoryKernel {
    fn id(&self) -> SessionId {
        self.model.id
    }

    async fn request_execute(&self, request: ExecuteRequest) -> Result<ExecuteHandle, HostError> {
        let script = self.next_script();
        let (iopub_tx, iopub) = mpsc::unbounded_channel();
        let (done_tx, done) = oneshot::channel();

        let reply = match script {
            KernelScript::Value(value) => Some(ExecuteReply::Ok {
                execution_count: u32::try_from(lock(&self.requests).len() + 1).ok(),
                user_expressions: request
                    .user_expressions
                    .keys()
                    .map(|name| (name.clone(), UserExpressionResult::text(value.clone())))
                    .collect(),
            }),
            KernelScript::Reply(reply) => Some(reply),
            KernelScript::Hangup => None,
        };
        lock(&self.requests).push(request);

        let _ = iopub_tx.send(IopubMessage::new("status", json!({ "execution_state": "busy" })));
        if let Some(ExecuteReply::Error {
            ename,
            evalue,
            traceback,
        }) = &reply
        {
            let _ = iopub_tx.send(IopubMessage::new(
                "error",
                json!({ "ename": ename, "evalue": evalue, "traceback": traceback }),
            ));
        }
        let _ = iopub_tx.send(IopubMessage::new("status", json!({ "execution_state": "idle" })));

        if let Some(reply) = reply {
            let _ = done_tx.send(reply);
        }
        Ok(ExecuteHandle { iopub, done })
    }
}

/// In-memory session directory.
///
/// Lists kernels in the order they were added.
#[derive(Default)]
pub struct MemoryDirectory {
    kernels: RwLock<Vec<Arc<MemoryKernel>>>,
    listings: AtomicUsize,
    connects: AtomicUsize,
}

impl MemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a running kernel.
    pub fn add(&self, kernel: Arc<MemoryKernel>) {
        self.kernels
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(kernel);
    }

    /// Shut a kernel down.
    pub fn remove(&self, id: SessionId) {
        self.kernels
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .retain(|k| k.model.id != id);
    }

    /// Number of `running` calls so far.
    #[must_use]
    pub fn listing_count(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    /// Number of `connect` calls so far.
    #[must_use]
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionDirectory for MemoryDirectory {
    async fn ready(&self) -> Result<(), HostError> {
        Ok(())
    }

    async fn running(&self) -> Result<Vec<SessionModel>, HostError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .kernels
            .read()
            .map_err(|e| HostError::Internal(e.to_string()))?
            .iter()
            .map(|k| k.model())
            .collect())
    }

    async fn connect(&self, id: SessionId) -> Result<Arc<dyn ComputeSession>, HostError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let kernels = self
            .kernels
            .read()
            .map_err(|e| HostError::Internal(e.to_string()))?;
        let kernel = kernels
            .iter()
            .find(|k| k.model.id == id)
            .ok_or(HostError::SessionNotFound(id))?;
        Ok(Arc::clone(kernel) as Arc<dyn ComputeSession>)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
