//! Session binding for rendered outputs.

use std::{future::ready, sync::Arc};

use cellfix_core::{ComputeSession, Notebook, RenderedOutput, Resolver, SessionDirectory};

/// Where a binding's session came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource {
    /// The session already attached to the output's notebook.
    Notebook,
    /// A fresh connection to the first running session.
    Fallback,
}

/// A notebook together with the one session remediation runs on.
#[derive(Clone)]
pub struct Binding {
    pub notebook: Arc<dyn Notebook>,
    pub session: Arc<dyn ComputeSession>,
    pub source: BindingSource,
}

/// Finds the session an output's remediation should run on.
///
/// Holds the long-lived session directory; never re-creates it per call.
#[derive(Clone)]
pub struct SessionBinder {
    directory: Arc<dyn SessionDirectory>,
    resolver: Resolver,
}

impl SessionBinder {
    /// Create a new binder.
    #[must_use]
    pub fn new(directory: Arc<dyn SessionDirectory>, resolver: Resolver) -> Self {
        Self {
            directory,
            resolver,
        }
    }

    /// Bind `output` to its notebook and a session.
    ///
    /// Prefers the session already attached to the notebook, falling back to
    /// a new connection to the first running session. Returns `None` when
    /// nothing is running, the output never joins a notebook, or the fallback
    /// connection fails.
    pub async fn bind(&self, output: &dyn RenderedOutput) -> Option<Binding> {
        if let Err(e) = self.directory.ready().await {
            tracing::warn!("Session directory not ready: {e}");
            return None;
        }
        let running = match self.directory.running().await {
            Ok(running) => running,
            Err(e) => {
                tracing::warn!("Failed to list sessions: {e}");
                return None;
            }
        };
        let Some(first) = running.first() else {
            tracing::info!("No running session");
            return None;
        };

        let Some(notebook) = self
            .resolver
            .resolve("notebook", || ready(output.notebook()))
            .await
        else {
            tracing::info!("Output is not attached to a notebook");
            return None;
        };

        if let Some(session) = self
            .resolver
            .resolve("notebook session", || ready(notebook.session()))
            .await
        {
            tracing::debug!(session = %session.id(), "Bound to notebook session");
            return Some(Binding {
                notebook,
                session,
                source: BindingSource::Notebook,
            });
        }

        tracing::info!(session = %first.id, kernel = %first.name, "No session on notebook, connecting to first running session");
        match self.directory.connect(first.id).await {
            Ok(session) => Some(Binding {
                notebook,
                session,
                source: BindingSource::Fallback,
            }),
            Err(e) => {
                tracing::warn!(session = %first.id, "Failed to connect: {e}");
                None
            }
        }
    }
}
