//! Bounded polling for resources that become available later.
//!
//! The host exposes no "ready" notification for notebooks, session bindings
//! or cell editors, only point-in-time lookups. Both resolvers share one
//! policy: probe immediately, retry up to the budget, then give up with
//! `None`. They differ only in how they wait between probes.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::FrameScheduler;

/// Retry budget for the timer-paced resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollPolicy {
    /// Total number of probe evaluations.
    pub max_attempts: u32,
    /// Delay between evaluations, in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval_ms: 50,
        }
    }
}

impl PollPolicy {
    /// Create a new policy.
    #[must_use]
    pub const fn new(max_attempts: u32, interval_ms: u64) -> Self {
        Self {
            max_attempts,
            interval_ms,
        }
    }

    /// Delay between evaluations.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Timer-paced resolver, used for notebook and session lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    policy: PollPolicy,
}

impl Resolver {
    /// Create a resolver with the given budget.
    #[must_use]
    pub const fn new(policy: PollPolicy) -> Self {
        Self { policy }
    }

    /// Evaluate `probe` until it yields a value or the budget runs out.
    ///
    /// A value on the first evaluation is returned without suspending.
    /// Exhaustion is an ordinary outcome and yields `None`.
    pub async fn resolve<T, F, Fut>(&self, resource: &str, mut probe: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        let attempts = self.policy.max_attempts;
        for attempt in 1..=attempts {
            if let Some(value) = probe().await {
                tracing::debug!(resource, attempt, "Resolved");
                return Some(value);
            }
            if attempt < attempts {
                tokio::time::sleep(self.policy.interval()).await;
            }
        }
        tracing::debug!(resource, attempts, "Gave up waiting");
        None
    }
}

/// Frame-paced resolver, used for editor attachment.
///
/// Each retry is a callback re-scheduled on the host render loop, so the
/// probe always runs on the thread that owns the UI.
#[derive(Clone)]
pub struct FrameResolver {
    scheduler: Arc<dyn FrameScheduler>,
    max_frames: u32,
}

impl FrameResolver {
    /// Create a resolver that probes for at most `max_frames` frames.
    #[must_use]
    pub fn new(scheduler: Arc<dyn FrameScheduler>, max_frames: u32) -> Self {
        Self {
            scheduler,
            max_frames,
        }
    }

    /// Start resolving. The first probe runs before this returns.
    ///
    /// `resource` names what is being waited for in logs.
    pub fn resolve<T, P>(&self, resource: &'static str, probe: P) -> FrameResolution<T>
    where
        T: Send + 'static,
        P: FnMut() -> Option<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        FramePoll {
            resource,
            probe,
            max_frames: self.max_frames,
            remaining: self.max_frames,
            scheduler: Arc::clone(&self.scheduler),
            tx,
        }
        .step();
        FrameResolution { rx }
    }
}

struct FramePoll<T, P> {
    resource: &'static str,
    probe: P,
    max_frames: u32,
    remaining: u32,
    scheduler: Arc<dyn FrameScheduler>,
    tx: oneshot::Sender<Option<T>>,
}

impl<T, P> FramePoll<T, P>
where
    T: Send + 'static,
    P: FnMut() -> Option<T> + Send + 'static,
{
    fn step(mut self) {
        if self.remaining == 0 {
            self.give_up();
            return;
        }
        if let Some(value) = (self.probe)() {
            let frame = self.max_frames - self.remaining;
            tracing::debug!(resource = self.resource, frame, "Resolved");
            let _ = self.tx.send(Some(value));
            return;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.give_up();
            return;
        }
        let scheduler = Arc::clone(&self.scheduler);
        scheduler.request_frame(Box::new(move || self.step()));
    }

    fn give_up(self) {
        tracing::debug!(resource = self.resource, frames = self.max_frames, "Gave up waiting");
        let _ = self.tx.send(None);
    }
}

/// Pending outcome of a [`FrameResolver`] run.
///
/// Resolves to `None` on exhaustion, or if the scheduler dropped a frame
/// callback without running it.
pub struct FrameResolution<T> {
    rx: oneshot::Receiver<Option<T>>,
}

impl<T> Future for FrameResolution<T> {
    type Output = Option<T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|res| res.ok().flatten())
    }
}
