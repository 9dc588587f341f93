//! Render-loop schedulers.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use tokio::runtime::Handle;

use crate::{FrameCallback, FrameScheduler};

/// Frame queue pumped by a host that owns its render loop.
///
/// Callbacks requested while a pump is running are deferred to the next pump.
#[derive(Default)]
pub struct FrameQueue {
    queue: Mutex<VecDeque<FrameCallback>>,
}

impl FrameQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every callback queued before this call. Returns how many ran.
    pub fn pump(&self) -> usize {
        let due = std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner));
        let count = due.len();
        for callback in due {
            callback();
        }
        count
    }

    /// Number of callbacks waiting for the next pump.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&self, callback: FrameCallback) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(callback);
    }
}

/// Fixed-period frames driven by the tokio timer.
#[derive(Debug, Clone, Copy)]
pub struct IntervalFrames {
    period: Duration,
}

impl Default for IntervalFrames {
    /// Roughly 60 frames per second.
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl IntervalFrames {
    /// Create a scheduler with the given frame period.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self { period }
    }
}

impl FrameScheduler for IntervalFrames {
    fn request_frame(&self, callback: FrameCallback) {
        let Ok(handle) = Handle::try_current() else {
            tracing::error!("Frame requested outside a tokio runtime, dropping callback");
            return;
        };
        let period = self.period;
        handle.spawn(async move {
            tokio::time::sleep(period).await;
            callback();
        });
    }
}
