//! Sustained-press timer
//!
//! The long-press gesture needs exactly one delayed, cancelable action. The
//! `PressTimer` trait keeps the editor independent of the host's timer
//! mechanism; `TokioPressTimer` is the runtime-backed implementation.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Callback fired when the dwell elapses
pub type OnElapsed = Box<dyn FnOnce() + Send + 'static>;

/// A single-slot, cancelable delay
pub trait PressTimer: Send + Sync {
    /// Arms the timer, replacing any pending one
    fn start(&self, dwell: Duration, on_elapsed: OnElapsed);

    /// Disarms the pending timer, if any. The callback will not run.
    fn cancel(&self);
}

/// Timer that sleeps on the current tokio runtime
#[derive(Default)]
pub struct TokioPressTimer {
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl TokioPressTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, next: Option<JoinHandle<()>>) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = std::mem::replace(&mut *pending, next) {
            previous.abort();
        }
    }
}

impl PressTimer for TokioPressTimer {
    fn start(&self, dwell: Duration, on_elapsed: OnElapsed) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("no tokio runtime, long press ignored");
                return;
            }
        };
        let handle = runtime.spawn(async move {
            tokio::time::sleep(dwell).await;
            on_elapsed();
        });
        self.replace(Some(handle));
    }

    fn cancel(&self) {
        self.replace(None);
    }
}

impl Drop for TokioPressTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
