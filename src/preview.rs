//! Periodic preview playback over a set of extracted frames.
//!
//! [`PreviewCycle`] runs a background tokio task that shows frames on a
//! [`PreviewSink`] one after another at a fixed interval, wrapping after the
//! last. Restarting or stopping the cycle is atomic with respect to the
//! sink: once [`restart`](PreviewCycle::restart) or
//! [`stop`](PreviewCycle::stop) returns, the previous cycle will never show
//! another frame.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::frame::ImageHandle;

/// Display target for preview playback.
pub trait PreviewSink: Send + Sync {
    /// Show output frame `index`.
    fn show(&self, index: u64, image: &ImageHandle);

    /// Hide the preview (no frames to show).
    fn hide(&self);
}

/// A sink that discards everything. Used when no display is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpPreview;

impl PreviewSink for NoOpPreview {
    fn show(&self, _index: u64, _image: &ImageHandle) {}
    fn hide(&self) {}
}

/// Cancellable repeating preview task.
pub struct PreviewCycle {
    sink: Arc<dyn PreviewSink>,
    /// Epoch of the cycle allowed to draw. Bumped under the lock on every
    /// restart/stop so an aborted task that is mid-tick cannot draw.
    epoch: Arc<Mutex<u64>>,
    task: Option<JoinHandle<()>>,
}

impl Debug for PreviewCycle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PreviewCycle")
            .field("running", &self.is_running())
            .finish()
    }
}

impl PreviewCycle {
    /// Create a stopped cycle drawing to `sink`.
    pub fn new(sink: Arc<dyn PreviewSink>) -> Self {
        Self {
            sink,
            epoch: Arc::new(Mutex::new(0)),
            task: None,
        }
    }

    /// Returns `true` while a cycle task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop any running cycle and, if `frames` is non-empty, start a new one
    /// showing them in the given order every `interval`.
    ///
    /// The first frame is shown immediately. Requires a tokio runtime; without
    /// one the preview stays hidden.
    pub fn restart(&mut self, frames: Vec<(u64, ImageHandle)>, interval: Duration) {
        let epoch = self.invalidate();

        if frames.is_empty() {
            self.sink.hide();
            return;
        }

        let Ok(runtime) = Handle::try_current() else {
            log::warn!("No tokio runtime available; preview disabled");
            self.sink.hide();
            return;
        };

        log::debug!(
            "Starting preview over {} frames every {:?}",
            frames.len(),
            interval
        );

        let sink = Arc::clone(&self.sink);
        let current = Arc::clone(&self.epoch);
        let interval = interval.max(Duration::from_millis(1));

        self.task = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            for (index, image) in frames.iter().cycle() {
                ticker.tick().await;
                let guard = current.lock().unwrap_or_else(PoisonError::into_inner);
                if *guard != epoch {
                    break;
                }
                sink.show(*index, image);
            }
        }));
    }

    /// Stop the cycle and hide the preview.
    pub fn stop(&mut self) {
        self.invalidate();
        self.sink.hide();
    }

    /// Abort the running task and return the epoch for the next cycle.
    fn invalidate(&mut self) -> u64 {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        let mut epoch = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch += 1;
        *epoch
    }
}

impl Drop for PreviewCycle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
