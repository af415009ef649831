//! Extraction events and progress reporting.
//!
//! Observers implement [`PipelineObserver`] and subscribe to an
//! [`ExtractionPipeline`](crate::ExtractionPipeline). They receive a
//! [`PipelineEvent`] for every captured frame, every failed frame, and once
//! when a run finishes, plus periodic [`ProgressInfo`] snapshots.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::{PipelineEvent, PipelineObserver, ProgressInfo};
//!
//! struct PrintProgress;
//!
//! impl PipelineObserver for PrintProgress {
//!     fn on_event(&self, event: &PipelineEvent) {
//!         if let PipelineEvent::FrameFailed { index, reason } = event {
//!             eprintln!("frame {index} failed: {reason}");
//!         }
//!     }
//!
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete");
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Frames captured and stored.
    pub rendered: u64,
    /// Frames whose capture produced no data.
    pub failed: u64,
    /// Whether the run stopped early because of cancellation.
    pub cancelled: bool,
}

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineEvent {
    /// Output frame `index` was rendered from source frame `source_index`
    /// and stored.
    FrameRendered {
        /// Output index.
        index: u64,
        /// Source frame the renderer was seeked to.
        source_index: u64,
    },
    /// Output frame `index` could not be captured; no entry was stored.
    FrameFailed {
        /// Output index.
        index: u64,
        /// Why the capture failed.
        reason: String,
    },
    /// The run reached `Completed`.
    Done(RunSummary),
}

/// A snapshot of extraction progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Frames attempted so far (captured or failed).
    pub current: u64,
    /// Frames in the mapping.
    pub total: u64,
    /// Completion percentage (0.0 – 100.0). `None` when `total` is zero.
    pub percentage: Option<f32>,
    /// Wall-clock time since the loop started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on throughput so far.
    pub estimated_remaining: Option<Duration>,
    /// Output index of the most recent frame, absent on the final report.
    pub current_frame: Option<u64>,
}

/// Receives pipeline events.
///
/// Observers are infallible: they watch a run but cannot fail it. To stop a
/// run from an observer, call
/// [`PipelineHandle::cancel`](crate::PipelineHandle::cancel) on a handle
/// captured at subscription time.
pub trait PipelineObserver: Send + Sync {
    /// Called for every [`PipelineEvent`].
    fn on_event(&self, event: &PipelineEvent);

    /// Called every `batch_size` attempted frames and once at the end.
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Identifies a subscription for [`ObserverSet::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Subscribed observers, notified in subscription order.
#[derive(Default)]
pub(crate) struct ObserverSet {
    next_id: u64,
    observers: Vec<(ObserverId, Arc<dyn PipelineObserver>)>,
}

impl ObserverSet {
    pub(crate) fn subscribe(&mut self, observer: Arc<dyn PipelineObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn emit(&self, event: &PipelineEvent) {
        for (_, observer) in &self.observers {
            observer.on_event(event);
        }
    }

    fn progress(&self, info: &ProgressInfo) {
        for (_, observer) in &self.observers {
            observer.on_progress(info);
        }
    }
}

/// Tracks run timing and decides when to emit progress snapshots.
pub(crate) struct ProgressTracker {
    total: u64,
    current: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(total: u64, batch_size: u64) -> Self {
        Self {
            total,
            current: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one attempted frame and report if the batch threshold is
    /// reached.
    pub(crate) fn advance(&mut self, observers: &ObserverSet, frame_index: u64) {
        self.current += 1;
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            observers.progress(&self.snapshot(Some(frame_index)));
            self.items_since_last_report = 0;
        }
    }

    /// Unconditionally emit a final snapshot.
    pub(crate) fn finish(&self, observers: &ObserverSet) {
        observers.progress(&self.snapshot(None));
    }

    fn snapshot(&self, frame_index: Option<u64>) -> ProgressInfo {
        let elapsed = self.start_time.elapsed();

        let percentage =
            (self.total > 0).then(|| (self.current as f32 / self.total as f32) * 100.0);

        let estimated_remaining = (self.current > 0).then(|| {
            let remaining = self.total.saturating_sub(self.current);
            let per_item = elapsed.div_f64(self.current as f64);
            per_item.mul_f64(remaining as f64)
        });

        ProgressInfo {
            current: self.current,
            total: self.total,
            percentage,
            elapsed,
            estimated_remaining,
            current_frame: frame_index,
        }
    }
}
