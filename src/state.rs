//! Pipeline lifecycle state and cooperative cancellation.
//!
//! [`PipelineHandle`] is a cheap, clonable view of an
//! [`ExtractionPipeline`](crate::ExtractionPipeline)'s state. Hand a clone to
//! another task (or to an observer) to request cancellation while a run is
//! in flight. Cancellation only flips the state; the extraction loop checks
//! it before starting each frame, so the frame being captured always
//! finishes.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::{PipelineHandle, PipelineState};
//!
//! let handle = PipelineHandle::new();
//! assert_eq!(handle.state(), PipelineState::Idle);
//!
//! // Nothing to cancel while idle.
//! handle.cancel();
//! assert_eq!(handle.state(), PipelineState::Idle);
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicU8, Ordering},
};

/// Lifecycle of an extraction run.
///
/// `Idle → Running` on start, `Running → Cancelling` on cancel,
/// `Running | Cancelling → Completed` when the loop stops. A new start is
/// accepted from `Idle` or `Completed` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No run has started (or the last one failed during setup).
    Idle,
    /// Frames are being extracted.
    Running,
    /// Cancellation requested; the in-flight frame is finishing.
    Cancelling,
    /// The last run finished, either naturally or after cancellation.
    Completed,
}

impl PipelineState {
    /// Returns `true` while a run owns the renderer.
    pub fn is_active(self) -> bool {
        matches!(self, PipelineState::Running | PipelineState::Cancelling)
    }

    fn to_u8(self) -> u8 {
        match self {
            PipelineState::Idle => 0,
            PipelineState::Running => 1,
            PipelineState::Cancelling => 2,
            PipelineState::Completed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => PipelineState::Running,
            2 => PipelineState::Cancelling,
            3 => PipelineState::Completed,
            _ => PipelineState::Idle,
        }
    }
}

/// Shared, clonable pipeline state backed by an [`AtomicU8`].
///
/// All clones observe the same state.
#[derive(Debug, Clone)]
pub struct PipelineHandle {
    state: Arc<AtomicU8>,
}

impl PipelineHandle {
    /// Create a handle in the [`Idle`](PipelineState::Idle) state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PipelineState::Idle.to_u8())),
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Request cancellation of the current run.
    ///
    /// Has an effect only while [`Running`](PipelineState::Running).
    /// Returns `true` if this call moved the state to
    /// [`Cancelling`](PipelineState::Cancelling).
    pub fn cancel(&self) -> bool {
        let moved = self.transition(PipelineState::Running, PipelineState::Cancelling);
        if moved {
            log::debug!("Extraction cancellation requested");
        }
        moved
    }

    /// Returns `true` once cancellation has been requested for the current run.
    pub fn is_cancelled(&self) -> bool {
        self.state() == PipelineState::Cancelling
    }

    /// Atomically move from `from` to `to`. Returns `false` if the state was
    /// not `from`.
    pub(crate) fn transition(&self, from: PipelineState, to: PipelineState) -> bool {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn set(&self, state: PipelineState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }
}

impl Default for PipelineHandle {
    fn default() -> Self {
        Self::new()
    }
}
