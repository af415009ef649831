//! The frame extraction pipeline.
//!
//! [`ExtractionPipeline`] owns a [`Renderer`] and drives it through every
//! entry of a [`FrameMapping`]: seek to the mapped source frame, capture,
//! store. Captures are strictly sequential because the renderer holds a
//! single current frame; frame `f + 1` is never seeked before frame `f`'s
//! capture has resolved.
//!
//! A run has two phases. [`start`](ExtractionPipeline::start) validates the
//! request, releases the previous run's frames, and asks the renderer to
//! load the source. [`run`](ExtractionPipeline::run) waits for the renderer
//! to report the source loaded, then walks the mapping. A frame whose
//! capture yields no data is reported and skipped; it never fails the run.
//!
//! # Example
//!
//! ```
//! # use lottie_sprites::{LoadRequest, Readiness, Renderer};
//! # struct Solid(u64);
//! # impl Renderer for Solid {
//! #     fn load(&mut self, _request: LoadRequest) -> Readiness { Readiness::ready() }
//! #     fn set_frame(&mut self, frame: u64) { self.0 = frame; }
//! #     fn play(&mut self) {}
//! #     fn stop(&mut self) {}
//! #     fn set_loop(&mut self, _looping: bool) {}
//! #     fn resize(&mut self, _width: u32, _height: u32) {}
//! #     async fn capture_frame(&mut self) -> Option<Vec<u8>> { Some(vec![self.0 as u8]) }
//! # }
//! use lottie_sprites::{AnimationDescriptor, ExtractionPipeline, compute_mapping};
//!
//! # async fn example() -> Result<(), lottie_sprites::SpriteError> {
//! let descriptor = AnimationDescriptor::new("spin.json", 64, 64, 10, 10.0)?;
//! let mut pipeline = ExtractionPipeline::new(Solid(0));
//!
//! let summary = pipeline
//!     .extract(&descriptor, compute_mapping(10, 5))
//!     .await?;
//! assert_eq!(summary.rendered, 5);
//! assert_eq!(pipeline.frames().indices(), vec![0, 1, 2, 3, 4]);
//! # Ok(())
//! # }
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::configuration::PipelineOptions;
use crate::descriptor::AnimationDescriptor;
use crate::error::SpriteError;
use crate::frame::{FrameTable, ImageHandle};
use crate::mapping::FrameMapping;
use crate::progress::{
    ObserverId, ObserverSet, PipelineEvent, PipelineObserver, ProgressTracker, RunSummary,
};
use crate::renderer::{LoadRequest, Readiness, Renderer};
use crate::state::{PipelineHandle, PipelineState};

/// A started run waiting for [`ExtractionPipeline::run`].
struct PendingRun {
    source: String,
    mapping: FrameMapping,
    readiness: Readiness,
}

/// Sequential, cancellable frame extractor.
pub struct ExtractionPipeline<R: Renderer> {
    renderer: R,
    handle: PipelineHandle,
    options: PipelineOptions,
    table: FrameTable,
    observers: ObserverSet,
    pending: Option<PendingRun>,
}

impl<R: Renderer> Debug for ExtractionPipeline<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExtractionPipeline")
            .field("state", &self.state())
            .field("frames", &self.table.len())
            .field("generation", &self.table.generation())
            .field("observers", &self.observers.len())
            .field("options", &self.options)
            .finish()
    }
}

impl<R: Renderer> ExtractionPipeline<R> {
    /// Create an idle pipeline around `renderer` with default options.
    pub fn new(renderer: R) -> Self {
        Self::with_options(renderer, PipelineOptions::new())
    }

    /// Create an idle pipeline with explicit options.
    pub fn with_options(renderer: R, options: PipelineOptions) -> Self {
        Self {
            renderer,
            handle: PipelineHandle::new(),
            options,
            table: FrameTable::new(),
            observers: ObserverSet::default(),
            pending: None,
        }
    }

    /// A clonable handle for observing state and cancelling from elsewhere.
    pub fn handle(&self) -> PipelineHandle {
        self.handle.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.handle.state()
    }

    /// Frames captured by the current (or last) run.
    pub fn frames(&self) -> &FrameTable {
        &self.table
    }

    /// The wrapped renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the wrapped renderer, for display-side commands
    /// (resize, live playback) between runs.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Consume the pipeline, releasing every frame, and return the renderer.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Register an observer for subsequent events.
    pub fn subscribe(&mut self, observer: Arc<dyn PipelineObserver>) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove an observer. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Request cancellation of the active run.
    ///
    /// See [`PipelineHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// Begin a run over `mapping`.
    ///
    /// Rejected with [`SpriteError::AlreadyRunning`] while a run is active,
    /// leaving everything untouched. An empty mapping is a setup failure:
    /// [`SpriteError::EmptyMapping`] is returned and the state drops back to
    /// `Idle`, though the previous run's frames stay available. On success
    /// every frame of the previous run is released, the state becomes
    /// `Running`, and the renderer is asked to load `descriptor.source_url`
    /// without autoplay or looping.
    pub fn start(
        &mut self,
        descriptor: &AnimationDescriptor,
        mapping: FrameMapping,
    ) -> Result<(), SpriteError> {
        let state = self.state();
        if state.is_active() {
            return Err(SpriteError::AlreadyRunning { state });
        }
        if mapping.is_empty() {
            self.handle.set(PipelineState::Idle);
            return Err(SpriteError::EmptyMapping);
        }

        self.table.clear();
        self.handle.set(PipelineState::Running);

        log::info!(
            "Starting extraction of {} frames from {} (generation {})",
            mapping.len(),
            descriptor.source_url,
            self.table.generation(),
        );

        let readiness = self
            .renderer
            .load(LoadRequest::for_extraction(descriptor.source_url.clone()));
        self.pending = Some(PendingRun {
            source: descriptor.source_url.clone(),
            mapping,
            readiness,
        });
        Ok(())
    }

    /// Drive the started run to completion.
    ///
    /// Returns once every mapped frame has been attempted or cancellation
    /// took effect; the state is then `Completed`. If the renderer reports a
    /// load failure the run never begins, the state returns to `Idle`, live
    /// playback is resumed, and [`SpriteError::RendererLoad`] is returned.
    pub async fn run(&mut self) -> Result<RunSummary, SpriteError> {
        let Some(PendingRun {
            source,
            mapping,
            readiness,
        }) = self.pending.take()
        else {
            return Err(SpriteError::NotStarted);
        };

        let mut guard = RunGuard::new(self.handle.clone());

        if let Err(error) = readiness.await {
            log::warn!("Renderer could not load {}: {}", source, error);
            guard.disarm();
            self.handle.set(PipelineState::Idle);
            self.resume_playback();
            return Err(error);
        }
        log::debug!("Renderer loaded {}", source);

        self.renderer.stop();
        self.renderer.set_loop(false);

        let mut tracker = ProgressTracker::new(mapping.len() as u64, self.options.batch_size);
        let mut summary = RunSummary::default();

        for (index, source_index) in mapping.iter() {
            if self.handle.is_cancelled() {
                log::info!("Extraction cancelled before frame {}", index);
                break;
            }

            log::debug!("Rendering frame #{} from source frame #{}", index, source_index);
            self.renderer.stop();
            self.renderer.set_frame(source_index);

            match self.capture().await {
                Ok(bytes) => {
                    self.table
                        .insert(index, source_index, ImageHandle::from_png_bytes(bytes));
                    summary.rendered += 1;
                    self.observers.emit(&PipelineEvent::FrameRendered {
                        index,
                        source_index,
                    });
                }
                Err(reason) => {
                    let failure = SpriteError::FrameCapture {
                        index,
                        reason: reason.clone(),
                    };
                    log::warn!("{}", failure);
                    summary.failed += 1;
                    self.observers
                        .emit(&PipelineEvent::FrameFailed { index, reason });
                }
            }

            tracker.advance(&self.observers, index);
        }

        summary.cancelled = self.handle.is_cancelled();
        guard.disarm();
        self.handle.set(PipelineState::Completed);

        tracker.finish(&self.observers);
        self.observers.emit(&PipelineEvent::Done(summary));

        self.resume_playback();

        log::info!(
            "Extraction finished: {} rendered, {} failed{}",
            summary.rendered,
            summary.failed,
            if summary.cancelled { " (cancelled)" } else { "" },
        );

        Ok(summary)
    }

    /// [`start`](ExtractionPipeline::start) followed by
    /// [`run`](ExtractionPipeline::run).
    pub async fn extract(
        &mut self,
        descriptor: &AnimationDescriptor,
        mapping: FrameMapping,
    ) -> Result<RunSummary, SpriteError> {
        self.start(descriptor, mapping)?;
        self.run().await
    }

    /// Release every frame and return to `Idle`.
    ///
    /// Used when a different animation is loaded. A run that was started but
    /// never driven is abandoned; one that is being driven rejects the reset.
    pub fn reset(&mut self) -> Result<(), SpriteError> {
        let state = self.state();
        if state.is_active() && self.pending.is_none() {
            return Err(SpriteError::AlreadyRunning { state });
        }
        if self.pending.take().is_some() {
            log::debug!("Abandoning extraction that was started but never run");
        }
        self.table.clear();
        self.handle.set(PipelineState::Idle);
        Ok(())
    }

    /// Put the renderer back into looping playback from frame 0.
    fn resume_playback(&mut self) {
        self.renderer.set_loop(true);
        self.renderer.set_frame(0);
        self.renderer.play();
    }

    /// Capture the renderer's current frame, applying the configured timeout.
    async fn capture(&mut self) -> Result<Vec<u8>, String> {
        let timeout = self.options.capture_timeout;
        let capture = self.renderer.capture_frame();

        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, capture)
                .await
                .map_err(|_| format!("capture timed out after {limit:?}"))?,
            None => capture.await,
        };

        match outcome {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err("capture returned no data".to_string()),
        }
    }
}

/// Marks the run `Completed` if the `run` future is dropped mid-flight, so
/// the pipeline can be started again.
struct RunGuard {
    handle: PipelineHandle,
    armed: bool,
}

impl RunGuard {
    fn new(handle: PipelineHandle) -> Self {
        Self {
            handle,
            armed: true,
        }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.armed {
            log::debug!("Extraction dropped before completion");
            self.handle.set(PipelineState::Completed);
        }
    }
}
