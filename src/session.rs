//! The coordinating session.
//!
//! [`Session`] owns everything one animation's conversion needs: the loaded
//! [`AnimationDescriptor`], the current [`ResampleSpec`] and its
//! [`FrameMapping`], the [`ExtractionPipeline`] with its frame table, and the
//! [`SelectionModel`]. Callers interact only through its methods; the
//! reset points are [`load`](Session::load) (new animation),
//! [`start`](Session::start) (new run), and [`close`](Session::close)
//! (teardown).
//!
//! # Example
//!
//! ```no_run
//! # use lottie_sprites::{LoadRequest, Readiness, Renderer};
//! # struct Player;
//! # impl Renderer for Player {
//! #     fn load(&mut self, _request: LoadRequest) -> Readiness { Readiness::ready() }
//! #     fn set_frame(&mut self, _frame: u64) {}
//! #     fn play(&mut self) {}
//! #     fn stop(&mut self) {}
//! #     fn set_loop(&mut self, _looping: bool) {}
//! #     fn resize(&mut self, _width: u32, _height: u32) {}
//! #     async fn capture_frame(&mut self) -> Option<Vec<u8>> { None }
//! # }
//! use std::sync::Arc;
//!
//! use lottie_sprites::{AnimationDescriptor, NoOpPreview, Session};
//!
//! # async fn example() -> Result<(), lottie_sprites::SpriteError> {
//! let mut session = Session::new(Player, Arc::new(NoOpPreview));
//! session.load(AnimationDescriptor::from_path("coin.json")?)?;
//! session.set_frame_rate(12.0)?;
//! session.set_scale(0.5)?;
//! session.set_name_prefix("coin");
//!
//! session.convert().await?;
//! session.toggle(0);
//! session.toggle(3);
//! let archive = session.export_selected().await?;
//! archive.save(".")?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::configuration::{PipelineOptions, ResampleSpec};
use crate::descriptor::AnimationDescriptor;
use crate::error::SpriteError;
use crate::export::{self, Archive, DEFAULT_PREFIX, FrameFile};
use crate::frame::FrameTable;
use crate::mapping::FrameMapping;
use crate::pipeline::ExtractionPipeline;
use crate::preview::PreviewSink;
use crate::progress::{ObserverId, PipelineObserver, RunSummary};
use crate::renderer::{LoadRequest, Renderer};
use crate::selection::SelectionModel;
use crate::state::{PipelineHandle, PipelineState};

/// The loaded animation and its derived resample state.
#[derive(Debug, Clone)]
struct Loaded {
    descriptor: AnimationDescriptor,
    spec: ResampleSpec,
    mapping: FrameMapping,
}

/// One user's conversion session.
#[derive(Debug)]
pub struct Session<R: Renderer> {
    pipeline: ExtractionPipeline<R>,
    selection: SelectionModel,
    loaded: Option<Loaded>,
    name_prefix: String,
}

impl<R: Renderer> Session<R> {
    /// Create a session with nothing loaded.
    pub fn new(renderer: R, preview: Arc<dyn PreviewSink>) -> Self {
        Self::with_options(renderer, preview, PipelineOptions::new())
    }

    /// Create a session with explicit pipeline options.
    pub fn with_options(
        renderer: R,
        preview: Arc<dyn PreviewSink>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            pipeline: ExtractionPipeline::with_options(renderer, options),
            selection: SelectionModel::new(preview, 1.0),
            loaded: None,
            name_prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    /// Load a new animation, replacing the previous one.
    ///
    /// Releases every extracted frame, clears the selection, stops the
    /// preview, resets the resample spec to the animation's intrinsic values,
    /// and starts live looping playback on the renderer. A started but
    /// un-run extraction is abandoned.
    pub fn load(&mut self, descriptor: AnimationDescriptor) -> Result<(), SpriteError> {
        self.pipeline.reset()?;
        self.selection.rebind(self.pipeline.frames());

        let spec = ResampleSpec::for_descriptor(&descriptor);
        let mapping = spec.mapping(&descriptor);
        self.selection.set_frame_rate(spec.target_frame_rate);

        log::info!(
            "Loaded {} ({}x{}, {} frames at {} fps)",
            descriptor.source_url,
            descriptor.intrinsic_width,
            descriptor.intrinsic_height,
            descriptor.source_frame_count,
            descriptor.source_frame_rate,
        );

        let renderer = self.pipeline.renderer_mut();
        // Live playback needs no readiness handshake.
        drop(renderer.load(LoadRequest::for_playback(descriptor.source_url.clone())));
        renderer.resize(spec.output_width, spec.output_height);

        self.loaded = Some(Loaded {
            descriptor,
            spec,
            mapping,
        });
        Ok(())
    }

    /// The loaded animation.
    pub fn descriptor(&self) -> Option<&AnimationDescriptor> {
        self.loaded.as_ref().map(|loaded| &loaded.descriptor)
    }

    /// Current output settings.
    pub fn spec(&self) -> Option<&ResampleSpec> {
        self.loaded.as_ref().map(|loaded| &loaded.spec)
    }

    /// Current output→source mapping.
    pub fn mapping(&self) -> Option<&FrameMapping> {
        self.loaded.as_ref().map(|loaded| &loaded.mapping)
    }

    /// Set output scale (width and height follow) and resize the renderer.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), SpriteError> {
        self.update_size(|spec, descriptor| spec.set_scale(descriptor, scale))
    }

    /// Set output width (scale and height follow) and resize the renderer.
    pub fn set_width(&mut self, width: u32) -> Result<(), SpriteError> {
        self.update_size(|spec, descriptor| spec.set_width(descriptor, width))
    }

    /// Set output height (scale and width follow) and resize the renderer.
    pub fn set_height(&mut self, height: u32) -> Result<(), SpriteError> {
        self.update_size(|spec, descriptor| spec.set_height(descriptor, height))
    }

    /// Set output frame rate; frame count and mapping are recomputed.
    ///
    /// A run already in flight keeps the mapping it was started with.
    pub fn set_frame_rate(&mut self, frame_rate: f64) -> Result<(), SpriteError> {
        let loaded = self.loaded.as_mut().ok_or(SpriteError::NoAnimationLoaded)?;
        let mut spec = loaded.spec.clone();
        spec.set_frame_rate(&loaded.descriptor, frame_rate)?;
        loaded.mapping = spec.mapping(&loaded.descriptor);
        loaded.spec = spec;
        self.selection.set_frame_rate(frame_rate);
        log::debug!(
            "Output frame rate {} fps -> {} frames",
            frame_rate,
            loaded.mapping.len()
        );
        Ok(())
    }

    /// Prefix used for archive entries and file names.
    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }

    /// Set the archive name prefix.
    pub fn set_name_prefix(&mut self, prefix: impl Into<String>) {
        self.name_prefix = prefix.into();
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&mut self, observer: Arc<dyn PipelineObserver>) -> ObserverId {
        self.pipeline.subscribe(observer)
    }

    /// Unsubscribe from pipeline events.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.pipeline.unsubscribe(id)
    }

    /// Pipeline state.
    pub fn state(&self) -> PipelineState {
        self.pipeline.state()
    }

    /// Clonable handle for cancelling from another task.
    pub fn handle(&self) -> PipelineHandle {
        self.pipeline.handle()
    }

    /// Start a new extraction run with the current mapping.
    ///
    /// The previous run's frames and the selection are discarded.
    pub fn start(&mut self) -> Result<(), SpriteError> {
        let loaded = self.loaded.as_ref().ok_or(SpriteError::NoAnimationLoaded)?;
        self.pipeline
            .start(&loaded.descriptor, loaded.mapping.clone())?;
        self.selection.rebind(self.pipeline.frames());
        Ok(())
    }

    /// Drive the started run. On completion every extracted frame is
    /// previewed.
    pub async fn run(&mut self) -> Result<RunSummary, SpriteError> {
        let summary = self.pipeline.run().await?;
        self.selection.rebind(self.pipeline.frames());
        self.selection.preview_all(self.pipeline.frames());
        Ok(summary)
    }

    /// [`start`](Session::start) followed by [`run`](Session::run).
    pub async fn convert(&mut self) -> Result<RunSummary, SpriteError> {
        self.start()?;
        self.run().await
    }

    /// Request cancellation of the active run.
    pub fn cancel(&self) -> bool {
        self.pipeline.cancel()
    }

    /// Extracted frames.
    pub fn frames(&self) -> &FrameTable {
        self.pipeline.frames()
    }

    /// Flip selection of frame `index`; the preview follows the selection.
    pub fn toggle(&mut self, index: u64) -> bool {
        self.selection.toggle(index, self.pipeline.frames())
    }

    /// Select every extracted frame.
    pub fn select_all(&mut self) {
        self.selection.select_all(self.pipeline.frames());
    }

    /// Deselect everything.
    pub fn clear_selection(&mut self) {
        self.selection.clear(self.pipeline.frames());
    }

    /// Selected indices in ascending order.
    pub fn current_selection(&self) -> Vec<u64> {
        self.selection.current_selection()
    }

    /// The selection model (for preview state and interval).
    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    /// Pack the selected frames as `"{prefix}_selected.zip"`.
    pub async fn export_selected(&self) -> Result<Archive, SpriteError> {
        export::export_selection(
            self.pipeline.frames(),
            self.selection.selection(),
            &self.name_prefix,
        )
        .await
    }

    /// Pack every extracted frame as `"{prefix}.zip"`.
    pub async fn export_all(&self) -> Result<Archive, SpriteError> {
        export::export_all(self.pipeline.frames(), &self.name_prefix).await
    }

    /// A single extracted frame as `"{prefix}_{index}.png"`.
    pub fn export_frame(&self, index: u64) -> Result<FrameFile, SpriteError> {
        export::export_frame(self.pipeline.frames(), index, &self.name_prefix)
    }

    /// End the session: stop the preview, release every frame, and hand the
    /// renderer back.
    pub fn close(mut self) -> R {
        self.selection.stop_preview();
        log::debug!(
            "Closing session ({} frames released)",
            self.pipeline.frames().len()
        );
        self.pipeline.into_renderer()
    }

    fn update_size<F>(&mut self, apply: F) -> Result<(), SpriteError>
    where
        F: FnOnce(&mut ResampleSpec, &AnimationDescriptor) -> Result<(), SpriteError>,
    {
        let loaded = self.loaded.as_mut().ok_or(SpriteError::NoAnimationLoaded)?;
        let mut spec = loaded.spec.clone();
        apply(&mut spec, &loaded.descriptor)?;
        self.pipeline
            .renderer_mut()
            .resize(spec.output_width, spec.output_height);
        loaded.spec = spec;
        Ok(())
    }
}
