//! # lottie-sprites
//!
//! Turn a Lottie animation into a sequence of PNG sprite frames at a chosen
//! size and frame rate, pick the frames you want, and pack them into a zip
//! archive.
//!
//! Rasterization is delegated to an external [`Renderer`] (a Lottie player
//! that can load a source, seek, and capture its canvas). This crate decides
//! *which* source frame to render for each output frame, drives the renderer
//! through a sequential, cancellable extraction run, and manages the
//! resulting frames, selection, preview, and export.
//!
//! ## Quick Start
//!
//! ### Plan a Resample
//!
//! ```
//! use lottie_sprites::{AnimationDescriptor, ResampleSpec};
//!
//! let descriptor = AnimationDescriptor::new("coin.json", 200, 200, 60, 60.0)?;
//! let mut spec = ResampleSpec::for_descriptor(&descriptor);
//! spec.set_frame_rate(&descriptor, 12.0)?;
//!
//! let mapping = spec.mapping(&descriptor);
//! assert_eq!(mapping.len(), 12);
//! assert_eq!(mapping.get(1), Some(5));
//! # Ok::<(), lottie_sprites::SpriteError>(())
//! ```
//!
//! ### Extract and Export
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
//!
//! let summary = session.convert().await?;
//! println!("{} frames rendered, {} failed", summary.rendered, summary.failed);
//!
//! session.export_all().await?.save("out")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Frame resampling** — nearest-preceding downsampling and frame
//!   repetition for upsampling, see [`compute_mapping`]
//! - **Linked output size** — width, height, and scale follow the source
//!   aspect ratio
//! - **Sequential extraction** — one seek/capture at a time against a
//!   stateful renderer; per-frame failures are reported, never fatal
//! - **Cancellation** — cooperative, with at most one frame of latency, via
//!   [`PipelineHandle`]
//! - **Events & progress** — [`PipelineObserver`] receives per-frame events
//!   and progress snapshots
//! - **Generation-tagged frames** — references from an earlier run fail with
//!   [`SpriteError::StaleReference`]
//! - **Selection preview** — cancellable periodic playback over the selected
//!   frames
//! - **Zip export** — `"{prefix}_{index}.png"` entries, assembled off the
//!   async runtime

pub mod configuration;
pub mod descriptor;
pub mod error;
pub mod export;
pub mod frame;
pub mod mapping;
pub mod pipeline;
pub mod preview;
pub mod progress;
pub mod renderer;
pub mod selection;
pub mod session;
pub mod state;
pub mod validation;

pub use configuration::{PipelineOptions, ResampleSpec, preview_interval};
pub use descriptor::{AnimationDescriptor, MAX_FRAME_COUNT};
pub use error::SpriteError;
pub use export::{
    Archive, ArchiveWriter, FrameFile, ZipArchiveWriter, archive_name, build_archive,
    build_archive_with, entry_name, export_all, export_frame, export_selection,
};
pub use frame::{ExtractedFrame, FrameKey, FrameTable, ImageHandle, WeakImageHandle};
pub use mapping::{FrameMapping, compute_mapping};
pub use pipeline::ExtractionPipeline;
pub use preview::{NoOpPreview, PreviewCycle, PreviewSink};
pub use progress::{ObserverId, PipelineEvent, PipelineObserver, ProgressInfo, RunSummary};
pub use renderer::{LoadRequest, Readiness, ReadySignal, Renderer};
pub use selection::{SelectionModel, SelectionSet};
pub use session::Session;
pub use state::{PipelineHandle, PipelineState};
pub use validation::{ValidationReport, validate};
