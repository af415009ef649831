//! Error types for the `lottie-sprites` crate.
//!
//! This module defines [`SpriteError`], the unified error type returned by all
//! fallible operations in the crate. Errors carry enough context (frame
//! indices, table generations, upstream messages) to diagnose a problem
//! without extra logging at the call site.

use std::io::Error as IoError;

use image::ImageError;
use serde_json::Error as JsonError;
use thiserror::Error;
use zip::result::ZipError;

use crate::state::PipelineState;

/// The unified error type for all `lottie-sprites` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SpriteError {
    /// A run was requested while another one is still active.
    #[error("Extraction already in progress (pipeline is {state:?})")]
    AlreadyRunning {
        /// State the pipeline was in when the request was rejected.
        state: PipelineState,
    },

    /// A single frame could not be rasterized.
    ///
    /// Only ever reported through
    /// [`PipelineEvent::FrameFailed`](crate::PipelineEvent::FrameFailed);
    /// a run never fails because of it.
    #[error("Failed to capture frame {index}: {reason}")]
    FrameCapture {
        /// Output index of the frame.
        index: u64,
        /// Why the capture produced no data.
        reason: String,
    },

    /// No extracted frame exists at the requested output index.
    #[error("No extracted frame at index {index}")]
    FrameNotFound {
        /// Requested output index.
        index: u64,
    },

    /// Export was requested with no eligible frames.
    #[error("Nothing to export: no frames were selected or extracted")]
    NothingToExport,

    /// A frame reference from an earlier run was used after a new run started.
    #[error("Stale frame reference (generation {generation}, table is at generation {current})")]
    StaleReference {
        /// Generation the reference was taken from.
        generation: u64,
        /// Current generation of the frame table.
        current: u64,
    },

    /// [`ExtractionPipeline::run`](crate::ExtractionPipeline::run) was called
    /// without a preceding start.
    #[error("No extraction has been started")]
    NotStarted,

    /// The mapping handed to the pipeline has no entries.
    #[error("Frame mapping is empty (animation has zero duration at the requested frame rate)")]
    EmptyMapping,

    /// The renderer failed to load the animation source.
    #[error("Renderer failed to load animation: {0}")]
    RendererLoad(String),

    /// The animation description could not be interpreted.
    #[error("Invalid animation descriptor: {0}")]
    InvalidDescriptor(String),

    /// A resample or pipeline option is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// An operation needs a loaded animation and none is loaded.
    #[error("No animation loaded")]
    NoAnimationLoaded,

    /// Archive assembly failed.
    #[error("Archive error: {0}")]
    ArchiveError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while reading or encoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The animation JSON could not be parsed.
    #[error("JSON error: {0}")]
    JsonError(#[from] JsonError),
}

impl From<ZipError> for SpriteError {
    fn from(error: ZipError) -> Self {
        SpriteError::ArchiveError(error.to_string())
    }
}
