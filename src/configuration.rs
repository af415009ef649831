//! Resample and pipeline configuration.
//!
//! [`ResampleSpec`] holds the output size and frame rate for an extraction.
//! Width, height, and scale are linked through the animation's aspect ratio:
//! setting any one of them recomputes the other two. Setting the frame rate
//! recomputes the output frame count from the animation's duration.
//!
//! [`PipelineOptions`] threads operational settings (progress cadence,
//! capture timeout) through the extraction pipeline without polluting every
//! method signature.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::{AnimationDescriptor, ResampleSpec};
//!
//! let descriptor = AnimationDescriptor::new("logo.json", 400, 200, 60, 30.0)?;
//! let mut spec = ResampleSpec::for_descriptor(&descriptor);
//! spec.set_width(&descriptor, 100)?;
//! assert_eq!((spec.output_width, spec.output_height), (100, 50));
//! assert_eq!(spec.scale, 0.25);
//!
//! spec.set_frame_rate(&descriptor, 12.0)?;
//! assert_eq!(spec.target_frame_count, 24);
//! # Ok::<(), lottie_sprites::SpriteError>(())
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::descriptor::{AnimationDescriptor, MAX_FRAME_COUNT};
use crate::error::SpriteError;
use crate::mapping::{FrameMapping, compute_mapping};

/// Output size and timing for one extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleSpec {
    /// Number of frames the extraction will produce.
    pub target_frame_count: u64,
    /// Output frames per second. Also drives the preview interval.
    pub target_frame_rate: f64,
    /// Output width in pixels.
    pub output_width: u32,
    /// Output height in pixels.
    pub output_height: u32,
    /// Output size relative to the intrinsic canvas.
    pub scale: f64,
}

impl ResampleSpec {
    /// Spec matching the animation as authored: intrinsic size, scale 1,
    /// source frame rate, and one output frame per source frame.
    pub fn for_descriptor(descriptor: &AnimationDescriptor) -> Self {
        Self {
            target_frame_count: descriptor.source_frame_count,
            target_frame_rate: descriptor.source_frame_rate,
            output_width: descriptor.intrinsic_width,
            output_height: descriptor.intrinsic_height,
            scale: 1.0,
        }
    }

    /// Set the scale; width and height follow.
    pub fn set_scale(
        &mut self,
        descriptor: &AnimationDescriptor,
        scale: f64,
    ) -> Result<(), SpriteError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(SpriteError::InvalidOption(format!(
                "scale must be positive (got {scale})"
            )));
        }
        self.scale = scale;
        self.output_width = scaled_dimension(descriptor.intrinsic_width, scale);
        self.output_height = scaled_dimension(descriptor.intrinsic_height, scale);
        Ok(())
    }

    /// Set the output width; scale and height follow.
    pub fn set_width(
        &mut self,
        descriptor: &AnimationDescriptor,
        width: u32,
    ) -> Result<(), SpriteError> {
        if width == 0 {
            return Err(SpriteError::InvalidOption("width must be at least 1".into()));
        }
        let scale = width as f64 / descriptor.intrinsic_width as f64;
        self.scale = scale;
        self.output_width = width;
        self.output_height = scaled_dimension(descriptor.intrinsic_height, scale);
        Ok(())
    }

    /// Set the output height; scale and width follow.
    pub fn set_height(
        &mut self,
        descriptor: &AnimationDescriptor,
        height: u32,
    ) -> Result<(), SpriteError> {
        if height == 0 {
            return Err(SpriteError::InvalidOption("height must be at least 1".into()));
        }
        let scale = height as f64 / descriptor.intrinsic_height as f64;
        self.scale = scale;
        self.output_width = scaled_dimension(descriptor.intrinsic_width, scale);
        self.output_height = height;
        Ok(())
    }

    /// Set the output frame rate; the frame count becomes
    /// `floor(duration * frame_rate)`.
    pub fn set_frame_rate(
        &mut self,
        descriptor: &AnimationDescriptor,
        frame_rate: f64,
    ) -> Result<(), SpriteError> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(SpriteError::InvalidOption(format!(
                "frame rate must be positive (got {frame_rate})"
            )));
        }
        let frame_count = (descriptor.duration_secs() * frame_rate).floor();
        if frame_count > MAX_FRAME_COUNT as f64 {
            return Err(SpriteError::InvalidOption(format!(
                "{frame_rate} fps yields more than {MAX_FRAME_COUNT} frames"
            )));
        }
        self.target_frame_rate = frame_rate;
        self.target_frame_count = frame_count as u64;
        Ok(())
    }

    /// Mapping from output frames to source frames for this spec.
    pub fn mapping(&self, descriptor: &AnimationDescriptor) -> FrameMapping {
        compute_mapping(descriptor.source_frame_count, self.target_frame_count)
    }

    /// Delay between preview frames (`1000 / target_frame_rate` ms).
    pub fn preview_interval(&self) -> Duration {
        preview_interval(self.target_frame_rate)
    }
}

/// Delay between consecutive preview frames at `frame_rate` frames per second.
///
/// Non-positive rates fall back to one frame per second.
pub fn preview_interval(frame_rate: f64) -> Duration {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Duration::from_nanos((1_000_000_000.0 / frame_rate).round() as u64)
    } else {
        Duration::from_secs(1)
    }
}

fn scaled_dimension(intrinsic: u32, scale: f64) -> u32 {
    ((intrinsic as f64 * scale).round() as u32).max(1)
}

/// Operational settings for [`ExtractionPipeline`](crate::ExtractionPipeline).
///
/// All fields have sensible defaults: progress after every frame and no
/// capture timeout.
#[derive(Clone)]
pub struct PipelineOptions {
    /// How often to emit progress snapshots (every N attempted frames).
    pub(crate) batch_size: u64,
    /// Upper bound on a single capture. `None` waits indefinitely.
    pub(crate) capture_timeout: Option<Duration>,
}

impl Debug for PipelineOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("PipelineOptions")
            .field("batch_size", &self.batch_size)
            .field("has_capture_timeout", &self.capture_timeout.is_some())
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            batch_size: 1,
            capture_timeout: None,
        }
    }

    /// Set how often progress snapshots fire.
    ///
    /// A value of 1 means every frame; 10 means every 10th frame.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Treat a capture that takes longer than `timeout` as a failed frame.
    #[must_use]
    pub fn with_capture_timeout(mut self, timeout: Duration) -> Self {
        self.capture_timeout = Some(timeout);
        self
    }
}
