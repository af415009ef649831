//! Animation descriptor parsing.
//!
//! Only four numeric facts of a Lottie document matter to frame extraction:
//! canvas size (`w`, `h`), frame rate (`fr`), and the in/out points
//! (`ip`, `op`). [`AnimationDescriptor`] captures them once per load and is
//! replaced wholesale when a different animation is loaded.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::AnimationDescriptor;
//!
//! let json = br#"{"v":"5.7.4","w":512,"h":256,"fr":30,"ip":0,"op":59,"layers":[]}"#;
//! let descriptor = AnimationDescriptor::from_json("wave.json", json)?;
//! assert_eq!(descriptor.source_frame_count, 60);
//! assert_eq!(descriptor.duration().as_secs(), 2);
//! # Ok::<(), lottie_sprites::SpriteError>(())
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::SpriteError;

/// Largest frame count accepted for a source animation or a resampled output.
pub const MAX_FRAME_COUNT: u64 = 1_000_000;

/// Top-level Lottie fields needed to plan an extraction. Everything else in
/// the document is left for the renderer.
#[derive(Debug, Deserialize)]
struct LottieHeader {
    w: f64,
    h: f64,
    fr: f64,
    ip: f64,
    op: f64,
}

/// Immutable facts about a loaded animation.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct AnimationDescriptor {
    /// Where the animation was loaded from; handed to the renderer verbatim.
    pub source_url: String,
    /// Canvas width in pixels.
    pub intrinsic_width: u32,
    /// Canvas height in pixels.
    pub intrinsic_height: u32,
    /// `op - ip + 1`.
    pub source_frame_count: u64,
    /// Frames per second the animation was authored at.
    pub source_frame_rate: f64,
}

impl AnimationDescriptor {
    /// Build a descriptor from already-known values.
    pub fn new(
        source_url: impl Into<String>,
        intrinsic_width: u32,
        intrinsic_height: u32,
        source_frame_count: u64,
        source_frame_rate: f64,
    ) -> Result<Self, SpriteError> {
        if intrinsic_width == 0 || intrinsic_height == 0 {
            return Err(SpriteError::InvalidDescriptor(format!(
                "canvas must be at least 1x1 (got {intrinsic_width}x{intrinsic_height})"
            )));
        }
        if !source_frame_rate.is_finite() || source_frame_rate <= 0.0 {
            return Err(SpriteError::InvalidDescriptor(format!(
                "frame rate must be positive (got {source_frame_rate})"
            )));
        }
        if source_frame_count > MAX_FRAME_COUNT {
            return Err(SpriteError::InvalidDescriptor(format!(
                "{source_frame_count} frames exceeds the limit of {MAX_FRAME_COUNT}"
            )));
        }

        Ok(Self {
            source_url: source_url.into(),
            intrinsic_width,
            intrinsic_height,
            source_frame_count,
            source_frame_rate,
        })
    }

    /// Parse the header of a Lottie JSON document.
    pub fn from_json(source_url: impl Into<String>, bytes: &[u8]) -> Result<Self, SpriteError> {
        let source_url = source_url.into();
        let header: LottieHeader = serde_json::from_slice(bytes)?;

        if !header.ip.is_finite() || !header.op.is_finite() || header.op < header.ip {
            return Err(SpriteError::InvalidDescriptor(format!(
                "out point ({}) precedes in point ({})",
                header.op, header.ip
            )));
        }
        if !(header.w >= 1.0 && header.h >= 1.0) {
            return Err(SpriteError::InvalidDescriptor(format!(
                "canvas must be at least 1x1 (got {}x{})",
                header.w, header.h
            )));
        }

        let span = (header.op - header.ip).floor();
        let frame_count = (span < MAX_FRAME_COUNT as f64)
            .then(|| (span as u64).checked_add(1))
            .flatten()
            .ok_or_else(|| {
                SpriteError::InvalidDescriptor(format!(
                    "in/out points {}..{} span more than {MAX_FRAME_COUNT} frames",
                    header.ip, header.op
                ))
            })?;
        log::debug!(
            "Parsed animation {} ({}x{}, {} frames at {} fps)",
            source_url,
            header.w,
            header.h,
            frame_count,
            header.fr,
        );

        Self::new(
            source_url,
            header.w.round() as u32,
            header.h.round() as u32,
            frame_count,
            header.fr,
        )
    }

    /// Read and parse a Lottie JSON file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SpriteError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Self::from_json(path.display().to_string(), &bytes)
    }

    /// Playback length in seconds (`source_frame_count / source_frame_rate`).
    pub fn duration_secs(&self) -> f64 {
        self.source_frame_count as f64 / self.source_frame_rate
    }

    /// Playback length.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        self.intrinsic_width as f64 / self.intrinsic_height as f64
    }
}
