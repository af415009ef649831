//! Animation and resample validation.
//!
//! [`validate`] inspects a descriptor (and optionally the resample spec about
//! to be used) and returns a [`ValidationReport`] describing it and any
//! potential issues before an extraction is started.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::AnimationDescriptor;
//!
//! let descriptor = AnimationDescriptor::new("coin.json", 128, 128, 48, 24.0)?;
//! let report = descriptor.validate();
//! assert!(report.is_valid());
//! print!("{report}");
//! # Ok::<(), lottie_sprites::SpriteError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::configuration::ResampleSpec;
use crate::descriptor::AnimationDescriptor;

/// Largest output edge before a size warning is raised.
const LARGE_DIMENSION: u32 = 4096;

/// Frame rate above which a warning is raised.
const HIGH_FRAME_RATE: f64 = 120.0;

/// Output frame count above which a warning is raised.
const MANY_FRAMES: u64 = 1000;

/// Summary of validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that may affect the result.
    pub warnings: Vec<String>,
    /// Fatal issues that will prevent extraction.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

impl AnimationDescriptor {
    /// Validate the animation as authored.
    pub fn validate(&self) -> ValidationReport {
        validate(self, &ResampleSpec::for_descriptor(self))
    }
}

/// Check `descriptor` together with the `spec` an extraction would use.
pub fn validate(descriptor: &AnimationDescriptor, spec: &ResampleSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Source ─────────────────────────────────────────────────────
    report.info.push(format!(
        "Source: {}x{}, {} frames at {} fps ({:.3}s)",
        descriptor.intrinsic_width,
        descriptor.intrinsic_height,
        descriptor.source_frame_count,
        descriptor.source_frame_rate,
        descriptor.duration_secs(),
    ));

    if descriptor.source_frame_count == 1 {
        report
            .warnings
            .push("Animation has a single frame; every output frame will be identical".into());
    }

    if descriptor.source_frame_rate > HIGH_FRAME_RATE {
        report.warnings.push(format!(
            "Unusually high source frame rate: {} fps",
            descriptor.source_frame_rate
        ));
    }

    // ── Output ─────────────────────────────────────────────────────
    report.info.push(format!(
        "Output: {}x{} (scale {}), {} frames at {} fps",
        spec.output_width,
        spec.output_height,
        spec.scale,
        spec.target_frame_count,
        spec.target_frame_rate,
    ));

    if spec.target_frame_count == 0 {
        report.errors.push(format!(
            "No output frames: {:.3}s at {} fps rounds down to zero",
            descriptor.duration_secs(),
            spec.target_frame_rate
        ));
    } else if spec.target_frame_count > descriptor.source_frame_count {
        report.info.push(format!(
            "Upsampling {} -> {} frames repeats source frames",
            descriptor.source_frame_count, spec.target_frame_count
        ));
    } else if spec.target_frame_count < descriptor.source_frame_count {
        report.info.push(format!(
            "Downsampling {} -> {} frames skips source frames",
            descriptor.source_frame_count, spec.target_frame_count
        ));
    }

    if spec.target_frame_count > MANY_FRAMES {
        report.warnings.push(format!(
            "{} output frames; extraction may take a while",
            spec.target_frame_count
        ));
    }

    if spec.output_width > LARGE_DIMENSION || spec.output_height > LARGE_DIMENSION {
        report.warnings.push(format!(
            "Large output size {}x{}",
            spec.output_width, spec.output_height
        ));
    }

    report
}
