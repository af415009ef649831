//! Source-to-output frame resampling.
//!
//! [`compute_mapping`] decides, for every output sample, which source frame
//! of the animation should be rendered when the output frame count differs
//! from the source frame count. Downsampling keeps the nearest preceding
//! source frame; upsampling repeats source frames. Nothing is blended: the
//! renderer only supports discrete seeks.
//!
//! # Example
//!
//! ```
//! use lottie_sprites::compute_mapping;
//!
//! let mapping = compute_mapping(10, 5);
//! assert_eq!(mapping.source_indices(), &[0, 2, 4, 6, 8]);
//! ```

/// Output-index to source-index table produced by [`compute_mapping`].
///
/// Entry `i` is the source frame to render for output frame `i`. Every entry
/// lies in `[0, source_frame_count)` and the entries never decrease.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[must_use]
pub struct FrameMapping {
    source_frame_count: u64,
    sources: Vec<u64>,
}

impl FrameMapping {
    /// Number of output frames.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no output frames.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source frame for output frame `output_index`.
    pub fn get(&self, output_index: u64) -> Option<u64> {
        usize::try_from(output_index)
            .ok()
            .and_then(|i| self.sources.get(i).copied())
    }

    /// All source indices in output order.
    pub fn source_indices(&self) -> &[u64] {
        &self.sources
    }

    /// Number of frames in the source animation this mapping points into.
    pub fn source_frame_count(&self) -> u64 {
        self.source_frame_count
    }

    /// Iterate `(output_index, source_index)` pairs in ascending output order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.sources
            .iter()
            .enumerate()
            .map(|(output, &source)| (output as u64, source))
    }
}

/// Compute the resample mapping from `source_frame_count` frames to
/// `target_frame_count` frames.
///
/// - equal counts give the identity;
/// - fewer target frames: `step = source / target`, `map[i] = floor(i * step)`;
/// - more target frames: `step = target / source`, `map[i] = floor(i / step)`.
///
/// `step` is a real number and both branches clamp to
/// `source_frame_count - 1` so floating-point error on the last samples
/// cannot escape the source range. A zero count on either side yields an
/// empty mapping.
pub fn compute_mapping(source_frame_count: u64, target_frame_count: u64) -> FrameMapping {
    if target_frame_count == 0 || source_frame_count == 0 {
        return FrameMapping {
            source_frame_count,
            sources: Vec::new(),
        };
    }

    let last = source_frame_count - 1;
    let sources: Vec<u64> = if source_frame_count == target_frame_count {
        (0..target_frame_count).collect()
    } else if source_frame_count > target_frame_count {
        let step = source_frame_count as f64 / target_frame_count as f64;
        (0..target_frame_count)
            .map(|i| ((i as f64 * step).floor() as u64).min(last))
            .collect()
    } else {
        let step = target_frame_count as f64 / source_frame_count as f64;
        (0..target_frame_count)
            .map(|i| ((i as f64 / step).floor() as u64).min(last))
            .collect()
    };

    log::debug!(
        "Computed frame mapping ({} source frames -> {} output frames)",
        source_frame_count,
        target_frame_count,
    );

    FrameMapping {
        source_frame_count,
        sources,
    }
}
