//! Extracted frames and the generation-tagged frame table.
//!
//! Every successful capture becomes an [`ExtractedFrame`] holding an
//! [`ImageHandle`] (shared ownership of the encoded PNG bytes). The
//! [`FrameTable`] owns those frames between runs. Clearing the table drops
//! its handles and bumps the table's generation, so a [`FrameKey`] taken
//! during an earlier run fails with
//! [`SpriteError::StaleReference`] instead of resolving to a different
//! run's bytes.

use std::collections::BTreeMap;
use std::io::Cursor;
use std::sync::{Arc, Weak};

use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage};

use crate::error::SpriteError;

/// Shared ownership of one rasterized frame, stored as encoded PNG.
///
/// Cloning is cheap. The bytes are freed when the last clone is dropped;
/// use [`downgrade`](ImageHandle::downgrade) to observe that.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    bytes: Arc<[u8]>,
}

impl ImageHandle {
    /// Wrap bytes produced by a renderer capture.
    pub fn from_png_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::from(bytes),
        }
    }

    /// Encode an RGBA buffer as PNG.
    pub fn from_rgba(image: &RgbaImage) -> Result<Self, SpriteError> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(Self::from_png_bytes(buffer.into_inner()))
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded payload.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read `(width, height)` from the image header without decoding pixels.
    pub fn dimensions(&self) -> Result<(u32, u32), SpriteError> {
        let reader = ImageReader::new(Cursor::new(self.bytes())).with_guessed_format()?;
        Ok(reader.into_dimensions()?)
    }

    /// Fully decode the frame.
    pub fn decode(&self) -> Result<DynamicImage, SpriteError> {
        Ok(image::load_from_memory(self.bytes())?)
    }

    /// Weak reference that stops resolving once every handle is dropped.
    pub fn downgrade(&self) -> WeakImageHandle {
        WeakImageHandle {
            bytes: Arc::downgrade(&self.bytes),
        }
    }
}

/// Non-owning reference to an [`ImageHandle`]'s bytes.
#[derive(Debug, Clone)]
pub struct WeakImageHandle {
    bytes: Weak<[u8]>,
}

impl WeakImageHandle {
    /// Returns `true` once the bytes have been freed.
    pub fn is_released(&self) -> bool {
        self.bytes.strong_count() == 0
    }

    /// Recover a strong handle if the bytes are still alive.
    pub fn upgrade(&self) -> Option<ImageHandle> {
        self.bytes.upgrade().map(|bytes| ImageHandle { bytes })
    }
}

/// One captured output frame.
#[derive(Debug, Clone)]
pub struct ExtractedFrame {
    /// Output index (position in the resampled sequence).
    pub index: u64,
    /// Source animation frame that was rendered.
    pub source_index: u64,
    /// Frame-table generation that produced this frame.
    pub generation: u64,
    /// Encoded image.
    pub image: ImageHandle,
}

impl ExtractedFrame {
    /// Key addressing this frame in its table.
    pub fn key(&self) -> FrameKey {
        FrameKey {
            index: self.index,
            generation: self.generation,
        }
    }
}

/// Generation-tagged reference to a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameKey {
    /// Output index.
    pub index: u64,
    /// Table generation the key was issued for.
    pub generation: u64,
}

/// Output-index → frame table for the current run.
#[derive(Debug, Default)]
pub struct FrameTable {
    generation: u64,
    frames: BTreeMap<u64, ExtractedFrame>,
}

impl FrameTable {
    /// Create an empty table at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current generation. Increases on every [`clear`](FrameTable::clear).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of stored frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns `true` if no frames are stored.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Returns `true` if a frame exists at `index` in the current generation.
    pub fn contains(&self, index: u64) -> bool {
        self.frames.contains_key(&index)
    }

    /// Key for the frame at `index`, if present.
    pub fn key(&self, index: u64) -> Option<FrameKey> {
        self.frames.get(&index).map(ExtractedFrame::key)
    }

    /// Look up a frame, failing fast on keys from an older generation.
    pub fn get(&self, key: FrameKey) -> Result<Option<&ExtractedFrame>, SpriteError> {
        if key.generation != self.generation {
            return Err(SpriteError::StaleReference {
                generation: key.generation,
                current: self.generation,
            });
        }
        Ok(self.frames.get(&key.index))
    }

    /// Frame at `index` in the current generation.
    pub fn frame(&self, index: u64) -> Option<&ExtractedFrame> {
        self.frames.get(&index)
    }

    /// Frames in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = &ExtractedFrame> {
        self.frames.values()
    }

    /// Stored indices in ascending order.
    pub fn indices(&self) -> Vec<u64> {
        self.frames.keys().copied().collect()
    }

    /// Frames whose index is in `indices`, ascending, skipping absent ones.
    pub fn select<'a, I>(&'a self, indices: I) -> Vec<&'a ExtractedFrame>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut wanted: Vec<u64> = indices.into_iter().collect();
        wanted.sort_unstable();
        wanted.dedup();
        wanted
            .into_iter()
            .filter_map(|index| self.frames.get(&index))
            .collect()
    }

    /// Store a capture for the current generation, releasing any frame
    /// already held at `index`.
    pub(crate) fn insert(&mut self, index: u64, source_index: u64, image: ImageHandle) {
        let frame = ExtractedFrame {
            index,
            source_index,
            generation: self.generation,
            image,
        };
        if let Some(previous) = self.frames.remove(&index) {
            log::trace!("Releasing frame {} before overwrite", previous.index);
            drop(previous);
        }
        self.frames.insert(index, frame);
    }

    /// Release every frame and start a new generation.
    pub(crate) fn clear(&mut self) {
        if !self.frames.is_empty() {
            log::trace!(
                "Releasing {} frames from generation {}",
                self.frames.len(),
                self.generation
            );
        }
        self.frames.clear();
        self.generation += 1;
    }
}
