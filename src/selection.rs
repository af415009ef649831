//! Frame selection and preview.
//!
//! [`SelectionSet`] records which extracted frames are chosen for export.
//! It is bound to one frame-table generation: toggles against a table from
//! another run are ignored, and a new run empties it.
//!
//! [`SelectionModel`] pairs a selection with a [`PreviewCycle`]. Every change
//! to the selection stops the running preview and, if anything is still
//! selected, starts a new one over the selected frames in ascending order.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::configuration::preview_interval;
use crate::frame::{FrameTable, ImageHandle};
use crate::preview::{PreviewCycle, PreviewSink};

/// Output indices chosen for export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    generation: u64,
    indices: BTreeSet<u64>,
}

impl SelectionSet {
    /// Empty selection bound to the table generation `generation`.
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            indices: BTreeSet::new(),
        }
    }

    /// Table generation this selection belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Flip membership of `index`.
    ///
    /// Ignored (returns `false`) if `table` has no frame at `index` or belongs
    /// to a different generation.
    pub fn toggle(&mut self, index: u64, table: &FrameTable) -> bool {
        if table.generation() != self.generation || !table.contains(index) {
            log::debug!("Ignoring toggle of frame {} (not in current table)", index);
            return false;
        }
        if !self.indices.remove(&index) {
            self.indices.insert(index);
        }
        true
    }

    /// Returns `true` if `index` is selected.
    pub fn contains(&self, index: u64) -> bool {
        self.indices.contains(&index)
    }

    /// Number of selected frames.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected indices in ascending order.
    pub fn current_selection(&self) -> Vec<u64> {
        self.indices.iter().copied().collect()
    }

    /// Select every frame in `table`, rebinding to its generation.
    pub fn select_all(&mut self, table: &FrameTable) {
        self.generation = table.generation();
        self.indices = table.indices().into_iter().collect();
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Empty the selection and bind it to `generation`.
    pub fn rebind(&mut self, generation: u64) {
        self.generation = generation;
        self.indices.clear();
    }
}

/// Selection plus preview playback.
#[derive(Debug)]
pub struct SelectionModel {
    set: SelectionSet,
    preview: PreviewCycle,
    frame_rate: f64,
}

impl SelectionModel {
    /// Create an empty model previewing on `sink` at `frame_rate` fps.
    pub fn new(sink: Arc<dyn PreviewSink>, frame_rate: f64) -> Self {
        Self {
            set: SelectionSet::default(),
            preview: PreviewCycle::new(sink),
            frame_rate,
        }
    }

    /// The underlying selection.
    pub fn selection(&self) -> &SelectionSet {
        &self.set
    }

    /// Selected indices in ascending order.
    pub fn current_selection(&self) -> Vec<u64> {
        self.set.current_selection()
    }

    /// Delay between preview frames.
    pub fn preview_interval(&self) -> Duration {
        preview_interval(self.frame_rate)
    }

    /// Returns `true` while a preview cycle is running.
    pub fn is_previewing(&self) -> bool {
        self.preview.is_running()
    }

    /// Change the preview rate. Takes effect on the next selection change.
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_rate = frame_rate;
    }

    /// Flip membership of `index` and refresh the preview.
    ///
    /// Returns `false` and leaves everything untouched if `table` has no such
    /// frame.
    pub fn toggle(&mut self, index: u64, table: &FrameTable) -> bool {
        let changed = self.set.toggle(index, table);
        if changed {
            self.refresh(table);
        }
        changed
    }

    /// Select every extracted frame and refresh the preview.
    pub fn select_all(&mut self, table: &FrameTable) {
        self.set.select_all(table);
        self.refresh(table);
    }

    /// Deselect everything; the preview stops and is hidden.
    pub fn clear(&mut self, table: &FrameTable) {
        self.set.clear();
        self.refresh(table);
    }

    /// Forget the selection after `table` was cleared or refilled, and stop
    /// the preview.
    pub fn rebind(&mut self, table: &FrameTable) {
        self.set.rebind(table.generation());
        self.preview.stop();
    }

    /// Preview every frame in `table` without touching the selection.
    ///
    /// Used right after a run completes.
    pub fn preview_all(&mut self, table: &FrameTable) {
        let frames = table
            .iter()
            .map(|frame| (frame.index, frame.image.clone()))
            .collect();
        self.preview.restart(frames, self.preview_interval());
    }

    /// Stop the preview and hide it.
    pub fn stop_preview(&mut self) {
        self.preview.stop();
    }

    fn refresh(&mut self, table: &FrameTable) {
        let frames: Vec<(u64, ImageHandle)> = table
            .select(self.set.current_selection())
            .into_iter()
            .map(|frame| (frame.index, frame.image.clone()))
            .collect();
        self.preview.restart(frames, self.preview_interval());
    }
}
