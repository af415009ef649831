//! Archive export.
//!
//! Each exported frame becomes one archive entry named
//! `"{prefix}_{index}.png"`. Archives are assembled on a blocking thread via
//! `tokio::task::spawn_blocking` so compression never stalls the async
//! runtime. Exporting nothing is an error rather than an empty archive.
//!
//! The archive format is pluggable through [`ArchiveWriter`];
//! [`ZipArchiveWriter`] is used by default.
//!
//! # Example
//!
//! ```no_run
//! # async fn example(table: &lottie_sprites::FrameTable) -> Result<(), lottie_sprites::SpriteError> {
//! use lottie_sprites::export_all;
//!
//! let archive = export_all(table, "coin").await?;
//! assert_eq!(archive.file_name, "coin.zip");
//! archive.save(".")?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::SpriteError;
use crate::frame::{ExtractedFrame, FrameTable, ImageHandle};
use crate::selection::SelectionSet;

/// Prefix used when the caller supplies an empty one.
pub const DEFAULT_PREFIX: &str = "sprite";

/// Destination for named archive entries.
pub trait ArchiveWriter: Send + 'static {
    /// Append one entry.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SpriteError>;

    /// Finalize and return the archive bytes.
    fn finish(self) -> Result<Vec<u8>, SpriteError>;
}

/// In-memory zip archive.
///
/// PNG payloads are already compressed, so entries are stored as-is unless
/// [`deflated`](ZipArchiveWriter::deflated) is used.
pub struct ZipArchiveWriter {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipArchiveWriter {
    /// Writer storing entries uncompressed.
    pub fn new() -> Self {
        Self::with_method(CompressionMethod::Stored)
    }

    /// Writer deflating every entry.
    pub fn deflated() -> Self {
        Self::with_method(CompressionMethod::Deflated)
    }

    fn with_method(method: CompressionMethod) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(method),
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), SpriteError> {
        self.writer.start_file(name, self.options)?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, SpriteError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// A finished archive ready to be saved or offered for download.
#[derive(Debug, Clone)]
pub struct Archive {
    /// Suggested file name: `"{prefix}.zip"` or `"{prefix}_selected.zip"`.
    pub file_name: String,
    /// Archive contents.
    pub bytes: Vec<u8>,
}

impl Archive {
    /// Write the archive into `directory` under its file name.
    pub fn save<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, SpriteError> {
        let path = directory.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// One frame exported on its own as `"{prefix}_{index}.png"`.
#[derive(Debug, Clone)]
pub struct FrameFile {
    /// Suggested file name, identical to the frame's archive entry name.
    pub file_name: String,
    /// Encoded PNG.
    pub image: ImageHandle,
}

impl FrameFile {
    /// Write the PNG into `directory` under its file name.
    pub fn save<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, SpriteError> {
        let path = directory.as_ref().join(&self.file_name);
        std::fs::write(&path, self.image.bytes())?;
        log::info!("Saved {} ({} bytes)", path.display(), self.image.len());
        Ok(path)
    }
}

/// Entry name for output frame `index`.
pub fn entry_name(prefix: &str, index: u64) -> String {
    format!("{}_{index}.png", effective_prefix(prefix))
}

/// Archive file name for an export of everything or of a selection.
pub fn archive_name(prefix: &str, selected: bool) -> String {
    let prefix = effective_prefix(prefix);
    if selected {
        format!("{prefix}_selected.zip")
    } else {
        format!("{prefix}.zip")
    }
}

fn effective_prefix(prefix: &str) -> &str {
    let trimmed = prefix.trim();
    if trimmed.is_empty() {
        DEFAULT_PREFIX
    } else {
        trimmed
    }
}

/// Pack `frames` into a zip archive.
///
/// Fails with [`SpriteError::NothingToExport`] if `frames` is empty. Frames
/// sharing an index are written once.
pub async fn build_archive<'a, I>(frames: I, name_prefix: &str) -> Result<Vec<u8>, SpriteError>
where
    I: IntoIterator<Item = &'a ExtractedFrame>,
{
    build_archive_with(frames, name_prefix, ZipArchiveWriter::new()).await
}

/// Pack `frames` using a caller-supplied [`ArchiveWriter`].
pub async fn build_archive_with<'a, I, W>(
    frames: I,
    name_prefix: &str,
    mut writer: W,
) -> Result<Vec<u8>, SpriteError>
where
    I: IntoIterator<Item = &'a ExtractedFrame>,
    W: ArchiveWriter,
{
    let entries: BTreeMap<u64, ImageHandle> = frames
        .into_iter()
        .map(|frame| (frame.index, frame.image.clone()))
        .collect();

    if entries.is_empty() {
        return Err(SpriteError::NothingToExport);
    }

    let prefix = effective_prefix(name_prefix).to_string();
    log::debug!("Packing {} frames with prefix {:?}", entries.len(), prefix);

    tokio::task::spawn_blocking(move || {
        for (index, image) in &entries {
            writer.add_entry(&entry_name(&prefix, *index), image.bytes())?;
        }
        writer.finish()
    })
    .await
    .map_err(|error| SpriteError::ArchiveError(format!("archive task failed: {error}")))?
}

/// Export every frame in `table` as `"{prefix}.zip"`.
pub async fn export_all(table: &FrameTable, name_prefix: &str) -> Result<Archive, SpriteError> {
    let bytes = build_archive(table.iter(), name_prefix).await?;
    Ok(Archive {
        file_name: archive_name(name_prefix, false),
        bytes,
    })
}

/// Export the single frame at output `index` as `"{prefix}_{index}.png"`.
///
/// Fails with [`SpriteError::FrameNotFound`] if the current run produced no
/// frame at `index`.
pub fn export_frame(
    table: &FrameTable,
    index: u64,
    name_prefix: &str,
) -> Result<FrameFile, SpriteError> {
    let frame = table
        .frame(index)
        .ok_or(SpriteError::FrameNotFound { index })?;
    Ok(FrameFile {
        file_name: entry_name(name_prefix, index),
        image: frame.image.clone(),
    })
}

/// Export the selected frames as `"{prefix}_selected.zip"`.
///
/// A selection made against an earlier run fails with
/// [`SpriteError::StaleReference`].
pub async fn export_selection(
    table: &FrameTable,
    selection: &SelectionSet,
    name_prefix: &str,
) -> Result<Archive, SpriteError> {
    if selection.generation() != table.generation() {
        return Err(SpriteError::StaleReference {
            generation: selection.generation(),
            current: table.generation(),
        });
    }
    let frames = table.select(selection.current_selection());
    let bytes = build_archive(frames, name_prefix).await?;
    Ok(Archive {
        file_name: archive_name(name_prefix, true),
        bytes,
    })
}
