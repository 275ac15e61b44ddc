// SPDX-License-Identifier: MIT

//! Uniform browsing surface shared by every image kind.
//!
//! An [`Image`] hands out its root [`Directory`]; a directory is walked with a
//! [`DirIter`], which opens sub-directories, readers and writers. Path lookup
//! ([`find_path`]) is written once against these traits.

use std::io::Write;

use crate::core::errors::*;

/// What an iterator currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// "." and "..".
    DirSpecial,
    /// Volume labels, system entries, devices and the like.
    Special,
}

impl EntryKind {
    #[inline]
    pub fn is_dir(self) -> bool {
        matches!(self, EntryKind::Dir | EntryKind::DirSpecial)
    }
}

pub trait Image {
    /// Writes a description of the image, every line starting with `prefix`.
    fn print_info(&self, out: &mut dyn Write, prefix: &str) -> FsResult;

    fn root_directory(&self) -> FsResult<Box<dyn Directory>>;
}

pub trait Directory {
    /// Iterator positioned on the first visible entry.
    fn begin(&self) -> FsResult<Box<dyn DirIter>>;

    /// Creates `name`, or returns it when a directory of that name exists.
    fn make_dir(&mut self, name: &str) -> FsResult<Box<dyn Directory>>;

    /// Creates `name`, or truncates it when a file of that name exists.
    fn file_writer(&mut self, name: &str) -> FsResult<Box<dyn FileWriter>>;
}

pub trait DirIter {
    fn compare_to_name(&self, name: &str) -> bool;
    fn end(&self) -> bool;

    /// Moves to the next visible entry.
    fn next(&mut self) -> FsResult;

    fn name(&self) -> String;
    fn kind(&self) -> EntryKind;

    /// Size in bytes of the current entry (0 for directories).
    fn size(&self) -> u64;

    fn directory(&self) -> FsResult<Box<dyn Directory>>;
    fn file_reader(&self) -> FsResult<Box<dyn FileReader>>;

    /// Writes one listing line for the current entry.
    fn list(&self, out: &mut dyn Write) -> FsResult;

    /// Deletes the current entry. Directories must be empty.
    fn remove(&mut self) -> FsResult;
}

pub trait FileReader {
    /// Fills `buf` as far as the file allows. Returns 0 at end of file.
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;
}

/// Nothing written is guaranteed to reach the image before [`FileWriter::close`].
pub trait FileWriter {
    fn write(&mut self, buf: &[u8]) -> FsResult<usize>;

    /// Flushes the last data, the size and the metadata. Dropping a writer
    /// without closing it discards the pending state.
    fn close(self: Box<Self>) -> FsResult;
}

/// Result of [`find_path`].
pub enum Found {
    /// `entry` points at the directory in its parent; `None` for the root.
    Dir {
        dir: Box<dyn Directory>,
        entry: Option<Box<dyn DirIter>>,
    },
    File(Box<dyn DirIter>),
}

/// Looks `name` up in `dir`. Returns an iterator positioned on it.
pub fn find_entry(dir: &dyn Directory, name: &str) -> FsResult<Option<Box<dyn DirIter>>> {
    let mut it = dir.begin()?;
    while !it.end() {
        if it.compare_to_name(name) {
            return Ok(Some(it));
        }
        it.next()?;
    }
    Ok(None)
}

/// Resolves `components` from `root`.
///
/// An empty path is the root itself. Files may only appear as the last
/// component, and not at all when `path_is_dir` is set.
pub fn find_path(
    root: Box<dyn Directory>,
    components: &[&str],
    path_is_dir: bool,
) -> FsResult<Found> {
    let mut dir = root;
    let mut entry = None;

    for (i, name) in components.iter().enumerate() {
        let Some(it) = find_entry(dir.as_ref(), name)? else {
            return Err(FsPathError::NotFound.into());
        };

        if it.kind().is_dir() {
            dir = it.directory()?;
            entry = Some(it);
            continue;
        }

        let is_last = i + 1 == components.len();
        if !is_last || path_is_dir {
            return Err(FsPathError::NotADirectory.into());
        }
        return Ok(Found::File(it));
    }

    Ok(Found::Dir { dir, entry })
}
