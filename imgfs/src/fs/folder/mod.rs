// SPDX-License-Identifier: MIT

//! A host directory seen through the browsing traits.
//!
//! Entries are read once per iterator and sorted by name for deterministic
//! output. Names are matched exactly.

use std::{
    fs::{self, File},
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::core::{
    errors::*,
    image::*,
    utils::{size_utils::num_bytes_to_str, time_utils::systemtime_to_offsetdatetime},
};

/// Image rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalFolder {
    root: PathBuf,
}

impl LocalFolder {
    pub fn open(path: impl AsRef<Path>) -> FsResult<Self> {
        let root = path.as_ref().to_path_buf();
        ensure!(fs::metadata(&root)?.is_dir(), FsPathError::NotADirectory);
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Image for LocalFolder {
    fn print_info(&self, out: &mut dyn Write, prefix: &str) -> FsResult {
        writeln!(out, "{prefix}LOCAL FOLDER: {}", self.root.display())?;
        Ok(())
    }

    fn root_directory(&self) -> FsResult<Box<dyn Directory>> {
        Ok(Box::new(FolderDir::new(self.root.clone())))
    }
}

#[derive(Debug, Clone)]
pub struct FolderDir {
    path: PathBuf,
}

impl FolderDir {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_entries(&self) -> FsResult<Vec<FolderEntry>> {
        let mut res = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|_| FsStateError::Unsupported)?;
            let meta = entry.metadata()?;
            let kind = if meta.is_dir() {
                EntryKind::Dir
            } else if meta.is_file() {
                EntryKind::File
            } else {
                EntryKind::Special
            };
            let size = if meta.is_file() { meta.len() } else { 0 };
            let modified = meta.modified().ok().map(systemtime_to_offsetdatetime);
            res.push(FolderEntry {
                name,
                kind,
                size,
                modified,
            });
        }
        res.sort_unstable_by(|a, b| a.name.cmp(&b.name));
        Ok(res)
    }
}

impl Directory for FolderDir {
    fn begin(&self) -> FsResult<Box<dyn DirIter>> {
        Ok(Box::new(FolderIter {
            dir: self.path.clone(),
            entries: self.read_entries()?,
            idx: 0,
        }))
    }

    fn make_dir(&mut self, name: &str) -> FsResult<Box<dyn Directory>> {
        let path = self.path.join(name);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => bail!(FsStateError::NameClash),
            Err(e) if e.kind() == ErrorKind::NotFound => fs::create_dir(&path)?,
            Err(e) => return Err(e.into()),
        }
        Ok(Box::new(FolderDir::new(path)))
    }

    fn file_writer(&mut self, name: &str) -> FsResult<Box<dyn FileWriter>> {
        let path = self.path.join(name);
        if let Ok(meta) = fs::metadata(&path) {
            ensure!(!meta.is_dir(), FsStateError::IsDirectory);
            ensure!(!meta.permissions().readonly(), FsStateError::ReadOnly);
        }
        Ok(Box::new(FolderWriter {
            file: File::create(&path)?,
        }))
    }
}

#[derive(Debug, Clone)]
struct FolderEntry {
    name: String,
    kind: EntryKind,
    size: u64,
    modified: Option<OffsetDateTime>,
}

pub struct FolderIter {
    dir: PathBuf,
    entries: Vec<FolderEntry>,
    idx: usize,
}

impl FolderIter {
    fn current(&self) -> FsResult<&FolderEntry> {
        self.entries
            .get(self.idx)
            .ok_or(FsError::Other("Iterator is past the last entry"))
    }

    fn current_path(&self) -> FsResult<PathBuf> {
        Ok(self.dir.join(&self.current()?.name))
    }
}

impl DirIter for FolderIter {
    fn compare_to_name(&self, name: &str) -> bool {
        self.entries.get(self.idx).is_some_and(|e| e.name == name)
    }

    fn end(&self) -> bool {
        self.idx >= self.entries.len()
    }

    fn next(&mut self) -> FsResult {
        if !self.end() {
            self.idx += 1;
        }
        Ok(())
    }

    fn name(&self) -> String {
        self.entries
            .get(self.idx)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    fn kind(&self) -> EntryKind {
        self.entries
            .get(self.idx)
            .map_or(EntryKind::Special, |e| e.kind)
    }

    fn size(&self) -> u64 {
        self.entries.get(self.idx).map_or(0, |e| e.size)
    }

    fn directory(&self) -> FsResult<Box<dyn Directory>> {
        ensure!(self.kind() == EntryKind::Dir, FsPathError::NotADirectory);
        Ok(Box::new(FolderDir::new(self.current_path()?)))
    }

    fn file_reader(&self) -> FsResult<Box<dyn FileReader>> {
        ensure!(self.kind() == EntryKind::File, FsPathError::NotAFile);
        Ok(Box::new(FolderReader {
            file: File::open(self.current_path()?)?,
        }))
    }

    fn list(&self, out: &mut dyn Write) -> FsResult {
        let entry = self.current()?;
        let flag = match entry.kind {
            EntryKind::Dir | EntryKind::DirSpecial => 'd',
            EntryKind::File => 'f',
            EntryKind::Special => '?',
        };
        let stamp = entry.modified.map_or_else(
            || " ".repeat(18),
            |t| {
                format!(
                    "{:02}/{:02}/{:02}  {:02}:{:02}:{:02}",
                    t.day(),
                    u8::from(t.month()),
                    t.year().rem_euclid(100),
                    t.hour(),
                    t.minute(),
                    t.second()
                )
            },
        );
        writeln!(
            out,
            "{flag}  {:>10}  {stamp}  {}",
            num_bytes_to_str(entry.size),
            entry.name
        )?;
        Ok(())
    }

    fn remove(&mut self) -> FsResult {
        let path = self.current_path()?;
        match self.kind() {
            EntryKind::File => fs::remove_file(&path)?,
            EntryKind::Dir => {
                ensure!(fs::read_dir(&path)?.next().is_none(), FsStateError::NotEmpty);
                fs::remove_dir(&path)?;
            }
            EntryKind::DirSpecial | EntryKind::Special => bail!(FsStateError::Special),
        }
        log::debug!("{} removed", path.display());
        Ok(())
    }
}

pub struct FolderReader {
    file: File,
}

impl FileReader for FolderReader {
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let mut done = 0;
        while done < buf.len() {
            match self.file.read(&mut buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(done)
    }
}

pub struct FolderWriter {
    file: File,
}

impl FileWriter for FolderWriter {
    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn close(mut self: Box<Self>) -> FsResult {
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(dir: &dyn Directory) -> Vec<String> {
        let mut it = dir.begin().unwrap();
        let mut out = Vec::new();
        while !it.end() {
            out.push(it.name());
            it.next().unwrap();
        }
        out
    }

    #[test]
    fn test_listing_is_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.txt"), b"bb").unwrap();
        fs::write(tmp.path().join("a.txt"), b"a").unwrap();
        fs::create_dir(tmp.path().join("c")).unwrap();

        let img = LocalFolder::open(tmp.path()).unwrap();
        let root = img.root_directory().unwrap();
        assert_eq!(names(root.as_ref()), ["a.txt", "b.txt", "c"]);

        let mut it = root.begin().unwrap();
        it.next().unwrap();
        assert_eq!(it.kind(), EntryKind::File);
        assert_eq!(it.size(), 2);
        it.next().unwrap();
        assert_eq!(it.kind(), EntryKind::Dir);
    }

    #[test]
    fn test_make_dir_is_idempotent_and_clashes_with_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("f"), b"x").unwrap();
        let mut root = LocalFolder::open(tmp.path())
            .unwrap()
            .root_directory()
            .unwrap();

        root.make_dir("d").unwrap();
        root.make_dir("d").unwrap();
        assert!(tmp.path().join("d").is_dir());
        assert_eq!(
            root.make_dir("f").err(),
            Some(FsError::State(FsStateError::NameClash))
        );
    }

    #[test]
    fn test_write_then_read() {
        let tmp = tempfile::tempdir().unwrap();
        let mut root = LocalFolder::open(tmp.path())
            .unwrap()
            .root_directory()
            .unwrap();

        let mut w = root.file_writer("data.bin").unwrap();
        w.write(&[7u8; 5000]).unwrap();
        w.close().unwrap();

        let it = find_entry(root.as_ref(), "data.bin").unwrap().unwrap();
        let mut r = it.file_reader().unwrap();
        let mut buf = vec![0u8; 8192];
        assert_eq!(r.read(&mut buf).unwrap(), 5000);
        assert!(buf[..5000].iter().all(|&b| b == 7));
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_remove_refuses_non_empty_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("full")).unwrap();
        fs::write(tmp.path().join("full/x"), b"x").unwrap();
        let root = LocalFolder::open(tmp.path())
            .unwrap()
            .root_directory()
            .unwrap();

        let mut it = find_entry(root.as_ref(), "full").unwrap().unwrap();
        assert_eq!(it.remove(), Err(FsError::State(FsStateError::NotEmpty)));

        let mut inner = it.directory().unwrap().begin().unwrap();
        inner.remove().unwrap();
        it.remove().unwrap();
        assert!(!tmp.path().join("full").exists());
    }

    #[test]
    fn test_list_line() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("big.bin"), vec![0u8; 2048]).unwrap();
        let root = LocalFolder::open(tmp.path())
            .unwrap()
            .root_directory()
            .unwrap();

        let it = find_entry(root.as_ref(), "big.bin").unwrap().unwrap();
        let mut out = Vec::new();
        it.list(&mut out).unwrap();
        let line = String::from_utf8(out).unwrap();
        assert!(line.starts_with("f        2.0K  "), "{line}");
        assert!(line.trim_end().ends_with("  big.bin"), "{line}");
        assert_eq!(line.matches('/').count(), 2, "{line}");
    }

    #[test]
    fn test_print_info() {
        let tmp = tempfile::tempdir().unwrap();
        let img = LocalFolder::open(tmp.path()).unwrap();
        let mut out = Vec::new();
        img.print_info(&mut out, "> ").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("> LOCAL FOLDER: "));
    }
}
