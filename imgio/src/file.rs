// SPDX-License-Identifier: MIT

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{
    ImgIO,
    errors::{ImgIOError, ImgIOResult},
    region::Region,
    store::{ImgStore, OpenMode},
};

/// `ImgIO` over any seekable std handle, optionally bounded to a region.
#[derive(Debug)]
pub struct StdImgIO<T: Read + Write + Seek> {
    io: T,
    partition_offset: u64,
    limit: Option<u64>,
}

impl<T: Read + Write + Seek> StdImgIO<T> {
    #[inline]
    pub fn new(io: T) -> Self {
        Self {
            io,
            partition_offset: 0,
            limit: None,
        }
    }

    #[inline]
    pub fn with_region(io: T, region: Region) -> Self {
        Self {
            io,
            partition_offset: region.offset,
            limit: Some(region.len),
        }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.io
    }

    #[inline]
    fn absolute(&self, offset: u64, len: usize) -> ImgIOResult<u64> {
        match self.limit {
            Some(limit) => Region::new(self.partition_offset, limit).check(offset, len),
            None => self
                .partition_offset
                .checked_add(offset)
                .ok_or(ImgIOError::OutOfBounds),
        }
    }
}

impl<T: Read + Write + Seek> ImgIO for StdImgIO<T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        let abs = self.absolute(offset, data.len())?;
        self.io.seek(SeekFrom::Start(abs))?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult {
        let abs = self.absolute(offset, buf.len())?;
        self.io.seek(SeekFrom::Start(abs))?;
        self.io.read_exact(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> ImgIOResult {
        self.io.flush()?;
        Ok(())
    }
}

/// Image stored in a host file. Each `open` opens the file again.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    region: Region,
}

impl FileStore {
    /// Store covering the whole file.
    pub fn new(path: impl AsRef<Path>) -> ImgIOResult<Self> {
        let path = path.as_ref().to_path_buf();
        let len = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            region: Region::whole(len),
        })
    }

    /// Store covering `region` of the file (a partition or embedded image).
    pub fn with_region(path: impl AsRef<Path>, region: Region) -> ImgIOResult<Self> {
        let whole = Self::new(path)?;
        let region = whole.region.sub(region.offset, region.len)?;
        Ok(Self {
            path: whole.path,
            region,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImgStore for FileStore {
    fn open(&self, mode: OpenMode) -> ImgIOResult<Box<dyn ImgIO>> {
        let file: File = OpenOptions::new()
            .read(true)
            .write(mode.writable())
            .open(&self.path)?;
        Ok(Box::new(StdImgIO::with_region(file, self.region)))
    }

    #[inline]
    fn region(&self) -> Region {
        self.region
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use tempfile::{NamedTempFile, tempfile};

    #[test]
    fn test_rw() {
        let file = tempfile().unwrap();
        let mut io = StdImgIO::new(file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_short_read_past_eof() {
        let file = tempfile().unwrap();
        let mut io = StdImgIO::new(file);
        io.write_at(0, &[1; 8]).unwrap();

        let mut output = [0u8; 16];
        assert_eq!(io.read_at(0, &mut output), Err(ImgIOError::ShortRead));
    }

    #[test]
    fn test_region_bounds() {
        let mut file = tempfile().unwrap();
        file.set_len(1024).unwrap();
        let mut io = StdImgIO::with_region(&mut file, Region::new(512, 256));

        io.write_at(0, &[0xAB; 4]).unwrap();
        assert_eq!(io.write_at(255, &[0; 2]), Err(ImgIOError::OutOfBounds));

        let mut raw = StdImgIO::new(&mut file);
        assert_eq!(raw.read_u32_at(512).unwrap(), 0xABABABAB);
    }

    #[test]
    fn test_file_store_reopens() {
        let tmp = NamedTempFile::new().unwrap();
        tmp.as_file().set_len(2048).unwrap();

        let store = FileStore::with_region(tmp.path(), Region::new(1024, 1024)).unwrap();
        {
            let mut io = store.open(OpenMode::ReadWrite).unwrap();
            io.write_at(0, b"FAT").unwrap();
            io.flush().unwrap();
        }

        let mut io = store.open(OpenMode::Read).unwrap();
        let mut out = [0u8; 3];
        io.read_at(0, &mut out).unwrap();
        assert_eq!(&out, b"FAT");
        assert!(io.write_at(0, b"x").is_err());

        assert!(FileStore::with_region(tmp.path(), Region::new(1024, 2048)).is_err());
    }
}
