// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::{
    core::{errors::*, image::FileWriter},
    fs::fat1216::{
        allocator::*,
        dir::SharedDirStore,
        types::Geometry,
        volume::SharedVolume,
    },
};

/// Writes a file one cluster at a time.
///
/// A cluster is only claimed when the buffer is full and more data arrives.
/// The entry size, the directory blocks and the table reach the image in
/// [`FileWriter::close`]; dropping the writer leaves them untouched.
pub struct Fat1216Writer {
    vol: SharedVolume,
    dir: SharedDirStore,
    io: Box<dyn ImgIO>,
    geo: Geometry,
    entry_pos: usize,
    buf: Vec<u8>,
    pos: usize,
    size: u32,
    cluster: u16,
    clusters: u32,
}

impl Fat1216Writer {
    pub(crate) fn new(
        vol: SharedVolume,
        dir: SharedDirStore,
        io: Box<dyn ImgIO>,
        geo: Geometry,
        entry_pos: usize,
        cluster: u16,
    ) -> Self {
        Self {
            vol,
            dir,
            io,
            buf: vec![0u8; geo.cluster_size()],
            geo,
            entry_pos,
            pos: 0,
            size: 0,
            cluster,
            clusters: 1,
        }
    }

    /// Writes the buffered bytes to the current cluster, then optionally
    /// claims and links the next one.
    fn write_cluster(&mut self, chain: bool) -> FsResult {
        self.size = u32::try_from(self.size as u64 + self.pos as u64)
            .map_err(|_| FsCapacityError::FileTooLarge)?;
        self.io
            .write_at(self.geo.cluster_offset(self.cluster), &self.buf[..self.pos])?;

        if chain {
            let mut vol = self.vol.borrow_mut();
            let table = vol.table(self.io.as_mut())?;
            let mut alloc = Fat1216Allocator::new(table);
            let next = alloc.allocate_unit()?;
            alloc.link(self.cluster, next);
            self.cluster = next;
            self.clusters += 1;
            self.pos = 0;
        }
        Ok(())
    }
}

impl FileWriter for Fat1216Writer {
    fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        let mut done = 0;
        while done < buf.len() {
            if self.pos == self.buf.len() {
                self.write_cluster(true)?;
            }
            let n = (self.buf.len() - self.pos).min(buf.len() - done);
            self.buf[self.pos..self.pos + n].copy_from_slice(&buf[done..done + n]);
            self.pos += n;
            done += n;
        }
        Ok(done)
    }

    fn close(mut self: Box<Self>) -> FsResult {
        if self.pos > 0 {
            self.write_cluster(false)?;
        }

        // Directory blocks first, then the table.
        let mut dir = self.dir.borrow_mut();
        dir.record_mut(self.entry_pos)?[28..32].copy_from_slice(&self.size.to_le_bytes());
        dir.write_back(self.io.as_mut())?;
        drop(dir);

        self.vol.borrow_mut().flush_table(self.io.as_mut())?;
        self.io.flush()?;
        log::debug!(
            "file closed: {} bytes in {} clusters",
            self.size,
            self.clusters
        );
        Ok(())
    }
}
