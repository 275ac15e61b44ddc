// SPDX-License-Identifier: MIT

use imgio::prelude::*;

use crate::{
    core::{errors::*, image::FileReader},
    fs::fat1216::{constant::FAT_FIRST_CLUSTER, types::Geometry, volume::SharedVolume},
};

/// Streams a file cluster by cluster along its chain.
pub struct Fat1216Reader {
    vol: SharedVolume,
    io: Box<dyn ImgIO>,
    geo: Geometry,
    buf: Vec<u8>,
    pos: usize,
    cluster: u16,
    remain: u32,
}

impl Fat1216Reader {
    pub(crate) fn new(
        vol: SharedVolume,
        io: Box<dyn ImgIO>,
        geo: Geometry,
        cluster: u16,
        size: u32,
    ) -> Self {
        let cluster_size = geo.cluster_size();
        Self {
            vol,
            io,
            geo,
            buf: vec![0u8; cluster_size],
            // forces a load on the first read
            pos: cluster_size,
            cluster,
            remain: size,
        }
    }

    fn load_next_cluster(&mut self) -> FsResult {
        let mut vol = self.vol.borrow_mut();
        let table = vol.table(self.io.as_mut())?;
        let cluster = self.cluster;

        if cluster < FAT_FIRST_CLUSTER {
            bail!(FsStateError::ReservedCluster(cluster as u32));
        }
        if cluster > table.bad_cluster() {
            bail!(FsStateError::ChainTooShort);
        }
        if cluster == table.bad_cluster() {
            bail!(FsStateError::BadCluster(cluster as u32));
        }
        if cluster >= table.length() {
            bail!(FsStateError::ClusterOutOfRange(cluster as u32));
        }
        let next = table.chain(cluster);
        drop(vol);

        self.io.read_at(self.geo.cluster_offset(cluster), &mut self.buf)?;
        self.cluster = next;
        self.pos = 0;
        Ok(())
    }
}

impl FileReader for Fat1216Reader {
    fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        let mut done = 0;
        while done < buf.len() && self.remain > 0 {
            if self.pos == self.buf.len() {
                self.load_next_cluster()?;
            }
            let n = (self.buf.len() - self.pos)
                .min(buf.len() - done)
                .min(self.remain as usize);
            buf[done..done + n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
            done += n;
            self.pos += n;
            self.remain -= n as u32;
        }
        Ok(done)
    }
}
