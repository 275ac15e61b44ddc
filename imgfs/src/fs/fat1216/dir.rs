// SPDX-License-Identifier: MIT

use std::{cell::RefCell, rc::Rc};

use imgio::prelude::*;
use zerocopy::IntoBytes;

use crate::{
    core::{errors::*, image::*},
    fs::fat1216::{
        allocator::*,
        attr::FatAttributes,
        constant::*,
        iter::Fat1216Iter,
        name::{datetime_now, to_short_dir_name, to_short_name},
        table::FatTable,
        types::{Fat1216Entry, Geometry},
        volume::{Fat1216Volume, SharedVolume},
        writer::Fat1216Writer,
    },
};

/// In-memory content of one directory.
///
/// `data` is the concatenation of the directory blocks: the whole fixed root
/// area for the root, one cluster per block otherwise. `offs` and `dirty`
/// hold the backing offset and dirty flag of each block and always have one
/// element per block.
#[derive(Debug, Clone)]
pub struct DirStore {
    data: Vec<u8>,
    offs: Vec<u64>,
    dirty: Vec<bool>,
    block_size: usize,
    is_root: bool,
    cluster: u16,
    last_cluster: u16,
}

pub(crate) type SharedDirStore = Rc<RefCell<DirStore>>;

impl DirStore {
    pub fn load_root(io: &mut dyn ImgIO, geo: &Geometry) -> FsResult<Self> {
        let offset = geo.root_dir_offset();
        let mut data = vec![0u8; geo.root_dir_len()];
        io.read_at(offset, &mut data)?;
        Ok(Self {
            block_size: data.len().max(1),
            data,
            offs: vec![offset],
            dirty: vec![false],
            is_root: true,
            cluster: 0,
            last_cluster: 0,
        })
    }

    /// Loads the directory whose chain starts at `first`.
    pub fn load_chain(
        io: &mut dyn ImgIO,
        geo: &Geometry,
        table: &FatTable,
        first: u16,
    ) -> FsResult<Self> {
        let clusters = walk_chain(table, first, geo.cluster_count())?;
        let block_size = geo.cluster_size();
        let offs: Vec<u64> = clusters.iter().map(|&c| geo.cluster_offset(c)).collect();
        let mut data = vec![0u8; offs.len() * block_size];
        io.read_multi_at(&offs, block_size, &mut data)?;

        Ok(Self {
            data,
            dirty: vec![false; offs.len()],
            offs,
            block_size,
            is_root: false,
            cluster: first,
            last_cluster: clusters.last().copied().unwrap_or(first),
        })
    }

    /// A one-cluster directory whose content was just written to disk.
    pub fn from_cluster(geo: &Geometry, cluster: u16, data: Vec<u8>) -> Self {
        Self {
            block_size: data.len(),
            data,
            offs: vec![geo.cluster_offset(cluster)],
            dirty: vec![false],
            is_root: false,
            cluster,
            last_cluster: cluster,
        }
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// First cluster, 0 for the root.
    #[inline]
    pub fn cluster(&self) -> u16 {
        self.cluster
    }

    #[inline]
    pub fn block_count(&self) -> usize {
        self.offs.len()
    }

    pub fn entry(&self, pos: usize) -> Option<Fat1216Entry> {
        Fat1216Entry::read(self.data.get(pos..)?)
    }

    /// Mutable view of the 32-byte record at `pos`; marks its block dirty.
    pub fn record_mut(&mut self, pos: usize) -> FsResult<&mut [u8]> {
        ensure!(pos + FAT_DIR_ENTRY_SIZE <= self.data.len(), FsError::Other("Record out of directory"));
        self.dirty[pos / self.block_size] = true;
        Ok(&mut self.data[pos..pos + FAT_DIR_ENTRY_SIZE])
    }

    /// Writes every dirty block back and clears the flags.
    pub fn write_back(&mut self, io: &mut dyn ImgIO) -> FsResult {
        for (i, dirty) in self.dirty.iter_mut().enumerate() {
            if *dirty {
                let start = i * self.block_size;
                let end = (start + self.block_size).min(self.data.len());
                io.write_at(self.offs[i], &self.data[start..end])?;
                *dirty = false;
            }
        }
        Ok(())
    }

    /// First reusable slot (0x00 or 0xE5), if any.
    fn free_slot(&self) -> Option<usize> {
        self.data
            .chunks_exact(FAT_DIR_ENTRY_SIZE)
            .position(|rec| rec[0] == FAT_ENTRY_END_OF_DIR || rec[0] == FAT_ENTRY_DELETED)
            .map(|i| i * FAT_DIR_ENTRY_SIZE)
    }

    /// Grows a sub-directory by one zeroed cluster linked after the last one.
    pub fn resize(&mut self, vol: &mut Fat1216Volume, io: &mut dyn ImgIO) -> FsResult {
        ensure!(!self.is_root, FsCapacityError::RootFull);

        let (geo, table) = vol.load(io)?;
        let mut alloc = Fat1216Allocator::new(table);
        let cluster = alloc.allocate_unit()?;
        alloc.link(self.last_cluster, cluster);

        self.data.resize(self.data.len() + self.block_size, 0);
        self.offs.push(geo.cluster_offset(cluster));
        self.dirty.push(true);
        self.last_cluster = cluster;

        log::debug!(
            "directory at cluster {} grown to {} clusters",
            self.cluster,
            self.offs.len()
        );
        Ok(())
    }

    /// Creates a record for `name` with a freshly allocated first cluster.
    /// Returns the record position and the cluster.
    pub fn new_entry(
        &mut self,
        vol: &mut Fat1216Volume,
        io: &mut dyn ImgIO,
        name: [u8; 11],
        attr: FatAttributes,
    ) -> FsResult<(usize, u16)> {
        let pos = loop {
            match self.free_slot() {
                Some(pos) => break pos,
                None if self.is_root => bail!(FsCapacityError::RootFull),
                None => self.resize(vol, io)?,
            }
        };

        // Reusing the end marker: the next slot becomes the new one.
        let next = pos + FAT_DIR_ENTRY_SIZE;
        if self.data[pos] == FAT_ENTRY_END_OF_DIR && next < self.data.len() {
            self.record_mut(next)?[0] = FAT_ENTRY_END_OF_DIR;
        }

        let cluster = vol.alloc_cluster(io)?;
        let (date, time) = datetime_now();
        let entry = Fat1216Entry::new(name, attr, cluster, date, time);
        self.record_mut(pos)?.copy_from_slice(entry.as_bytes());
        Ok((pos, cluster))
    }
}

/// Clusters of the chain starting at `first`, in order.
///
/// Reserved, free and out-of-range links are errors, as is the bad-cluster
/// sentinel. A chain longer than the data area is reported as a loop.
pub(crate) fn walk_chain(table: &FatTable, first: u16, cluster_count: u32) -> FsStateResult<Vec<u16>> {
    let bad = table.bad_cluster();
    let mut clusters = Vec::new();
    let mut cluster = first;

    loop {
        if cluster < FAT_FIRST_CLUSTER {
            return Err(FsStateError::ReservedCluster(cluster as u32));
        }
        if cluster > bad && !clusters.is_empty() {
            return Ok(clusters);
        }
        if cluster >= bad {
            return Err(FsStateError::BadCluster(cluster as u32));
        }
        if cluster >= table.length() {
            return Err(FsStateError::ClusterOutOfRange(cluster as u32));
        }
        if clusters.len() as u32 >= cluster_count {
            return Err(FsStateError::ChainLoop);
        }
        clusters.push(cluster);
        cluster = table.chain(cluster);
    }
}

/// A FAT12/16 directory: shared content plus the volume it lives on.
pub struct Fat1216Dir {
    vol: SharedVolume,
    store: SharedDirStore,
}

impl Fat1216Dir {
    pub(crate) fn new(vol: SharedVolume, store: DirStore) -> Self {
        Self {
            vol,
            store: Rc::new(RefCell::new(store)),
        }
    }

    /// Concrete iterator on `name`, if present.
    fn lookup(&self, name: &str) -> FsResult<Option<Fat1216Iter>> {
        let mut it = Fat1216Iter::begin(Rc::clone(&self.vol), Rc::clone(&self.store));
        while !it.end() {
            if it.compare_to_name(name) {
                return Ok(Some(it));
            }
            it.next()?;
        }
        Ok(None)
    }

    /// Number of blocks currently loaded.
    pub fn block_count(&self) -> usize {
        self.store.borrow().block_count()
    }
}

impl Directory for Fat1216Dir {
    fn begin(&self) -> FsResult<Box<dyn DirIter>> {
        Ok(Box::new(Fat1216Iter::begin(
            Rc::clone(&self.vol),
            Rc::clone(&self.store),
        )))
    }

    fn make_dir(&mut self, name: &str) -> FsResult<Box<dyn Directory>> {
        let short = to_short_dir_name(name)?;
        if let Some(it) = self.lookup(name)? {
            return match it.kind() {
                EntryKind::Dir | EntryKind::DirSpecial => it.directory(),
                _ => Err(FsStateError::NameClash.into()),
            };
        }

        let mut vol = self.vol.borrow_mut();
        let mut io = vol.open_io(OpenMode::ReadWrite)?;
        let geo = vol.geometry(io.as_mut())?.clone();
        ensure!(
            geo.cluster_size() >= FAT_MIN_DIR_CLUSTER,
            FsStateError::ClusterTooSmall
        );

        let mut store = self.store.borrow_mut();
        let (_, cluster) =
            store.new_entry(&mut vol, io.as_mut(), short, FatAttributes::DIRECTORY)?;

        let (date, time) = datetime_now();
        let mut content = vec![0u8; geo.cluster_size()];
        content[..FAT_DIR_ENTRY_SIZE].copy_from_slice(Fat1216Entry::dot(cluster, date, time).as_bytes());
        content[FAT_DIR_ENTRY_SIZE..2 * FAT_DIR_ENTRY_SIZE]
            .copy_from_slice(Fat1216Entry::dotdot(store.cluster(), date, time).as_bytes());
        io.write_at(geo.cluster_offset(cluster), &content)?;

        store.write_back(io.as_mut())?;
        vol.flush_table(io.as_mut())?;
        io.flush()?;
        log::debug!("directory {name} created at cluster {cluster}");

        Ok(Box::new(Fat1216Dir::new(
            Rc::clone(&self.vol),
            DirStore::from_cluster(&geo, cluster, content),
        )))
    }

    fn file_writer(&mut self, name: &str) -> FsResult<Box<dyn FileWriter>> {
        let short = to_short_name(name)?;
        let existing = self.lookup(name)?;

        let mut vol = self.vol.borrow_mut();
        let mut io = vol.open_io(OpenMode::ReadWrite)?;
        let (pos, cluster) = match existing {
            Some(it) => it.overwrite_file(&mut vol, io.as_mut())?,
            None => self.store.borrow_mut().new_entry(
                &mut vol,
                io.as_mut(),
                short,
                FatAttributes::ARCHIVE,
            )?,
        };
        let geo = vol.geometry(io.as_mut())?.clone();
        drop(vol);

        Ok(Box::new(Fat1216Writer::new(
            Rc::clone(&self.vol),
            Rc::clone(&self.store),
            io,
            geo,
            pos,
            cluster,
        )))
    }
}
