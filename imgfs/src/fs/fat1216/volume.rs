// SPDX-License-Identifier: MIT

use std::{cell::RefCell, io::Write, rc::Rc};

use imgio::prelude::*;

use crate::{
    core::{errors::*, image::*, utils::size_utils::num_bytes_to_str},
    fs::fat1216::{
        allocator::*,
        dir::{DirStore, Fat1216Dir},
        table::{FatTable, FatWidth, TableUsage},
        types::{Fat1216BootSector, Geometry},
    },
};

/// Per-image state: where the bytes live, and the lazily loaded geometry and
/// allocation table.
///
/// Every logical operation opens its own handle on the store. The geometry
/// and table are read once and cached for the lifetime of the image; another
/// image opened on the same store does not see the changes until reopened.
pub struct Fat1216Volume {
    store: Box<dyn ImgStore>,
    width: FatWidth,
    geo: Option<Geometry>,
    table: Option<FatTable>,
}

pub(crate) type SharedVolume = Rc<RefCell<Fat1216Volume>>;

impl Fat1216Volume {
    pub fn new(store: Box<dyn ImgStore>, width: FatWidth) -> Self {
        Self {
            store,
            width,
            geo: None,
            table: None,
        }
    }

    #[inline]
    pub fn width(&self) -> FatWidth {
        self.width
    }

    pub fn open_io(&self, mode: OpenMode) -> FsResult<Box<dyn ImgIO>> {
        Ok(self.store.open(mode)?)
    }

    pub fn geometry(&mut self, io: &mut dyn ImgIO) -> FsResult<&Geometry> {
        let geo = match self.geo.take() {
            Some(geo) => geo,
            None => {
                let raw: Fat1216BootSector = io.read_struct(0)?;
                Geometry::parse(&raw)?
            }
        };
        Ok(self.geo.insert(geo))
    }

    /// Geometry and table, loading whichever is missing.
    pub fn load(&mut self, io: &mut dyn ImgIO) -> FsResult<(&Geometry, &mut FatTable)> {
        if self.table.is_none() {
            let geo = self.geometry(io)?.clone();
            let mut raw = vec![0u8; geo.fat_bytes()];
            io.read_at(geo.fat_offset(0), &mut raw)?;
            let table = FatTable::from_raw(self.width, raw, geo.media, geo.cluster_count() + 2)?;
            log::debug!(
                "{} table loaded: {} entries, {} copies",
                self.width.name(),
                table.length(),
                geo.num_fats
            );
            self.table = Some(table);
        }
        match (&self.geo, &mut self.table) {
            (Some(geo), Some(table)) => Ok((geo, table)),
            _ => Err(FsError::Other("FAT12/16 volume not loaded")),
        }
    }

    pub fn table(&mut self, io: &mut dyn ImgIO) -> FsResult<&mut FatTable> {
        Ok(self.load(io)?.1)
    }

    /// Claims one free cluster and marks it end-of-chain.
    pub fn alloc_cluster(&mut self, io: &mut dyn ImgIO) -> FsResult<u16> {
        let table = self.table(io)?;
        Ok(Fat1216Allocator::new(table).allocate_unit()?)
    }

    /// Writes the table to every copy when it changed since the last flush.
    pub fn flush_table(&mut self, io: &mut dyn ImgIO) -> FsResult {
        let (geo, table) = self.load(io)?;
        table.flush(io, geo)
    }

    fn write_usage(&mut self, out: &mut dyn Write, prefix: &str) -> FsResult {
        let mut io = self.open_io(OpenMode::Read)?;
        let (geo, table) = self.load(io.as_mut())?;
        let usage = table.usage();
        let cluster_size = geo.cluster_size() as u64;
        let pct = |n: u32| {
            if usage.total == 0 {
                0.0
            } else {
                100.0 * n as f64 / usage.total as f64
            }
        };

        writeln!(out)?;
        writeln!(out, "{prefix}Usage")?;
        writeln!(out, "{prefix}-----")?;
        writeln!(out)?;
        writeln!(out, "{prefix}  * NUM. FILES:    {}", usage.chain_ends)?;
        writeln!(
            out,
            "{prefix}  * FREE CLUSTERS: {} ({:.1}% [{}])",
            usage.free,
            pct(usage.free),
            num_bytes_to_str(usage.free as u64 * cluster_size)
        )?;
        writeln!(
            out,
            "{prefix}  * BAD CLUSTERS:  {} ({:.1}% [{}])",
            usage.bad,
            pct(usage.bad),
            num_bytes_to_str(usage.bad as u64 * cluster_size)
        )?;
        Ok(())
    }
}

/// A FAT12 or FAT16 volume seen through the browsing traits.
pub struct Fat1216Image {
    vol: SharedVolume,
}

impl Fat1216Image {
    /// Wraps `store`. Nothing is read until the first operation.
    pub fn open(store: Box<dyn ImgStore>, width: FatWidth) -> Self {
        Self {
            vol: Rc::new(RefCell::new(Fat1216Volume::new(store, width))),
        }
    }

    pub fn width(&self) -> FatWidth {
        self.vol.borrow().width()
    }

    /// Cluster accounting of the allocation table.
    pub fn usage(&self) -> FsResult<TableUsage> {
        let mut vol = self.vol.borrow_mut();
        let mut io = vol.open_io(OpenMode::Read)?;
        Ok(vol.table(io.as_mut())?.usage())
    }

    /// Writes any cached table change. Writers and directory operations
    /// flush on their own; this is for callers driving the volume directly.
    pub fn flush(&self) -> FsResult {
        let mut vol = self.vol.borrow_mut();
        let mut io = vol.open_io(OpenMode::ReadWrite)?;
        vol.flush_table(io.as_mut())?;
        Ok(io.flush()?)
    }
}

impl Image for Fat1216Image {
    fn print_info(&self, out: &mut dyn Write, prefix: &str) -> FsResult {
        let mut vol = self.vol.borrow_mut();
        writeln!(out, "{prefix}{} image", vol.width().name())?;
        writeln!(out, "{prefix}")?;

        let mut io = vol.open_io(OpenMode::Read)?;
        vol.geometry(io.as_mut())?.write_info(out, prefix)?;
        drop(io);
        vol.write_usage(out, prefix)
    }

    fn root_directory(&self) -> FsResult<Box<dyn Directory>> {
        let store = {
            let mut vol = self.vol.borrow_mut();
            let mut io = vol.open_io(OpenMode::Read)?;
            let geo = vol.geometry(io.as_mut())?;
            DirStore::load_root(io.as_mut(), geo)?
        };
        Ok(Box::new(Fat1216Dir::new(Rc::clone(&self.vol), store)))
    }
}
