// SPDX-License-Identifier: MIT

//! Picks the image kind behind a host path.
//!
//! The table width comes from the cluster count in the boot sector. The
//! "FAT12   "/"FAT16   " type label is informative only and is never read.

use std::{fs, path::Path};

use imgio::prelude::*;

use crate::{
    core::{errors::*, image::Image},
    fs::{
        fat1216::{
            table::FatWidth,
            types::{Fat1216BootSector, Geometry},
            volume::Fat1216Image,
        },
        folder::LocalFolder,
    },
};

/// Reads the boot sector of `store` and derives the table width.
pub fn probe_width(store: &dyn ImgStore) -> FsResult<FatWidth> {
    let mut io = store.open(OpenMode::Read)?;
    let raw: Fat1216BootSector = io.read_struct(0)?;
    let geo = Geometry::parse(&raw)?;
    let width = FatWidth::from_cluster_count(geo.cluster_count())?;
    log::debug!(
        "{}: {} clusters, probed as {}",
        store.describe(),
        geo.cluster_count(),
        width.name()
    );
    Ok(width)
}

/// Opens `path` as a local folder when it is a directory, otherwise as a
/// FAT12/16 image of the given width (probed when `None`).
pub fn open_image(path: impl AsRef<Path>, width: Option<FatWidth>) -> FsResult<Box<dyn Image>> {
    let path = path.as_ref();
    if fs::metadata(path)?.is_dir() {
        return Ok(Box::new(LocalFolder::open(path)?));
    }

    let store = FileStore::new(path)?;
    let width = match width {
        Some(width) => width,
        None => probe_width(&store)?,
    };
    Ok(Box::new(Fat1216Image::open(Box::new(store), width)))
}
