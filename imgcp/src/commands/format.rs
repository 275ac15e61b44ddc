// SPDX-License-Identifier: MIT

use std::{
    fs::OpenOptions,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use imgfs::{
    FsError,
    fat1216::{Fat1216Formatter, Fat1216Layout, FileStore, FormatOptions, FsFormatter, ImgStore, OpenMode},
};

use crate::{args::Session, utils::string::pretty_bytes};

/// Writes a blank FAT12/16 volume to the file of image `image` (the default
/// image when `None`), creating or resizing the file first.
pub fn format(
    session: &Session,
    image: Option<&str>,
    mut opts: FormatOptions,
    full: bool,
) -> anyhow::Result<()> {
    let name = image.map_or_else(|| session.images().default_name(), str::to_string);
    let file = session
        .images()
        .get(&name)
        .with_context(|| format!("unknown file name: {name}"))?
        .clone();

    if opts.width.is_none() {
        opts.width = session.width();
    }
    if opts.volume_id == 0 {
        opts.volume_id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as u32);
    }
    let layout = Fat1216Layout::compute(&opts)
        .map_err(FsError::Format)
        .context("invalid volume parameters")?;
    let size = opts.total_sectors as u64 * opts.bytes_per_sector as u64;

    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&file)
        .and_then(|f| f.set_len(size))
        .with_context(|| format!("cannot create {}", file.display()))?;

    let store = FileStore::new(&file)?;
    let mut io = store.open(OpenMode::ReadWrite)?;
    Fat1216Formatter::new(io.as_mut(), &opts)
        .format(full)
        .with_context(|| format!("cannot format {}", file.display()))?;

    log_info!(
        "{} formatted as {} ({}, {} clusters of {})",
        file.display(),
        layout.width.name(),
        pretty_bytes(size),
        layout.cluster_count,
        pretty_bytes(opts.sectors_per_cluster as u64 * opts.bytes_per_sector as u64)
    );
    Ok(())
}
