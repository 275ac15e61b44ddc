// SPDX-License-Identifier: MIT

use imgio::prelude::*;
use zerocopy::IntoBytes;

pub use crate::core::formatter::*;

use crate::{
    core::errors::*,
    fs::fat1216::{
        attr::FatAttributes,
        constant::*,
        name::datetime_now,
        table::FatWidth,
        types::{Fat1216BootSector, Fat1216Entry},
    },
};

/// Parameters of a blank FAT12/16 volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub total_sectors: u32,
    pub media: u8,
    pub volume_id: u32,
    pub volume_label: Option<String>,
    /// Derived from the cluster count when `None`.
    pub width: Option<FatWidth>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            num_fats: 2,
            root_entries: 224,
            total_sectors: 2880,
            media: FAT_MEDIA_FIXED,
            volume_id: 0,
            volume_label: None,
            width: None,
        }
    }
}

impl FormatOptions {
    /// Options for a volume of `size_bytes` with every other field default.
    pub fn with_size(size_bytes: u64) -> Self {
        let opts = Self::default();
        Self {
            total_sectors: (size_bytes / opts.bytes_per_sector as u64).min(u32::MAX as u64) as u32,
            ..opts
        }
    }
}

/// Computed placement of a volume described by [`FormatOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fat1216Layout {
    pub width: FatWidth,
    pub sectors_per_fat: u16,
    pub cluster_count: u32,
    pub root_dir_sectors: u32,
}

impl Fat1216Layout {
    pub fn compute(opts: &FormatOptions) -> FsFormatResult<Self> {
        if !opts.bytes_per_sector.is_power_of_two() || opts.bytes_per_sector < 512 {
            return Err(FsFormatError::Invalid("Bytes per sector must be a power of two >= 512"));
        }
        if !opts.sectors_per_cluster.is_power_of_two() {
            return Err(FsFormatError::Invalid("Sectors per cluster must be a power of two"));
        }
        if opts.num_fats == 0 || opts.reserved_sectors == 0 {
            return Err(FsFormatError::Invalid("At least one reserved sector and one FAT"));
        }

        let bps = opts.bytes_per_sector as u32;
        let root_dir_sectors = (opts.root_entries as u32 * FAT_DIR_ENTRY_SIZE as u32).div_ceil(bps);

        let converge = |width: FatWidth| -> (u32, u32) {
            let mut fat_size = 1u32;
            let mut cluster_count = 0u32;
            for _ in 0..32 {
                let meta = opts.reserved_sectors as u64
                    + root_dir_sectors as u64
                    + opts.num_fats as u64 * fat_size as u64;
                let data = (opts.total_sectors as u64).saturating_sub(meta);
                cluster_count = (data / opts.sectors_per_cluster as u64) as u32;
                let needed = (width.table_bytes(cluster_count + 2) as u32).div_ceil(bps).max(1);
                if needed == fat_size {
                    break;
                }
                fat_size = needed;
            }
            (fat_size, cluster_count)
        };

        let width = match opts.width {
            Some(width) => width,
            None => {
                let (_, count12) = converge(FatWidth::Fat12);
                match FatWidth::from_cluster_count(count12)? {
                    FatWidth::Fat12 => FatWidth::Fat12,
                    FatWidth::Fat16 => FatWidth::from_cluster_count(converge(FatWidth::Fat16).1)?,
                }
            }
        };
        let (fat_size, cluster_count) = converge(width);

        if cluster_count == 0 {
            return Err(FsFormatError::Invalid("Volume too small for a data area"));
        }
        let sectors_per_fat =
            u16::try_from(fat_size).map_err(|_| FsFormatError::Invalid("FAT too large"))?;
        Ok(Self {
            width,
            sectors_per_fat,
            cluster_count,
            root_dir_sectors,
        })
    }
}

/// Space-padded, upper-cased label, truncated to 11 bytes.
fn label_bytes(name: &str) -> [u8; 11] {
    let mut label = [b' '; 11];
    for (dst, b) in label.iter_mut().zip(name.bytes()) {
        *dst = b.to_ascii_uppercase();
    }
    label
}

/// Writes a blank FAT12/16 volume: boot sector, every table copy with its two
/// reserved entries, and an empty root directory.
pub struct Fat1216Formatter<'a, IO: ImgIO + ?Sized> {
    io: &'a mut IO,
    opts: &'a FormatOptions,
}

impl<'a, IO: ImgIO + ?Sized> Fat1216Formatter<'a, IO> {
    pub fn new(io: &'a mut IO, opts: &'a FormatOptions) -> Self {
        Self { io, opts }
    }

    fn boot_sector(&self, layout: &Fat1216Layout) -> Fat1216BootSector {
        let opts = self.opts;
        let (total16, total32) = match u16::try_from(opts.total_sectors) {
            Ok(n) => (n, 0),
            Err(_) => (0, opts.total_sectors),
        };
        let label = opts
            .volume_label
            .as_deref()
            .map_or(*FAT_VOLUME_LABEL_EMPTY, label_bytes);

        Fat1216BootSector {
            bytes_per_sector: opts.bytes_per_sector.to_le(),
            sectors_per_cluster: opts.sectors_per_cluster,
            reserved_sectors: opts.reserved_sectors.to_le(),
            num_fats: opts.num_fats,
            root_entry_count: opts.root_entries.to_le(),
            total_sectors_16: total16.to_le(),
            media: opts.media,
            fat_size_16: layout.sectors_per_fat.to_le(),
            total_sectors_32: total32.to_le(),
            volume_id: opts.volume_id.to_le(),
            volume_label: label,
            fs_type: *layout.width.fs_type(),
            ..Default::default()
        }
    }

    fn write_boot_sector(&mut self, layout: &Fat1216Layout) -> FsResult {
        let boot = self.boot_sector(layout);
        self.io.write_struct(0, &boot)?;
        let sector = self.opts.bytes_per_sector as usize;
        if sector > FAT_BOOT_SECTOR_SIZE {
            self.io
                .zero_fill(FAT_BOOT_SECTOR_SIZE as u64, sector - FAT_BOOT_SECTOR_SIZE)?;
        }
        Ok(())
    }

    fn write_tables(&mut self, layout: &Fat1216Layout) -> FsResult {
        let bps = self.opts.bytes_per_sector as u64;
        let fat_bytes = layout.sectors_per_fat as u64 * bps;
        let media = self.opts.media;
        let reserved: &[u8] = match layout.width {
            FatWidth::Fat12 => &[media, 0xFF, 0xFF],
            FatWidth::Fat16 => &[media, 0xFF, 0xFF, 0xFF],
        };

        for copy in 0..self.opts.num_fats as u64 {
            let offset = self.opts.reserved_sectors as u64 * bps + copy * fat_bytes;
            self.io.write_at(offset, reserved)?;
            self.io.zero_fill(
                offset + reserved.len() as u64,
                fat_bytes as usize - reserved.len(),
            )?;
        }
        Ok(())
    }

    fn write_root_dir(&mut self, layout: &Fat1216Layout) -> FsResult {
        let bps = self.opts.bytes_per_sector as u64;
        let offset = (self.opts.reserved_sectors as u64
            + self.opts.num_fats as u64 * layout.sectors_per_fat as u64)
            * bps;
        self.io
            .zero_fill(offset, (layout.root_dir_sectors as u64 * bps) as usize)?;

        if let (Some(name), true) = (&self.opts.volume_label, self.opts.root_entries > 0) {
            let (date, time) = datetime_now();
            let entry =
                Fat1216Entry::new(label_bytes(name), FatAttributes::VOLUME_ID, 0, date, time);
            self.io.write_at(offset, entry.as_bytes())?;
        }
        Ok(())
    }

    fn zero_data_area(&mut self, layout: &Fat1216Layout) -> FsResult {
        let bps = self.opts.bytes_per_sector as u64;
        let start = self.opts.reserved_sectors as u64
            + self.opts.num_fats as u64 * layout.sectors_per_fat as u64
            + layout.root_dir_sectors as u64;
        let len = (self.opts.total_sectors as u64).saturating_sub(start) * bps;
        self.io.zero_fill(start * bps, len as usize)?;
        Ok(())
    }
}

impl<IO: ImgIO + ?Sized> FsFormatter for Fat1216Formatter<'_, IO> {
    fn format(&mut self, full_format: bool) -> FsResult {
        let layout = Fat1216Layout::compute(self.opts)?;
        self.write_boot_sector(&layout)?;
        self.write_tables(&layout)?;
        self.write_root_dir(&layout)?;
        if full_format {
            self.zero_data_area(&layout)?;
        }
        self.io.flush()?;
        log::debug!(
            "{} volume formatted: {} clusters, {} sectors per FAT",
            layout.width.name(),
            layout.cluster_count,
            layout.sectors_per_fat
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floppy_layout() {
        let layout = Fat1216Layout::compute(&FormatOptions::default()).unwrap();
        assert_eq!(layout.width, FatWidth::Fat12);
        assert_eq!(layout.sectors_per_fat, 9);
        assert_eq!(layout.root_dir_sectors, 14);
        assert_eq!(layout.cluster_count, 2880 - 1 - 14 - 18);
    }

    #[test]
    fn test_width_follows_cluster_count() {
        let opts = FormatOptions {
            total_sectors: 32 * 1024,
            sectors_per_cluster: 4,
            root_entries: 512,
            ..Default::default()
        };
        let layout = Fat1216Layout::compute(&opts).unwrap();
        assert_eq!(layout.width, FatWidth::Fat16);
        assert!(layout.cluster_count >= FAT12_MAX_CLUSTERS);
    }

    #[test]
    fn test_rejects_bad_options() {
        let opts = FormatOptions {
            bytes_per_sector: 500,
            ..Default::default()
        };
        assert!(Fat1216Layout::compute(&opts).is_err());

        let opts = FormatOptions {
            total_sectors: 16,
            ..Default::default()
        };
        assert!(Fat1216Layout::compute(&opts).is_err());
    }

    #[test]
    fn test_format_writes_signatures_and_tables() {
        let mut buf = vec![0xAAu8; 2880 * 512];
        let opts = FormatOptions::default();
        let mut io = MemImgIO::new(&mut buf);
        Fat1216Formatter::new(&mut io, &opts).format(false).unwrap();

        assert_eq!(&buf[510..512], &FAT_SIGNATURE);
        assert_eq!(buf[0], 0xEB);
        assert_eq!(&buf[512..516], &[0xF8, 0xFF, 0xFF, 0x00]);
        assert_eq!(&buf[512 + 9 * 512..512 + 9 * 512 + 3], &[0xF8, 0xFF, 0xFF]);
        // root area is blank
        assert!(buf[19 * 512..33 * 512].iter().all(|&b| b == 0));
        // quick format leaves the data area alone
        assert_eq!(buf[33 * 512], 0xAA);
    }
}
