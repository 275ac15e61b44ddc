// SPDX-License-Identifier: MIT

//! Allocation table with its two on-disk widths.
//!
//! The whole table (first copy) is kept in memory as raw bytes. Reads and
//! writes go through [`FatTable::get`] / [`FatTable::write`], which decode the
//! packed 12-bit layout or the flat 16-bit one. Any write marks the table
//! dirty; [`FatTable::flush`] writes the same buffer to every copy.

use imgio::prelude::*;

use crate::core::errors::*;
use crate::fs::fat1216::{constant::*, types::Geometry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatWidth {
    Fat12,
    Fat16,
}

impl FatWidth {
    #[inline]
    pub fn bad_cluster(self) -> u16 {
        match self {
            FatWidth::Fat12 => FAT12_BAD_CLUSTER,
            FatWidth::Fat16 => FAT16_BAD_CLUSTER,
        }
    }

    /// Value written to terminate a chain.
    #[inline]
    pub fn end_of_chain(self) -> u16 {
        self.bad_cluster() + 1
    }

    #[inline]
    pub fn end_marker(self) -> u16 {
        match self {
            FatWidth::Fat12 => FAT12_END_MARKER,
            FatWidth::Fat16 => FAT16_END_MARKER,
        }
    }

    /// Expected FAT[0] for a media descriptor byte.
    pub fn media_entry(self, media: u8) -> u16 {
        match self {
            FatWidth::Fat12 => 0xF00 | media as u16,
            // sign-extended: 0xF8 -> 0xFFF8
            FatWidth::Fat16 => media as i8 as i16 as u16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FatWidth::Fat12 => "FAT12",
            FatWidth::Fat16 => "FAT16",
        }
    }

    pub fn fs_type(self) -> &'static [u8; 8] {
        match self {
            FatWidth::Fat12 => FAT12_FS_TYPE,
            FatWidth::Fat16 => FAT16_FS_TYPE,
        }
    }

    /// Width implied by a data cluster count.
    pub fn from_cluster_count(clusters: u32) -> FsFormatResult<Self> {
        if clusters < FAT12_MAX_CLUSTERS {
            Ok(FatWidth::Fat12)
        } else if clusters < FAT16_MAX_CLUSTERS {
            Ok(FatWidth::Fat16)
        } else {
            Err(FsFormatError::UnknownWidth(clusters))
        }
    }

    /// Bytes needed to store `entries` table entries.
    pub fn table_bytes(self, entries: u32) -> usize {
        match self {
            FatWidth::Fat12 => (entries as usize * 3).div_ceil(2),
            FatWidth::Fat16 => entries as usize * 2,
        }
    }

    fn raw_entries(self, raw_len: usize) -> usize {
        match self {
            FatWidth::Fat12 => raw_len * 2 / 3,
            FatWidth::Fat16 => raw_len / 2,
        }
    }
}

/// Raw table bytes, one variant per width.
#[derive(Debug, Clone)]
enum FatEntries {
    Packed12(Vec<u8>),
    Flat16(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct FatTable {
    entries: FatEntries,
    length: u16,
    dirty: bool,
}

impl FatTable {
    /// Builds a table from the raw bytes of the first copy and validates the
    /// two reserved entries.
    ///
    /// `max_entries` caps the usable length at the number of clusters the
    /// data area can actually hold (plus the two reserved ones).
    pub fn from_raw(
        width: FatWidth,
        raw: Vec<u8>,
        media: u8,
        max_entries: u32,
    ) -> FsFormatResult<Self> {
        if raw.len() % 2 != 0 || width.raw_entries(raw.len()) < 2 {
            return Err(FsFormatError::BadTableSize);
        }
        let length = width
            .raw_entries(raw.len())
            .min(max_entries as usize)
            .min(u16::MAX as usize) as u16;
        if length < 2 {
            return Err(FsFormatError::BadTableSize);
        }

        let entries = match width {
            FatWidth::Fat12 => FatEntries::Packed12(raw),
            FatWidth::Fat16 => FatEntries::Flat16(raw),
        };
        let table = Self {
            entries,
            length,
            dirty: false,
        };

        let first = table.get(0);
        if first != width.media_entry(media) {
            return Err(FsFormatError::MediaMismatch(first));
        }
        let second = table.get(1);
        if second != width.end_marker() {
            return Err(FsFormatError::EndMarkerMismatch(second));
        }
        Ok(table)
    }

    #[inline]
    pub fn width(&self) -> FatWidth {
        match self.entries {
            FatEntries::Packed12(_) => FatWidth::Fat12,
            FatEntries::Flat16(_) => FatWidth::Fat16,
        }
    }

    /// Number of addressable entries, reserved ones included.
    #[inline]
    pub fn length(&self) -> u16 {
        self.length
    }

    #[inline]
    pub fn bad_cluster(&self) -> u16 {
        self.width().bad_cluster()
    }

    #[inline]
    pub fn end_of_chain(&self) -> u16 {
        self.width().end_of_chain()
    }

    /// Entries past the table read as the bad-cluster sentinel so that any
    /// traversal stops there.
    pub fn get(&self, i: u16) -> u16 {
        let i = i as usize;
        match &self.entries {
            FatEntries::Packed12(raw) => {
                let pos = 3 * i / 2;
                let (Some(&lo), Some(&hi)) = (raw.get(pos), raw.get(pos + 1)) else {
                    return FAT12_BAD_CLUSTER;
                };
                if i & 1 == 0 {
                    lo as u16 | ((hi as u16 & 0x0F) << 8)
                } else {
                    (lo >> 4) as u16 | ((hi as u16) << 4)
                }
            }
            FatEntries::Flat16(raw) => match raw.get(2 * i..2 * i + 2) {
                Some(b) => u16::from_le_bytes([b[0], b[1]]),
                None => FAT16_BAD_CLUSTER,
            },
        }
    }

    /// Next cluster of a chain.
    #[inline]
    pub fn chain(&self, cluster: u16) -> u16 {
        self.get(cluster)
    }

    /// Sets entry `i`, keeping the neighbour nibble of a shared 12-bit byte.
    pub fn write(&mut self, i: u16, val: u16) {
        debug_assert!(i < self.length, "table index {i} out of range");
        let i = i as usize;
        match &mut self.entries {
            FatEntries::Packed12(raw) => {
                let pos = 3 * i / 2;
                if pos + 1 >= raw.len() {
                    return;
                }
                if i & 1 == 0 {
                    raw[pos] = val as u8;
                    raw[pos + 1] = (raw[pos + 1] & 0xF0) | ((val >> 8) as u8 & 0x0F);
                } else {
                    raw[pos] = (raw[pos] & 0x0F) | ((val as u8 & 0x0F) << 4);
                    raw[pos + 1] = (val >> 4) as u8;
                }
            }
            FatEntries::Flat16(raw) => {
                if let Some(b) = raw.get_mut(2 * i..2 * i + 2) {
                    b.copy_from_slice(&val.to_le_bytes());
                }
            }
        }
        self.dirty = true;
    }

    /// Raw bytes for write-back.
    #[inline]
    pub fn data(&self) -> &[u8] {
        match &self.entries {
            FatEntries::Packed12(raw) | FatEntries::Flat16(raw) => raw,
        }
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Writes the buffer to every table copy, in order. No-op when clean.
    pub fn flush(&mut self, io: &mut dyn ImgIO, geo: &Geometry) -> FsResult {
        if !self.dirty {
            return Ok(());
        }
        for copy in 0..geo.num_fats {
            io.write_at(geo.fat_offset(copy), self.data())?;
        }
        self.dirty = false;
        log::debug!(
            "{} table flushed to {} cop{}",
            self.width().name(),
            geo.num_fats,
            if geo.num_fats == 1 { "y" } else { "ies" }
        );
        Ok(())
    }

    /// Cluster statistics over the data entries.
    pub fn usage(&self) -> TableUsage {
        let bad = self.bad_cluster();
        let mut usage = TableUsage {
            total: self.length.saturating_sub(FAT_FIRST_CLUSTER) as u32,
            ..Default::default()
        };
        for i in FAT_FIRST_CLUSTER..self.length {
            match self.get(i) {
                0 => usage.free += 1,
                v if v == bad => usage.bad += 1,
                v if v > bad => usage.chain_ends += 1,
                _ => {}
            }
        }
        usage
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableUsage {
    pub total: u32,
    pub free: u32,
    pub bad: u32,
    pub chain_ends: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(width: FatWidth, bytes: usize) -> FatTable {
        let mut raw = vec![0u8; bytes];
        match width {
            FatWidth::Fat12 => raw[..3].copy_from_slice(&[0xF8, 0xFF, 0xFF]),
            FatWidth::Fat16 => raw[..4].copy_from_slice(&[0xF8, 0xFF, 0xFF, 0xFF]),
        }
        FatTable::from_raw(width, raw, 0xF8, u32::MAX).unwrap()
    }

    #[test]
    fn test_fat12_get_after_write_both_parities() {
        let mut t = blank(FatWidth::Fat12, 512);
        assert_eq!(t.length(), 341);

        for (i, v) in [(2u16, 0xABC), (3, 0x123), (4, 0xFFF), (5, 0x001), (340, 0x7E5)] {
            t.write(i, v);
            assert_eq!(t.get(i), v, "index {i}");
        }
        // neighbours sharing a byte are untouched
        assert_eq!(t.get(2), 0xABC);
        assert_eq!(t.get(3), 0x123);
        assert_eq!(t.get(0), 0xFF8);
        assert_eq!(t.get(1), 0xFFF);
        assert!(t.is_dirty());
    }

    #[test]
    fn test_fat12_bit_layout() {
        let mut t = blank(FatWidth::Fat12, 6);
        t.write(2, 0x345);
        t.write(3, 0x678);
        assert_eq!(&t.data()[3..6], &[0x45, 0x83, 0x67]);
    }

    #[test]
    fn test_fat16_get_after_write() {
        let mut t = blank(FatWidth::Fat16, 512);
        assert_eq!(t.length(), 256);
        t.write(2, 0xBEEF);
        t.write(255, 0x0003);
        assert_eq!(t.get(2), 0xBEEF);
        assert_eq!(t.get(255), 3);
        assert_eq!(&t.data()[4..6], &[0xEF, 0xBE]);
    }

    #[test]
    fn test_reserved_entries_are_validated() {
        let raw = vec![0xF0, 0xFF, 0xFF, 0, 0, 0];
        assert_eq!(
            FatTable::from_raw(FatWidth::Fat12, raw, 0xF8, u32::MAX).unwrap_err(),
            FsFormatError::MediaMismatch(0xFF0)
        );

        let raw = vec![0xF8, 0xFF, 0x00, 0x00];
        assert_eq!(
            FatTable::from_raw(FatWidth::Fat16, raw, 0xF8, u32::MAX).unwrap_err(),
            FsFormatError::EndMarkerMismatch(0)
        );

        let raw = vec![0xF8, 0xFF, 0xFF];
        assert_eq!(
            FatTable::from_raw(FatWidth::Fat12, raw, 0xF8, u32::MAX).unwrap_err(),
            FsFormatError::BadTableSize
        );
    }

    #[test]
    fn test_length_capped_by_data_area() {
        let mut raw = vec![0u8; 512];
        raw[..3].copy_from_slice(&[0xF0, 0xFF, 0xFF]);
        let t = FatTable::from_raw(FatWidth::Fat12, raw, 0xF0, 100).unwrap();
        assert_eq!(t.length(), 100);
        assert_eq!(t.get(400), FAT12_BAD_CLUSTER);
    }

    #[test]
    fn test_media_entry_sign_extends_for_fat16() {
        assert_eq!(FatWidth::Fat16.media_entry(0xF8), 0xFFF8);
        assert_eq!(FatWidth::Fat12.media_entry(0xF0), 0xFF0);
    }

    #[test]
    fn test_width_from_cluster_count() {
        assert_eq!(FatWidth::from_cluster_count(4084), Ok(FatWidth::Fat12));
        assert_eq!(FatWidth::from_cluster_count(4085), Ok(FatWidth::Fat16));
        assert!(FatWidth::from_cluster_count(70000).is_err());
    }

    #[test]
    fn test_usage_counts() {
        let mut t = blank(FatWidth::Fat16, 64);
        t.write(2, 3);
        t.write(3, 0xFFF8);
        t.write(4, 0xFFF7);
        let u = t.usage();
        assert_eq!(u.total, 30);
        assert_eq!(u.bad, 1);
        assert_eq!(u.chain_ends, 1);
        assert_eq!(u.free, 27);
    }
}
