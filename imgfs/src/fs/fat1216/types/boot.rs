// SPDX-License-Identifier: MIT

use std::io::Write;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    core::{errors::*, utils::size_utils::num_bytes_to_str},
    fs::fat1216::constant::*,
};

/// On-disk boot sector of a FAT12/16 volume (BPB + extended boot record).
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat1216BootSector {
    pub jump_boot: [u8; 3],
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entry_count: u16,
    pub total_sectors_16: u16,
    pub media: u8,
    pub fat_size_16: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub total_sectors_32: u32,

    // Extended boot record
    pub drive_number: u8,
    pub reserved1: u8,
    pub boot_signature: u8,
    pub volume_id: u32,
    pub volume_label: [u8; 11],
    pub fs_type: [u8; 8],

    pub boot_code: [u8; 448],
    pub signature: [u8; 2],
}

impl Default for Fat1216BootSector {
    fn default() -> Self {
        Self {
            jump_boot: FAT_JUMP_BOOT,
            oem_name: *FAT_OEM_NAME,
            bytes_per_sector: 512u16.to_le(),
            sectors_per_cluster: 1,
            reserved_sectors: 1u16.to_le(),
            num_fats: 2,
            root_entry_count: 224u16.to_le(),
            total_sectors_16: 0,
            media: FAT_MEDIA_FIXED,
            fat_size_16: 0,
            sectors_per_track: 0,
            num_heads: 0,
            hidden_sectors: 0,
            total_sectors_32: 0,
            drive_number: FAT_DRIVE_NUMBER,
            reserved1: 0,
            boot_signature: FAT_EXT_SIGNATURE,
            volume_id: 0,
            volume_label: *FAT_VOLUME_LABEL_EMPTY,
            fs_type: *FAT12_FS_TYPE,
            boot_code: [0u8; 448],
            signature: FAT_SIGNATURE,
        }
    }
}

/// Extended boot record fields, present when the signature is 0x28 or 0x29.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedBootRecord {
    pub drive_number: u8,
    pub signature: u8,
    pub volume_id: u32,
    /// Only meaningful with signature 0x29.
    pub volume_label: [u8; 11],
    pub system_id: [u8; 8],
}

/// Decoded and validated geometry of a FAT12/16 volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub oem_name: [u8; 8],
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub num_fats: u8,
    pub root_entries: u16,
    pub total_sectors: u32,
    pub media: u8,
    pub sectors_per_fat: u16,
    pub sectors_per_track: u16,
    pub num_heads: u16,
    pub hidden_sectors: u32,
    pub ext: Option<ExtendedBootRecord>,
}

impl Geometry {
    /// Decodes the first sector of a volume.
    ///
    /// The jump prologue accepts a short jump, a near jump, or a NOP at byte
    /// 2, as found on images written by various tools.
    pub fn parse(raw: &Fat1216BootSector) -> FsFormatResult<Self> {
        let jump = raw.jump_boot;
        if jump[0] != FAT_JUMP_SHORT && jump[0] != FAT_JUMP_NEAR && jump[2] != FAT_JUMP_NOP {
            return Err(FsFormatError::BadJumpBoot);
        }
        if raw.signature != FAT_SIGNATURE {
            return Err(FsFormatError::BadBootSignature);
        }

        let bytes_per_sector = u16::from_le(raw.bytes_per_sector);
        if bytes_per_sector == 0 {
            return Err(FsFormatError::ZeroSectorSize);
        }
        if raw.sectors_per_cluster == 0 {
            return Err(FsFormatError::ZeroClusterSize);
        }

        let total_sectors = match u16::from_le(raw.total_sectors_16) {
            0 => u32::from_le(raw.total_sectors_32),
            n => n as u32,
        };
        if total_sectors == 0 {
            return Err(FsFormatError::ZeroSectorCount);
        }

        let ext = match raw.boot_signature {
            FAT_EXT_SIGNATURE_OLD | FAT_EXT_SIGNATURE => Some(ExtendedBootRecord {
                drive_number: raw.drive_number,
                signature: raw.boot_signature,
                volume_id: u32::from_le(raw.volume_id),
                volume_label: raw.volume_label,
                system_id: raw.fs_type,
            }),
            _ => None,
        };

        Ok(Self {
            oem_name: raw.oem_name,
            bytes_per_sector,
            sectors_per_cluster: raw.sectors_per_cluster,
            reserved_sectors: u16::from_le(raw.reserved_sectors),
            num_fats: raw.num_fats,
            root_entries: u16::from_le(raw.root_entry_count),
            total_sectors,
            media: raw.media,
            sectors_per_fat: u16::from_le(raw.fat_size_16),
            sectors_per_track: u16::from_le(raw.sectors_per_track),
            num_heads: u16::from_le(raw.num_heads),
            hidden_sectors: u32::from_le(raw.hidden_sectors),
            ext,
        })
    }

    #[inline]
    pub fn sector_size(&self) -> u64 {
        self.bytes_per_sector as u64
    }

    #[inline]
    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    /// Bytes of one table copy.
    #[inline]
    pub fn fat_bytes(&self) -> usize {
        self.sectors_per_fat as usize * self.bytes_per_sector as usize
    }

    /// Offset of table copy `copy`.
    #[inline]
    pub fn fat_offset(&self, copy: u8) -> u64 {
        self.reserved_sectors as u64 * self.sector_size() + copy as u64 * self.fat_bytes() as u64
    }

    #[inline]
    pub fn root_dir_offset(&self) -> u64 {
        self.fat_offset(self.num_fats)
    }

    #[inline]
    pub fn root_dir_len(&self) -> usize {
        self.root_entries as usize * FAT_DIR_ENTRY_SIZE
    }

    /// Sectors occupied by the fixed root area, rounded up.
    #[inline]
    pub fn root_dir_sectors(&self) -> u64 {
        (self.root_dir_len() as u64).div_ceil(self.sector_size())
    }

    /// First byte of cluster 2.
    #[inline]
    pub fn data_offset(&self) -> u64 {
        self.root_dir_offset() + self.root_dir_sectors() * self.sector_size()
    }

    /// First byte of `cluster`. Callers validate the index against the table.
    #[inline]
    pub fn cluster_offset(&self, cluster: u16) -> u64 {
        debug_assert!(cluster >= FAT_FIRST_CLUSTER, "cluster {cluster} has no data");
        self.data_offset() + (cluster - FAT_FIRST_CLUSTER) as u64 * self.cluster_size() as u64
    }

    /// Clusters the data area can hold.
    pub fn cluster_count(&self) -> u32 {
        let meta_sectors = self.reserved_sectors as u64
            + self.num_fats as u64 * self.sectors_per_fat as u64
            + self.root_dir_sectors();
        let data_sectors = (self.total_sectors as u64).saturating_sub(meta_sectors);
        (data_sectors / self.sectors_per_cluster as u64) as u32
    }

    #[inline]
    pub fn volume_bytes(&self) -> u64 {
        self.total_sectors as u64 * self.sector_size()
    }

    /// Writes the BIOS Parameter Block and Extended Boot Record blocks.
    pub fn write_info(&self, out: &mut dyn Write, prefix: &str) -> std::io::Result<()> {
        let oem = String::from_utf8_lossy(&self.oem_name);
        writeln!(out, "{prefix}BIOS Parameter Block")?;
        writeln!(out, "{prefix}--------------------")?;
        writeln!(out, "{prefix}")?;
        writeln!(out, "{prefix}  * OEM:                 '{oem}'")?;
        writeln!(out, "{prefix}  * BYTES/SECTOR:        {}", self.bytes_per_sector)?;
        writeln!(out, "{prefix}  * SECTORS/CLUSTER:     {}", self.sectors_per_cluster)?;
        writeln!(out, "{prefix}  * RESERVED SECTORS:    {}", self.reserved_sectors)?;
        writeln!(out, "{prefix}  * NUM. FAT:            {}", self.num_fats)?;
        writeln!(out, "{prefix}  * ROOT DIR. ENTRIES:   {}", self.root_entries)?;
        writeln!(
            out,
            "{prefix}  * NUM. SECTORS:        {} ({})",
            self.total_sectors,
            num_bytes_to_str(self.volume_bytes())
        )?;
        writeln!(out, "{prefix}  * MEDIA DESC. TYPE:    {:02X}h", self.media)?;
        writeln!(out, "{prefix}  * SECTORS/FAT:         {}", self.sectors_per_fat)?;
        writeln!(out, "{prefix}  * SECTORS/TRACK:       {}", self.sectors_per_track)?;
        writeln!(out, "{prefix}  * NUM. HEADS:          {}", self.num_heads)?;
        writeln!(out, "{prefix}  * NUM. HIDDEN SECTORS: {}", self.hidden_sectors)?;

        if let Some(ext) = &self.ext {
            writeln!(out, "{prefix}")?;
            writeln!(out, "{prefix}Extended Boot Record")?;
            writeln!(out, "{prefix}--------------------")?;
            writeln!(out, "{prefix}")?;
            writeln!(out, "{prefix}  * DRIVE NUMBER: {:02X}h", ext.drive_number)?;
            writeln!(out, "{prefix}  * VOLUME ID:    {:08X}h", ext.volume_id)?;
            if ext.signature == FAT_EXT_SIGNATURE {
                let label = String::from_utf8_lossy(&ext.volume_label);
                let sys_id = String::from_utf8_lossy(&ext.system_id);
                writeln!(out, "{prefix}  * VOLUME LABEL: '{label}'")?;
                writeln!(out, "{prefix}  * SYSTEM ID:    '{sys_id}'")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::FromZeros;

    fn floppy() -> Fat1216BootSector {
        Fat1216BootSector {
            total_sectors_16: 2880u16.to_le(),
            media: 0xF0,
            fat_size_16: 9u16.to_le(),
            sectors_per_track: 18u16.to_le(),
            num_heads: 2u16.to_le(),
            volume_id: 0x1234_ABCDu32.to_le(),
            ..Default::default()
        }
    }

    #[test]
    fn test_layout_of_a_floppy() {
        assert_eq!(core::mem::size_of::<Fat1216BootSector>(), FAT_BOOT_SECTOR_SIZE);

        let geo = Geometry::parse(&floppy()).unwrap();
        assert_eq!(geo.cluster_size(), 512);
        assert_eq!(geo.fat_offset(0), 512);
        assert_eq!(geo.fat_offset(1), 512 + 9 * 512);
        assert_eq!(geo.root_dir_offset(), 19 * 512);
        assert_eq!(geo.root_dir_len(), 224 * 32);
        assert_eq!(geo.data_offset(), 33 * 512);
        assert_eq!(geo.cluster_offset(2), 33 * 512);
        assert_eq!(geo.cluster_offset(5), 36 * 512);
        assert_eq!(geo.cluster_count(), 2880 - 33);
    }

    #[test]
    fn test_total_sectors_falls_back_to_32_bits() {
        let mut raw = floppy();
        raw.total_sectors_16 = 0;
        raw.total_sectors_32 = 70_000u32.to_le();
        assert_eq!(Geometry::parse(&raw).unwrap().total_sectors, 70_000);
    }

    #[test]
    fn test_rejects_broken_boot_sectors() {
        let mut raw = floppy();
        raw.jump_boot = [0, 0, 0];
        assert_eq!(Geometry::parse(&raw), Err(FsFormatError::BadJumpBoot));

        let mut raw = floppy();
        raw.jump_boot = [0x00, 0x00, 0x90];
        assert!(Geometry::parse(&raw).is_ok());

        let mut raw = floppy();
        raw.signature = [0x55, 0x00];
        assert_eq!(Geometry::parse(&raw), Err(FsFormatError::BadBootSignature));

        let mut raw = floppy();
        raw.bytes_per_sector = 0;
        assert_eq!(Geometry::parse(&raw), Err(FsFormatError::ZeroSectorSize));

        let mut raw = floppy();
        raw.sectors_per_cluster = 0;
        assert_eq!(Geometry::parse(&raw), Err(FsFormatError::ZeroClusterSize));

        let mut raw = floppy();
        raw.total_sectors_16 = 0;
        assert_eq!(Geometry::parse(&raw), Err(FsFormatError::ZeroSectorCount));

        let zeroed = Fat1216BootSector::new_zeroed();
        assert!(Geometry::parse(&zeroed).is_err());
    }

    #[test]
    fn test_write_info() {
        let geo = Geometry::parse(&floppy()).unwrap();
        let mut out = Vec::new();
        geo.write_info(&mut out, "> ").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("> BIOS Parameter Block\n"));
        assert!(text.contains("  * NUM. SECTORS:        2880 (1.4M)\n"));
        assert!(text.contains("  * MEDIA DESC. TYPE:    F0h\n"));
        assert!(text.contains("  * VOLUME ID:    1234ABCDh\n"));
        assert!(text.contains("  * VOLUME LABEL: 'NO NAME    '\n"));
    }
}
