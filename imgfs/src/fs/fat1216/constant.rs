// SPDX-License-Identifier: MIT

// === Boot sector ===

pub const FAT_BOOT_SECTOR_SIZE: usize = 512;
pub const FAT_JUMP_BOOT: [u8; 3] = [0xEB, 0x3C, 0x90]; // BS_jmpBoot (short jump form)
pub const FAT_JUMP_SHORT: u8 = 0xEB;
pub const FAT_JUMP_NEAR: u8 = 0xE9;
pub const FAT_JUMP_NOP: u8 = 0x90;
pub const FAT_OEM_NAME: &[u8; 8] = b"IMGCP1.0"; // BS_OEMName
pub const FAT_SIGNATURE: [u8; 2] = [0x55, 0xAA]; // trailing boot signature
pub const FAT_EXT_SIGNATURE_OLD: u8 = 0x28; // drive number + volume id only
pub const FAT_EXT_SIGNATURE: u8 = 0x29; // + label + system id
pub const FAT_DRIVE_NUMBER: u8 = 0x00; // removable media
pub const FAT_VOLUME_LABEL_EMPTY: &[u8; 11] = b"NO NAME    ";
pub const FAT12_FS_TYPE: &[u8; 8] = b"FAT12   ";
pub const FAT16_FS_TYPE: &[u8; 8] = b"FAT16   ";

// === Allocation table ===

pub const FAT_FIRST_CLUSTER: u16 = 2;
pub const FAT12_BAD_CLUSTER: u16 = 0xFF7;
pub const FAT16_BAD_CLUSTER: u16 = 0xFFF7;
pub const FAT12_END_MARKER: u16 = 0xFFF;
pub const FAT16_END_MARKER: u16 = 0xFFFF;
pub const FAT12_MAX_CLUSTERS: u32 = 4085;
pub const FAT16_MAX_CLUSTERS: u32 = 65525;
pub const FAT_MEDIA_FIXED: u8 = 0xF8;

// === Directory records ===

pub const FAT_DIR_ENTRY_SIZE: usize = 32;
pub const FAT_ENTRY_END_OF_DIR: u8 = 0x00;
pub const FAT_ENTRY_DELETED: u8 = 0xE5;
pub const FAT_LFN_LAST: u8 = 0x40;
pub const FAT_LFN_ORDER_MASK: u8 = 0x3F;
pub const FAT_LFN_CHARS: usize = 13;
pub const FAT_DOT_NAME: &[u8; 11] = b".          ";
pub const FAT_DOTDOT_NAME: &[u8; 11] = b"..         ";
pub const FAT_NAME_LEN: usize = 8;
pub const FAT_EXT_LEN: usize = 3;

/// A new subdirectory needs room for ".", ".." and a terminator.
pub const FAT_MIN_DIR_CLUSTER: usize = 3 * FAT_DIR_ENTRY_SIZE;

// === Timestamps ===

pub const FAT_EPOCH_YEAR: i32 = 1980;
pub const FAT_MAX_YEAR: i32 = 2107;
