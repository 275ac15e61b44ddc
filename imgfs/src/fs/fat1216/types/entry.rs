// SPDX-License-Identifier: MIT

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::fs::fat1216::{attr::FatAttributes, constant::*};

/// 32-byte short directory record.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat1216Entry {
    pub name: [u8; 11],
    pub attr: u8,
    pub nt_reserved: u8,
    pub creation_time_tenth: u8,
    pub creation_time: u16,
    pub creation_date: u16,
    pub access_date: u16,
    pub first_cluster_high: u16,
    pub write_time: u16,
    pub write_date: u16,
    pub first_cluster: u16,
    pub file_size: u32,
}

impl Fat1216Entry {
    /// A fresh record with every timestamp set to `(date, time)`.
    pub fn new(name: [u8; 11], attr: FatAttributes, cluster: u16, date: u16, time: u16) -> Self {
        Self {
            name,
            attr: attr.bits(),
            nt_reserved: 0,
            creation_time_tenth: 0,
            creation_time: time.to_le(),
            creation_date: date.to_le(),
            access_date: date.to_le(),
            first_cluster_high: 0,
            write_time: time.to_le(),
            write_date: date.to_le(),
            first_cluster: cluster.to_le(),
            file_size: 0,
        }
    }

    pub fn dot(cluster: u16, date: u16, time: u16) -> Self {
        Self::new(*FAT_DOT_NAME, FatAttributes::DIRECTORY, cluster, date, time)
    }

    pub fn dotdot(parent_cluster: u16, date: u16, time: u16) -> Self {
        Self::new(*FAT_DOTDOT_NAME, FatAttributes::DIRECTORY, parent_cluster, date, time)
    }

    /// Decodes the record at the start of `raw` (at least 32 bytes).
    #[inline]
    pub fn read(raw: &[u8]) -> Option<Self> {
        Self::read_from_prefix(raw).ok().map(|(e, _)| e)
    }

    #[inline]
    pub fn attributes(&self) -> FatAttributes {
        FatAttributes::from_bits_retain(self.attr)
    }

    #[inline]
    pub fn cluster(&self) -> u16 {
        u16::from_le(self.first_cluster)
    }

    #[inline]
    pub fn size(&self) -> u32 {
        u32::from_le(self.file_size)
    }

    #[inline]
    pub fn modified(&self) -> (u16, u16) {
        (u16::from_le(self.write_date), u16::from_le(self.write_time))
    }

    pub fn is_dot_or_dotdot(&self) -> bool {
        &self.name == FAT_DOT_NAME || &self.name == FAT_DOTDOT_NAME
    }

    /// Trimmed `NAME.EXT`, uppercase as stored.
    pub fn short_name(&self) -> String {
        let base = trim_field(&self.name[..FAT_NAME_LEN]);
        let ext = trim_field(&self.name[FAT_NAME_LEN..]);
        if ext.is_empty() {
            base
        } else {
            format!("{base}.{ext}")
        }
    }
}

fn trim_field(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != b' ').map_or(0, |p| p + 1);
    raw[..end].iter().map(|&b| b as char).collect()
}

/// Long file name fragment: 13 UTF-16 code units spread over three fields.
#[derive(IntoBytes, FromBytes, KnownLayout, Immutable, Copy, Clone, Debug)]
#[repr(C, packed)]
pub struct Fat1216LfnEntry {
    pub order: u8,
    pub name1: [u16; 5],
    pub attr: u8,
    pub type_field: u8,
    pub checksum: u8,
    pub name2: [u16; 6],
    pub zero: u16,
    pub name3: [u16; 2],
}

impl Fat1216LfnEntry {
    pub fn new(order: u8, is_last: bool, name_chunk: &[u16], checksum: u8) -> Self {
        let mut chars = [0xFFFFu16; FAT_LFN_CHARS];
        for (dst, &c) in chars.iter_mut().zip(name_chunk) {
            *dst = c.to_le();
        }
        if name_chunk.len() < FAT_LFN_CHARS {
            chars[name_chunk.len()] = 0;
        }

        let mut name1 = [0u16; 5];
        let mut name2 = [0u16; 6];
        let mut name3 = [0u16; 2];
        name1.copy_from_slice(&chars[0..5]);
        name2.copy_from_slice(&chars[5..11]);
        name3.copy_from_slice(&chars[11..13]);

        Self {
            order: if is_last { order | FAT_LFN_LAST } else { order },
            name1,
            attr: FatAttributes::LFN.bits(),
            type_field: 0,
            checksum,
            name2,
            zero: 0,
            name3,
        }
    }

    #[inline]
    pub fn read(raw: &[u8]) -> Option<Self> {
        Self::read_from_prefix(raw).ok().map(|(e, _)| e)
    }

    #[inline]
    pub fn index(&self) -> u8 {
        self.order & FAT_LFN_ORDER_MASK
    }

    #[inline]
    pub fn is_last(&self) -> bool {
        self.order & FAT_LFN_LAST != 0
    }

    /// Code units of this fragment, up to the first 0x0000 or 0xFFFF.
    pub fn extract_utf16(&self) -> Vec<u16> {
        let name1 = self.name1;
        let name2 = self.name2;
        let name3 = self.name3;
        name1
            .iter()
            .chain(name2.iter())
            .chain(name3.iter())
            .map(|&c| u16::from_le(c))
            .take_while(|&c| c != 0x0000 && c != 0xFFFF)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zerocopy::IntoBytes;

    #[test]
    fn test_entry_layout() {
        assert_eq!(core::mem::size_of::<Fat1216Entry>(), FAT_DIR_ENTRY_SIZE);
        assert_eq!(core::mem::size_of::<Fat1216LfnEntry>(), FAT_DIR_ENTRY_SIZE);

        let e = Fat1216Entry::new(*b"X       TXT", FatAttributes::ARCHIVE, 0x0123, 0x5A21, 0x6000);
        let raw = e.as_bytes();
        assert_eq!(raw[11], 0x20);
        assert_eq!(&raw[16..18], &[0x21, 0x5A]);
        assert_eq!(&raw[22..24], &[0x00, 0x60]);
        assert_eq!(&raw[24..26], &[0x21, 0x5A]);
        assert_eq!(&raw[26..28], &[0x23, 0x01]);
        assert_eq!(&raw[28..32], &[0, 0, 0, 0]);
        assert_eq!(e.short_name(), "X.TXT");
    }

    #[test]
    fn test_lfn_fragment() {
        let name: Vec<u16> = "report".encode_utf16().collect();
        let lfn = Fat1216LfnEntry::new(1, true, &name, 0xAB);
        let raw = lfn.as_bytes();

        assert_eq!(raw[0], 0x41);
        assert_eq!(raw[11], 0x0F);
        assert_eq!(raw[13], 0xAB);
        assert_eq!(lfn.index(), 1);
        assert!(lfn.is_last());
        assert_eq!(String::from_utf16(&lfn.extract_utf16()).unwrap(), "report");
    }

    #[test]
    fn test_short_name_without_extension() {
        let e = Fat1216Entry::dot(5, 0, 0);
        assert_eq!(e.short_name(), ".");
        assert!(e.is_dot_or_dotdot());
        assert_eq!(e.cluster(), 5);
    }
}
