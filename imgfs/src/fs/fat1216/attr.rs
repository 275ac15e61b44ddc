// SPDX-License-Identifier: MIT

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FatAttributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        const LFN       = 0x0F;
    }
}

impl FatAttributes {
    /// Long-name fragments carry exactly the four low bits.
    #[inline]
    pub fn is_lfn(raw: u8) -> bool {
        raw == Self::LFN.bits()
    }

    /// `dhsvw` column used by directory listings.
    pub fn flags_column(self) -> [char; 5] {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        [
            flag(self.contains(Self::DIRECTORY), 'd'),
            flag(self.contains(Self::HIDDEN), 'h'),
            flag(self.contains(Self::SYSTEM), 's'),
            flag(self.contains(Self::VOLUME_ID), 'v'),
            flag(!self.contains(Self::READ_ONLY), 'w'),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_column() {
        let attr = FatAttributes::DIRECTORY | FatAttributes::HIDDEN;
        assert_eq!(attr.flags_column().iter().collect::<String>(), "dh--w");

        let ro = FatAttributes::ARCHIVE | FatAttributes::READ_ONLY;
        assert_eq!(ro.flags_column().iter().collect::<String>(), "-----");
    }

    #[test]
    fn test_lfn_pattern() {
        assert!(FatAttributes::is_lfn(0x0F));
        assert!(!FatAttributes::is_lfn(0x2F));
        assert!(!FatAttributes::is_lfn(0x10));
    }
}
