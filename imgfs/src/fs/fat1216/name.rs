// SPDX-License-Identifier: MIT

//! 8.3 names and packed timestamps.

use time::OffsetDateTime;

use crate::{
    core::{errors::*, utils::time_utils},
    fs::fat1216::constant::*,
};

/// Characters accepted in a short name after upper-casing, the dot included.
#[inline(always)]
fn is_valid_sfn_char(b: u8) -> bool {
    matches!(b,
        b'A'..=b'Z' | b'0'..=b'9' |
        b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'(' | b')' |
        b'-' | b'@' | b'^' | b'_' | b'`' | b'{' | b'}' | b'~' | b'.'
    )
}

/// Validates `name` as an 8.3 name and returns the 11-byte padded field.
pub fn to_short_name(name: &str) -> FsFormatResult<[u8; 11]> {
    let name = name.trim().to_ascii_uppercase();
    if name.is_empty() || name == "." {
        return Err(FsFormatError::BadName("Empty name"));
    }
    if !name.bytes().all(is_valid_sfn_char) {
        return Err(FsFormatError::BadName("Character not supported in 8.3 name"));
    }

    let mut parts = name.split('.');
    let base = parts.next().unwrap_or_default();
    let ext = parts.next().unwrap_or_default();
    if parts.next().is_some() {
        return Err(FsFormatError::BadName("Too many dots in 8.3 name"));
    }
    if base.is_empty() {
        return Err(FsFormatError::BadName("File name without name"));
    }
    if base.len() > FAT_NAME_LEN {
        return Err(FsFormatError::BadName("File name too long"));
    }
    if ext.len() > FAT_EXT_LEN {
        return Err(FsFormatError::BadName("File extension too long"));
    }

    let mut raw = [b' '; 11];
    raw[..base.len()].copy_from_slice(base.as_bytes());
    raw[FAT_NAME_LEN..FAT_NAME_LEN + ext.len()].copy_from_slice(ext.as_bytes());
    Ok(raw)
}

/// Directory names carry no extension.
pub fn to_short_dir_name(name: &str) -> FsFormatResult<[u8; 11]> {
    let raw = to_short_name(name)?;
    if raw[FAT_NAME_LEN..].iter().any(|&b| b != b' ') {
        return Err(FsFormatError::BadName("Directory name with extension"));
    }
    Ok(raw)
}

/// Packs `ts` into FAT `(date, time)` words. Years are clamped to 1980..=2107
/// and seconds stored with 2-second resolution.
pub fn datetime_from(ts: OffsetDateTime) -> (u16, u16) {
    let year = ts.year().clamp(FAT_EPOCH_YEAR, FAT_MAX_YEAR);
    let date = ((year - FAT_EPOCH_YEAR) as u16) << 9 | (ts.month() as u16) << 5 | ts.day() as u16;
    let time = (ts.hour() as u16) << 11 | (ts.minute() as u16) << 5 | ts.second() as u16 / 2;
    (date, time)
}

pub fn datetime_now() -> (u16, u16) {
    datetime_from(time_utils::now_utc())
}

/// `(year % 100, month, day)` from a packed date.
pub fn unpack_date(date: u16) -> (u16, u16, u16) {
    (((date >> 9) + 80) % 100, (date >> 5) & 0x0F, date & 0x1F)
}

/// `(hours, minutes, seconds)` from a packed time.
pub fn unpack_time(time: u16) -> (u16, u16, u16) {
    (time >> 11, (time >> 5) & 0x3F, (time & 0x1F) * 2)
}

/// Short-name checksum stored in each long-name fragment.
pub fn lfn_checksum(short: &[u8; 11]) -> u8 {
    short
        .iter()
        .fold(0u8, |sum, &b| sum.rotate_right(1).wrapping_add(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_valid_short_names() {
        assert_eq!(&to_short_name("readme.txt").unwrap(), b"README  TXT");
        assert_eq!(&to_short_name("  a  ").unwrap(), b"A          ");
        assert_eq!(&to_short_name("ABCDEFGH.ABC").unwrap(), b"ABCDEFGHABC");
        assert_eq!(&to_short_name("x.").unwrap(), b"X          ");
        assert_eq!(&to_short_name("{~}.$$$").unwrap(), b"{~}     $$$");
    }

    #[test]
    fn test_invalid_short_names() {
        for bad in ["", " ", ".", "a b", "a.b.c", ".txt", "ABCDEFGHI", "a.abcd", "é", "a+b", "a/b"] {
            assert!(
                matches!(to_short_name(bad), Err(FsFormatError::BadName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_dir_names_have_no_extension() {
        assert!(to_short_dir_name("DOCS").is_ok());
        assert_eq!(
            to_short_dir_name("DOCS.OLD"),
            Err(FsFormatError::BadName("Directory name with extension"))
        );
    }

    #[test]
    fn test_datetime_packing() {
        let (date, time) = datetime_from(datetime!(2025-03-01 13:45:31 UTC));
        assert_eq!(date, (45 << 9) | (3 << 5) | 1);
        assert_eq!(time, (13 << 11) | (45 << 5) | 15);
        assert_eq!(unpack_date(date), (25, 3, 1));
        assert_eq!(unpack_time(time), (13, 45, 30));

        let (date, _) = datetime_from(datetime!(1975-06-15 00:00:00 UTC));
        assert_eq!(date >> 9, 0);
        let (date, _) = datetime_from(datetime!(2150-01-01 00:00:00 UTC));
        assert_eq!(date >> 9, 127);
    }

    #[test]
    fn test_lfn_checksum() {
        // Reference value for "REPORT~1TXT".
        assert_eq!(lfn_checksum(b"REPORT~1TXT"), 0xAB);
    }
}
