// SPDX-License-Identifier: MIT

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Human readable size: one decimal and a `K`/`M`/`G` suffix above 1 KiB,
/// the plain byte count otherwise.
pub fn num_bytes_to_str(num_bytes: u64) -> String {
    let scaled = |unit: u64, suffix: char| format!("{:.1}{suffix}", num_bytes as f64 / unit as f64);
    if num_bytes > GIB {
        scaled(GIB, 'G')
    } else if num_bytes > MIB {
        scaled(MIB, 'M')
    } else if num_bytes > KIB {
        scaled(KIB, 'K')
    } else {
        num_bytes.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_bytes_to_str() {
        assert_eq!(num_bytes_to_str(0), "0");
        assert_eq!(num_bytes_to_str(1024), "1024");
        assert_eq!(num_bytes_to_str(1536), "1.5K");
        assert_eq!(num_bytes_to_str(1_474_560), "1.4M");
        assert_eq!(num_bytes_to_str(3 * GIB), "3.0G");
    }
}
