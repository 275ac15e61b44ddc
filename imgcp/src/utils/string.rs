// SPDX-License-Identifier: MIT

pub fn pretty_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut val = n as f64;
    let mut idx = 0usize;
    while val >= 1024.0 && idx + 1 < UNITS.len() {
        val /= 1024.0;
        idx += 1;
    }
    if idx == 0 {
        format!("{} {}", sep_u64(n), UNITS[idx])
    } else {
        format!("{:.1} {}", val, UNITS[idx])
    }
}

/// Thousands separated by a space: 12 345 678
pub fn sep_u64(mut n: u64) -> String {
    if n < 1_000 {
        return n.to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    while n >= 1_000 {
        parts.push(format!("{:03}", n % 1_000));
        n /= 1_000;
    }
    parts.push(n.to_string());
    parts.reverse();
    parts.join(" ")
}

/// "1 file", "3 files".
pub fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Parses "1440K", "16M", "1G" or a plain byte count.
pub fn parse_size(size: &str) -> anyhow::Result<u64> {
    let lower = size.trim().to_lowercase();
    let (num, mult) = if let Some(num) = lower.strip_suffix('k') {
        (num, 1024)
    } else if let Some(num) = lower.strip_suffix('m') {
        (num, 1024 * 1024)
    } else if let Some(num) = lower.strip_suffix('g') {
        (num, 1024 * 1024 * 1024)
    } else {
        (lower.as_str(), 1)
    };
    let num = num
        .trim()
        .parse::<u64>()
        .map_err(|_| anyhow::anyhow!("Unknown size format '{size}'"))?;
    num.checked_mul(mult)
        .ok_or_else(|| anyhow::anyhow!("Size '{size}' is too large"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pretty_bytes() {
        assert_eq!(pretty_bytes(999), "999 B");
        assert_eq!(pretty_bytes(1000), "1 000 B");
        assert_eq!(pretty_bytes(1536), "1.5 KiB");
        assert_eq!(pretty_bytes(1_474_560), "1.4 MiB");
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "file"), "1 file");
        assert_eq!(plural(0, "file"), "0 files");
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("1440K").unwrap(), 1_474_560);
        assert_eq!(parse_size(" 16m ").unwrap(), 16 << 20);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert!(parse_size("12X").is_err());
        assert!(parse_size("").is_err());
    }
}
