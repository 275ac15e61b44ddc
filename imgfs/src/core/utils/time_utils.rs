// SPDX-License-Identifier: MIT

//! Time utilities for directory timestamps.

use std::time::SystemTime;

use time::OffsetDateTime;

/// Converts a [`SystemTime`] into an [`OffsetDateTime`].
pub fn systemtime_to_offsetdatetime(t: SystemTime) -> OffsetDateTime {
    OffsetDateTime::from(t)
}

/// Returns the current UTC time.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_systemtime_to_offsetdatetime() {
        let odt = systemtime_to_offsetdatetime(SystemTime::UNIX_EPOCH);
        assert_eq!(odt, OffsetDateTime::UNIX_EPOCH);
        assert!(now_utc().year() >= 2024);
    }
}
