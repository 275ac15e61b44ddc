// SPDX-License-Identifier: MIT

use crate::core::errors::FsResult;

/// A Formatter for a filesystem type.
///
/// Implementations encapsulate all required state (I/O backend and layout).
/// The formatter must perform a *full format* if `full_format` is `true`
/// (data area zeroed), or a quick format otherwise.
pub trait FsFormatter {
    #[must_use = "format result must be checked for errors"]
    fn format(&mut self, full_format: bool) -> FsResult;
}
