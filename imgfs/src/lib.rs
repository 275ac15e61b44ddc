// SPDX-License-Identifier: MIT

// Core Modules
#[macro_use]
pub mod core;
pub mod fs;

// Reusable types and traits
pub use core::errors::*;
pub use core::image::{EntryKind, Found, find_entry, find_path};
pub use core::traits::*;

// Utilities
pub use core::utils::{path_utils::*, size_utils::*};

#[cfg(all(feature = "fat1216", feature = "folder"))]
pub use fs::detect::{open_image, probe_width};

// Filesystem APIs
#[cfg(feature = "fat1216")]
/// FAT12/16 read-write engine.
///
/// See [`fat1216::Fat1216Image`], [`fat1216::Fat1216Formatter`] and [`fat1216::Fat1216Allocator`].
pub mod fat1216 {
    pub use super::fs::fat1216::prelude::*;
}

#[cfg(feature = "folder")]
/// Host directories exposed as images.
pub mod folder {
    pub use super::fs::folder::*;
}
