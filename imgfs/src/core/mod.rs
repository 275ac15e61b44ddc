// SPDX-License-Identifier: MIT

// === Sub-modules ===
#[macro_use]
pub mod macros;
pub mod allocator;
pub mod errors;
pub mod formatter;
pub mod image;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::allocator::FsAllocator;
    pub use super::formatter::FsFormatter;
    pub use super::image::{DirIter, Directory, FileReader, FileWriter, Image};
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::{path_utils::*, size_utils::*, time_utils::*};
