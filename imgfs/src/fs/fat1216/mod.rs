// SPDX-License-Identifier: MIT

pub mod allocator;
pub mod attr;
pub mod constant;
pub mod dir;
pub mod formatter;
pub mod iter;
pub mod name;
pub mod reader;
pub mod table;
pub mod types;
pub mod volume;
pub mod writer;

// === Public Interface ===
pub mod traits {
    pub use super::allocator::Fat1216Allocator;
    pub use super::dir::Fat1216Dir;
    pub use super::formatter::Fat1216Formatter;
    pub use super::iter::Fat1216Iter;
    pub use super::reader::Fat1216Reader;
    pub use super::volume::Fat1216Image;
    pub use super::writer::Fat1216Writer;
}

pub mod prelude {
    pub use super::attr::FatAttributes;
    pub use super::formatter::{Fat1216Layout, FormatOptions};
    pub use super::table::{FatTable, FatWidth, TableUsage};
    pub use super::traits::*;
    pub use super::types::{Fat1216BootSector, Fat1216Entry, Fat1216LfnEntry, Geometry};
    pub use crate::core::errors::*;
    pub use crate::core::image::*;
    pub use crate::core::traits::*;
    pub use imgio::prelude::*;
}
