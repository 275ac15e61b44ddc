// SPDX-License-Identifier: MIT

//! Backing stores.
//!
//! A store knows where an image lives and hands out a fresh [`ImgIO`] handle
//! for every logical operation. Nothing is kept open between operations.

use alloc::boxed::Box;

use crate::{ImgIO, errors::ImgIOResult, region::Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    ReadWrite,
}

impl OpenMode {
    #[inline]
    pub fn writable(self) -> bool {
        matches!(self, OpenMode::ReadWrite)
    }
}

pub trait ImgStore {
    /// Opens a new handle bounded to [`ImgStore::region`].
    fn open(&self, mode: OpenMode) -> ImgIOResult<Box<dyn ImgIO>>;

    /// Region of the backing store this image occupies.
    fn region(&self) -> Region;

    /// Human readable location, used in diagnostics.
    fn describe(&self) -> alloc::string::String;
}
