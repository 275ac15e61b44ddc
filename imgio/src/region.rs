// SPDX-License-Identifier: MIT

use crate::errors::{ImgIOError, ImgIOResult};

/// A partition region: `len` bytes starting at `offset` of the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub offset: u64,
    pub len: u64,
}

impl Region {
    #[inline]
    pub const fn new(offset: u64, len: u64) -> Self {
        Self { offset, len }
    }

    /// Region covering a whole store of `len` bytes.
    #[inline]
    pub const fn whole(len: u64) -> Self {
        Self { offset: 0, len }
    }

    #[inline]
    pub const fn end(&self) -> u64 {
        self.offset + self.len
    }

    /// Validates a relative access of `len` bytes at `offset` and returns
    /// the absolute offset in the backing store.
    #[inline]
    pub fn check(&self, offset: u64, len: usize) -> ImgIOResult<u64> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(ImgIOError::OutOfBounds)?;
        if end > self.len {
            return Err(ImgIOError::OutOfBounds);
        }
        self.offset
            .checked_add(offset)
            .ok_or(ImgIOError::OutOfBounds)
    }

    /// Narrows this region to a nested one (e.g. a partition inside a disk).
    pub fn sub(&self, offset: u64, len: u64) -> ImgIOResult<Region> {
        let len_usize = usize::try_from(len).map_err(|_| ImgIOError::OutOfBounds)?;
        let abs = self.check(offset, len_usize)?;
        Ok(Region::new(abs, len))
    }
}
