// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod errors;
#[macro_use]
mod macros;
pub mod region;

#[cfg(feature = "alloc")]
pub mod store;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod file;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::ImgIO;
    pub use super::ImgIOExt;
    pub use super::ImgIOStructExt;
    pub use super::errors::*;
    pub use super::region::Region;

    #[cfg(feature = "alloc")]
    pub use super::store::{ImgStore, OpenMode};

    #[cfg(feature = "mem")]
    pub use super::mem::{MemImgIO, MemStore, SharedMemImgIO};

    #[cfg(feature = "std")]
    pub use super::file::{FileStore, StdImgIO};
}

// Internal use
use errors::*;

// Constants

/// Size of the internal scratch buffer used by the zero-fill and struct helpers.
/// 4 KiB matches the largest sector size FAT12/16 volumes use.
pub const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Positioned IO over one partition of an image.
///
/// Offsets are relative to the partition offset. Implementations may target
/// RAM, files or anything else addressable by byte offset.
pub trait ImgIO {
    /// Writes `data` at `offset`.
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult;

    /// Reads exactly `buf.len()` bytes from `offset`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> ImgIOResult;
}

/// Extension helpers for ImgIO.
pub trait ImgIOExt: ImgIO {
    /// Reads one block of `block_size` bytes per entry of `offsets` into `buf`.
    ///
    /// Runs of contiguous blocks are coalesced into a single read, which is the
    /// common case for cluster chains written by a linear allocator.
    ///
    /// # Errors
    /// Returns `ImgIOError::Invalid` if `buf.len()` is not `offsets.len() * block_size`.
    fn read_multi_at(&mut self, offsets: &[u64], block_size: usize, buf: &mut [u8]) -> ImgIOResult {
        if buf.len() != offsets.len() * block_size {
            return Err(ImgIOError::Invalid("read_multi_at: buffer length mismatch"));
        }
        if offsets.is_empty() {
            return Ok(());
        }

        let mut run_start = 0;
        let mut run_len = 1;
        for i in 1..offsets.len() {
            if offsets[i] == offsets[i - 1] + block_size as u64 {
                run_len += 1;
                continue;
            }
            let start = run_start * block_size;
            self.read_at(offsets[run_start], &mut buf[start..start + run_len * block_size])?;
            run_start = i;
            run_len = 1;
        }
        let start = run_start * block_size;
        self.read_at(offsets[run_start], &mut buf[start..start + run_len * block_size])
    }

    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> ImgIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    imgio_impl_primitive_rw!(u8, u16, u32);
}

impl<T: ImgIO + ?Sized> ImgIOExt for T {}

/// Reads and writes plain-old-data structs through zerocopy.
pub trait ImgIOStructExt: ImgIO {
    /// Reads a struct of type `T` from `offset`.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> ImgIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(ImgIOError::Invalid("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| ImgIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at `offset`.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> ImgIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: ImgIO + ?Sized> ImgIOStructExt for T {}
