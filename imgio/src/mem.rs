// SPDX-License-Identifier: MIT

use alloc::{boxed::Box, format, rc::Rc, string::String, vec::Vec};
use core::cell::RefCell;

use crate::{
    ImgIO,
    errors::{ImgIOError, ImgIOResult},
    region::Region,
    store::{ImgStore, OpenMode},
};

/// In-memory implementation of `ImgIO` over a borrowed slice.
///
/// Useful for tests and RAM-backed images.
#[derive(Debug)]
pub struct MemImgIO<'a> {
    buffer: &'a mut [u8],
    partition_offset: u64,
}

impl<'a> MemImgIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer,
            partition_offset: 0,
        }
    }

    #[inline]
    pub fn new_with_offset(buffer: &'a mut [u8], partition_offset: u64) -> Self {
        Self {
            buffer,
            partition_offset,
        }
    }

    #[inline]
    fn region(&self) -> Region {
        let len = (self.buffer.len() as u64).saturating_sub(self.partition_offset);
        Region::new(self.partition_offset, len)
    }
}

impl ImgIO for MemImgIO<'_> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        let abs = self.region().check(offset, data.len())? as usize;
        self.buffer[abs..abs + data.len()].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> ImgIOResult {
        let abs = self.region().check(offset, buf.len())? as usize;
        buf.copy_from_slice(&self.buffer[abs..abs + buf.len()]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> ImgIOResult {
        Ok(())
    }
}

/// Handle over a buffer shared with a [`MemStore`].
#[derive(Debug)]
pub struct SharedMemImgIO {
    buffer: Rc<RefCell<Vec<u8>>>,
    region: Region,
    writable: bool,
}

impl ImgIO for SharedMemImgIO {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> ImgIOResult {
        if !self.writable {
            return Err(ImgIOError::Unsupported);
        }
        let abs = self.region.check(offset, data.len())? as usize;
        let mut buf = self.buffer.borrow_mut();
        let dst = buf
            .get_mut(abs..abs + data.len())
            .ok_or(ImgIOError::ShortWrite)?;
        dst.copy_from_slice(data);
        Ok(())
    }

    fn read_at(&mut self, offset: u64, out: &mut [u8]) -> ImgIOResult {
        let abs = self.region.check(offset, out.len())? as usize;
        let buf = self.buffer.borrow();
        let src = buf.get(abs..abs + out.len()).ok_or(ImgIOError::ShortRead)?;
        out.copy_from_slice(src);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> ImgIOResult {
        Ok(())
    }
}

/// In-memory image store. Every `open` shares the same buffer.
#[derive(Debug, Clone)]
pub struct MemStore {
    buffer: Rc<RefCell<Vec<u8>>>,
    region: Region,
}

impl MemStore {
    pub fn new(data: Vec<u8>) -> Self {
        let region = Region::whole(data.len() as u64);
        Self {
            buffer: Rc::new(RefCell::new(data)),
            region,
        }
    }

    /// A store over `region` of the same buffer (e.g. one partition).
    pub fn slice(&self, region: Region) -> ImgIOResult<Self> {
        let region = self.region.sub(region.offset, region.len)?;
        Ok(Self {
            buffer: Rc::clone(&self.buffer),
            region,
        })
    }

    /// Copy of the full backing buffer.
    pub fn snapshot(&self) -> Vec<u8> {
        self.buffer.borrow().clone()
    }
}

impl ImgStore for MemStore {
    fn open(&self, mode: OpenMode) -> ImgIOResult<Box<dyn ImgIO>> {
        Ok(Box::new(SharedMemImgIO {
            buffer: Rc::clone(&self.buffer),
            region: self.region,
            writable: mode.writable(),
        }))
    }

    #[inline]
    fn region(&self) -> Region {
        self.region
    }

    fn describe(&self) -> String {
        format!("<memory {} bytes>", self.region.len)
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut buf = [0u8; 256];
        let mut io = MemImgIO::new(&mut buf);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_out_of_bounds() {
        let mut buf = [0u8; 64];
        let mut io = MemImgIO::new_with_offset(&mut buf, 32);
        assert!(io.write_at(30, &[0; 2]).is_ok());
        assert_eq!(io.write_at(31, &[0; 2]), Err(ImgIOError::OutOfBounds));
    }

    #[test]
    fn test_primitive_rw() {
        let mut buf = [0u8; 16];
        let mut io = MemImgIO::new(&mut buf);
        io.write_u16_at(2, 0xAA55).unwrap();
        io.write_u32_at(4, 0xDEADBEEF).unwrap();
        assert_eq!(io.read_u16_at(2).unwrap(), 0xAA55);
        assert_eq!(io.read_u8_at(2).unwrap(), 0x55);
        assert_eq!(io.read_u32_at(4).unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_read_multi_coalesces_and_scatters() {
        let mut buf: Vec<u8> = (0..64u8).collect();
        let mut io = MemImgIO::new(&mut buf);

        let mut out = [0u8; 24];
        io.read_multi_at(&[0, 8, 40], 8, &mut out).unwrap();
        assert_eq!(&out[..16], &(0..16u8).collect::<Vec<_>>()[..]);
        assert_eq!(&out[16..], &(40..48u8).collect::<Vec<_>>()[..]);

        let mut short = [0u8; 10];
        assert!(io.read_multi_at(&[0, 8], 8, &mut short).is_err());
    }

    #[test]
    fn test_zero_fill() {
        let mut buf = [0xFF; 64];
        let mut io = MemImgIO::new(&mut buf);

        io.zero_fill(10, 8).unwrap();

        let mut output = [0xAA; 8];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [0u8; 8]);
    }

    #[test]
    fn test_store_handles_share_buffer() {
        let store = MemStore::new(vec![0u8; 128]);
        let mut w = store.open(OpenMode::ReadWrite).unwrap();
        w.write_at(5, b"abc").unwrap();

        let mut r = store.open(OpenMode::Read).unwrap();
        let mut out = [0u8; 3];
        r.read_at(5, &mut out).unwrap();
        assert_eq!(&out, b"abc");
        assert_eq!(r.write_at(0, b"x"), Err(ImgIOError::Unsupported));
    }

    #[test]
    fn test_store_slice_is_bounded() {
        let store = MemStore::new(vec![0u8; 128]);
        let part = store.slice(Region::new(64, 32)).unwrap();
        let mut io = part.open(OpenMode::ReadWrite).unwrap();
        io.write_at(0, &[7]).unwrap();
        assert_eq!(io.write_at(32, &[7]), Err(ImgIOError::OutOfBounds));
        assert_eq!(store.snapshot()[64], 7);
    }
}
