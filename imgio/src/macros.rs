// SPDX-License-Identifier: MIT

/// Implements little-endian read/write helpers for primitive types on ImgIO.
#[macro_export]
macro_rules! imgio_impl_primitive_rw {
    ($($ty:ty),+ $(,)?) => {
        $(
            paste::paste! {
                #[inline(always)]
                fn [<write_ $ty _at>](&mut self, offset: u64, value: $ty) -> ImgIOResult {
                    self.write_at(offset, &value.to_le_bytes())
                }

                #[inline(always)]
                fn [<read_ $ty _at>](&mut self, offset: u64) -> ImgIOResult<$ty> {
                    let mut buf = [0u8; core::mem::size_of::<$ty>()];
                    self.read_at(offset, &mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )+
    };
}
