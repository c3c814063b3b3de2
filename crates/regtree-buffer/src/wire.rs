use crate::buffer::Buffer;
use crate::error::BufferResult;

/// A value with a canonical encoding in a [`Buffer`].
///
/// Numeric types use their fixed-width big-endian form; strings use a
/// 4-byte big-endian length prefix followed by raw UTF-8 bytes.
pub trait WireValue: Sized {
    /// Append the encoding of `self`.
    fn write_to(&self, buf: &mut Buffer) -> BufferResult<()>;

    /// Consume one encoded value.
    fn read_from(buf: &mut Buffer) -> BufferResult<Self>;
}

macro_rules! impl_wire_scalar {
    ($($ty:ty),*) => {$(
        impl WireValue for $ty {
            fn write_to(&self, buf: &mut Buffer) -> BufferResult<()> {
                buf.write_scalar(*self);
                Ok(())
            }

            fn read_from(buf: &mut Buffer) -> BufferResult<Self> {
                buf.read_scalar()
            }
        }
    )*};
}

impl_wire_scalar!(i8, i16, i32, u8, u16, u32, f32);

impl WireValue for String {
    fn write_to(&self, buf: &mut Buffer) -> BufferResult<()> {
        buf.write_string(self)?;
        Ok(())
    }

    fn read_from(buf: &mut Buffer) -> BufferResult<Self> {
        buf.read_string()
    }
}
