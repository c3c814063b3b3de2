use regtree_store::{ByteStore, StoreResult};
use tracing::debug;

use crate::error::{BufferError, BufferResult};
use crate::order::{ByteOrder, Scalar};
use crate::wire::WireValue;

/// Width of the length prefix in front of every string.
const LENGTH_PREFIX: usize = 4;

/// Growable byte sequence with one forward read cursor.
///
/// Writes always append. Reads consume from the cursor and never move it
/// on failure. The buffer never shrinks its allocation.
#[derive(Clone, Debug, Default)]
pub struct Buffer {
    bytes: Vec<u8>,
    cursor: usize,
    order: ByteOrder,
}

impl Buffer {
    /// Create an empty buffer using the host's byte order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with an explicit byte-order codec.
    pub fn with_order(order: ByteOrder) -> Self {
        Self {
            bytes: Vec::new(),
            cursor: 0,
            order,
        }
    }

    /// Wrap existing bytes, cursor at the start.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            cursor: 0,
            order: ByteOrder::native(),
        }
    }

    /// Load every byte of `name` from `store`, replacing current contents.
    ///
    /// On success the cursor is reset to 0. On failure the buffer is left
    /// untouched.
    pub fn load_from<S: ByteStore + ?Sized>(&mut self, store: &S, name: &str) -> StoreResult<()> {
        let bytes = store.read_all(name)?;
        self.bytes.clear();
        self.bytes.extend_from_slice(&bytes);
        self.cursor = 0;
        debug!(resource = name, len = self.bytes.len(), "buffer loaded");
        Ok(())
    }

    /// Write the full contents to `name` in `store`.
    pub fn save_to<S: ByteStore + ?Sized>(&self, store: &S, name: &str) -> StoreResult<()> {
        store.write_all(name, &self.bytes)?;
        debug!(resource = name, len = self.bytes.len(), "buffer saved");
        Ok(())
    }

    /// Drop all contents and reset the cursor. Capacity is kept.
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.cursor = 0;
    }

    /// Append raw bytes.
    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Append the big-endian encoding of a fixed-width value.
    pub fn write_scalar<T: Scalar>(&mut self, value: T) -> &mut Self {
        let encoded = self.order.encode(value);
        self.write(encoded.as_ref())
    }

    /// Append a string as a 4-byte big-endian length followed by its UTF-8
    /// bytes. An empty string writes the prefix only.
    pub fn write_string(&mut self, value: &str) -> BufferResult<&mut Self> {
        let len =
            u32::try_from(value.len()).map_err(|_| BufferError::StringTooLong(value.len()))?;
        self.write_scalar(len);
        Ok(self.write(value.as_bytes()))
    }

    /// Append any [`WireValue`].
    pub fn write_typed<T: WireValue>(&mut self, value: &T) -> BufferResult<&mut Self> {
        value.write_to(self)?;
        Ok(self)
    }

    /// Consume `n` raw bytes.
    pub fn read(&mut self, n: usize) -> BufferResult<&[u8]> {
        self.ensure(n)?;
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.bytes[start..start + n])
    }

    /// Consume and decode a fixed-width big-endian value.
    pub fn read_scalar<T: Scalar>(&mut self) -> BufferResult<T> {
        let mut raw = T::Bytes::default();
        raw.as_mut().copy_from_slice(self.read(T::WIDTH)?);
        Ok(self.order.decode(raw))
    }

    /// Consume a length-prefixed UTF-8 string.
    ///
    /// Fails without moving the cursor if the prefix or the payload is
    /// short, or if the payload is not UTF-8.
    pub fn read_string(&mut self) -> BufferResult<String> {
        self.ensure(LENGTH_PREFIX)?;
        let mut prefix = [0u8; LENGTH_PREFIX];
        prefix.copy_from_slice(&self.bytes[self.cursor..self.cursor + LENGTH_PREFIX]);
        let len = self.order.decode::<u32>(prefix) as usize;

        self.ensure(LENGTH_PREFIX + len)?;
        let start = self.cursor + LENGTH_PREFIX;
        let text = std::str::from_utf8(&self.bytes[start..start + len])
            .map_err(|_| BufferError::InvalidUtf8)?
            .to_string();
        self.cursor = start + len;
        Ok(text)
    }

    /// Consume any [`WireValue`].
    pub fn read_typed<T: WireValue>(&mut self) -> BufferResult<T> {
        T::read_from(self)
    }

    /// All bytes, independent of the cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the underlying bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current read cursor.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    /// The byte-order codec in use.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    fn ensure(&self, needed: usize) -> BufferResult<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(BufferError::Underrun { needed, remaining });
        }
        Ok(())
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Endian;
    use regtree_store::{InMemoryByteStore, StoreError};

    #[test]
    fn write_appends_raw_bytes() {
        let mut buf = Buffer::new();
        buf.write(&[1, 2]).write(&[3]);
        assert_eq!(buf.as_bytes(), &[1, 2, 3]);
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn scalars_are_big_endian() {
        let mut buf = Buffer::new();
        buf.write_scalar(0x9E70_819Fu32).write_scalar(0x0100u16);
        assert_eq!(buf.as_bytes(), &[0x9E, 0x70, 0x81, 0x9F, 0x01, 0x00]);
    }

    #[test]
    fn simulated_hosts_write_identical_bytes() {
        let mut big = Buffer::with_order(ByteOrder::simulated(Endian::Big));
        let mut little = Buffer::with_order(ByteOrder::simulated(Endian::Little));
        for buf in [&mut big, &mut little] {
            buf.write_scalar(-1920i32)
                .write_scalar(65_000u16)
                .write_scalar(-0.0f32);
            buf.write_string("width").unwrap();
        }
        assert_eq!(big.as_bytes(), little.as_bytes());
    }

    #[test]
    fn string_encoding() {
        let mut buf = Buffer::new();
        buf.write_string("abc").unwrap();
        assert_eq!(buf.as_bytes(), &[0, 0, 0, 3, b'a', b'b', b'c']);
    }

    #[test]
    fn empty_string_is_prefix_only() {
        let mut buf = Buffer::new();
        buf.write_string("").unwrap();
        assert_eq!(buf.as_bytes(), &[0, 0, 0, 0]);
        assert_eq!(buf.read_string().unwrap(), "");
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn read_advances_cursor() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(buf.read(2).unwrap(), &[1, 2]);
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.remaining(), 2);
    }

    #[test]
    fn underrun_leaves_cursor() {
        let mut buf = Buffer::from_bytes(vec![0, 1, 2]);
        let err = buf.read_scalar::<u32>().unwrap_err();
        assert_eq!(
            err,
            BufferError::Underrun {
                needed: 4,
                remaining: 3
            }
        );
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.read_scalar::<u16>().unwrap(), 1);
    }

    #[test]
    fn truncated_string_payload_fails() {
        let mut buf = Buffer::new();
        buf.write_scalar(10u32).write(b"short");
        let err = buf.read_string().unwrap_err();
        assert_eq!(
            err,
            BufferError::Underrun {
                needed: 14,
                remaining: 9
            }
        );
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn invalid_utf8_fails() {
        let mut buf = Buffer::new();
        buf.write_scalar(2u32).write(&[0xC3, 0x28]);
        assert_eq!(buf.read_string().unwrap_err(), BufferError::InvalidUtf8);
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn utf8_string_roundtrip() {
        let mut buf = Buffer::new();
        buf.write_string("größe ✓").unwrap();
        assert_eq!(buf.read_string().unwrap(), "größe ✓");
    }

    #[test]
    fn float_bits_survive_buffer() {
        let mut buf = Buffer::new();
        let nan = f32::from_bits(0x7FC0_BEEF);
        buf.write_scalar(nan).write_scalar(-0.0f32).write_scalar(f32::INFINITY);
        assert_eq!(buf.read_scalar::<f32>().unwrap().to_bits(), 0x7FC0_BEEF);
        assert_eq!(buf.read_scalar::<f32>().unwrap().to_bits(), 0x8000_0000);
        assert_eq!(buf.read_scalar::<f32>().unwrap(), f32::INFINITY);
    }

    #[test]
    fn clear_resets() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3]);
        buf.read(1).unwrap();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.position(), 0);
    }

    #[test]
    fn save_and_load_through_store() {
        let store = InMemoryByteStore::new();
        let mut buf = Buffer::new();
        buf.write_scalar(42u32);
        buf.save_to(&store, "n.bin").unwrap();

        let mut loaded = Buffer::from_bytes(vec![9, 9, 9, 9, 9]);
        loaded.read(2).unwrap();
        loaded.load_from(&store, "n.bin").unwrap();
        assert_eq!(loaded.position(), 0);
        assert_eq!(loaded.len(), 4);
        assert_eq!(loaded.read_scalar::<u32>().unwrap(), 42);
    }

    #[test]
    fn load_failure_keeps_contents() {
        let store = InMemoryByteStore::new();
        let mut buf = Buffer::from_bytes(vec![1, 2]);
        let err = buf.load_from(&store, "missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(buf.as_bytes(), &[1, 2]);
    }

    #[test]
    fn save_failure_reports_store_error() {
        let store = InMemoryByteStore::new();
        store.set_read_only(true);
        let buf = Buffer::from_bytes(vec![1]);
        let err = buf.save_to(&store, "x").unwrap_err();
        assert!(matches!(err, StoreError::PermissionDenied(_)));
    }
}
