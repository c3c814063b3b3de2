//! Deterministic big-endian encoding independent of host byte order.
//!
//! A value's in-memory bytes are taken as the host lays them out and then
//! reversed on little-endian hosts, so the encoded form is always
//! big-endian. `f32` is encoded through its `u32` bit pattern, which keeps
//! NaN payloads and signed zero intact.
//!
//! The host order is detected once and cached. [`ByteOrder::simulated`]
//! pins a specific host order so both paths can be exercised on any machine.

use std::sync::OnceLock;

/// Byte order of a host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// The byte order of the running machine, detected on first call.
    pub fn host() -> Self {
        static HOST: OnceLock<Endian> = OnceLock::new();
        *HOST.get_or_init(|| {
            if u16::from_ne_bytes([0, 1]) == 1 {
                Endian::Big
            } else {
                Endian::Little
            }
        })
    }
}

/// A fixed-width value with a canonical big-endian encoding.
pub trait Scalar: Copy {
    /// Encoded width in bytes.
    const WIDTH: usize;

    /// Byte array of length [`Scalar::WIDTH`].
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Default + Copy;

    /// The value's in-memory bytes on a host with order `host`.
    fn to_host_bytes(self, host: Endian) -> Self::Bytes;

    /// Rebuild a value from its in-memory bytes on a host with order `host`.
    fn from_host_bytes(bytes: Self::Bytes, host: Endian) -> Self;
}

macro_rules! impl_scalar_int {
    ($($ty:ty => $width:literal),*) => {$(
        impl Scalar for $ty {
            const WIDTH: usize = $width;
            type Bytes = [u8; $width];

            fn to_host_bytes(self, host: Endian) -> Self::Bytes {
                match host {
                    Endian::Big => self.to_be_bytes(),
                    Endian::Little => self.to_le_bytes(),
                }
            }

            fn from_host_bytes(bytes: Self::Bytes, host: Endian) -> Self {
                match host {
                    Endian::Big => <$ty>::from_be_bytes(bytes),
                    Endian::Little => <$ty>::from_le_bytes(bytes),
                }
            }
        }
    )*};
}

impl_scalar_int!(i8 => 1, i16 => 2, i32 => 4, u8 => 1, u16 => 2, u32 => 4);

impl Scalar for f32 {
    const WIDTH: usize = 4;
    type Bytes = [u8; 4];

    fn to_host_bytes(self, host: Endian) -> Self::Bytes {
        self.to_bits().to_host_bytes(host)
    }

    fn from_host_bytes(bytes: Self::Bytes, host: Endian) -> Self {
        f32::from_bits(u32::from_host_bytes(bytes, host))
    }
}

/// Big-endian codec bound to a host byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteOrder {
    host: Endian,
}

impl ByteOrder {
    /// Codec for the running machine.
    pub fn native() -> Self {
        Self {
            host: Endian::host(),
        }
    }

    /// Codec that behaves as if running on a host with order `host`.
    pub fn simulated(host: Endian) -> Self {
        Self { host }
    }

    /// The host order this codec assumes.
    pub fn host(&self) -> Endian {
        self.host
    }

    /// Returns `true` if bytes are reversed on encode/decode.
    pub fn swaps(&self) -> bool {
        self.host == Endian::Little
    }

    /// Encode `value` as big-endian bytes.
    pub fn encode<T: Scalar>(&self, value: T) -> T::Bytes {
        let mut bytes = value.to_host_bytes(self.host);
        if self.swaps() {
            bytes.as_mut().reverse();
        }
        bytes
    }

    /// Decode big-endian bytes. Exact bitwise inverse of [`ByteOrder::encode`].
    pub fn decode<T: Scalar>(&self, mut bytes: T::Bytes) -> T {
        if self.swaps() {
            bytes.as_mut().reverse();
        }
        T::from_host_bytes(bytes, self.host)
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::native()
    }
}
