//! Byte-order-safe binary buffer for regtree.
//!
//! Provides a growable byte sequence with a single forward read cursor and
//! typed read/write on top of a deterministic big-endian encoding.
//!
//! # Architecture
//!
//! - **ByteOrder**: big-endian encode/decode of fixed-width integers and
//!   `f32`, swapping only on little-endian hosts
//! - **Buffer**: append-only writes, cursor-based reads, whole-buffer
//!   load/save through a [`regtree_store::ByteStore`]
//! - **WireValue**: the canonical encoding of each primitive type, strings
//!   included (4-byte length prefix + raw UTF-8)

pub mod buffer;
pub mod error;
pub mod order;
pub mod wire;

pub use buffer::Buffer;
pub use error::{BufferError, BufferResult};
pub use order::{ByteOrder, Endian, Scalar};
pub use wire::WireValue;
