//! Encoding and decoding of the key tree.
//!
//! A key is written as `KEY_HEADER`, its name, a `u32` entity count, its
//! entries in order and then its subkeys in order. The root skips the
//! header and name. Instances are never written; decoding rebuilds them
//! from sibling order.

use regtree_buffer::{Buffer, BufferError, BufferResult};
use regtree_types::{is_reserved, ValueType, ENTRY_HEADER, KEY_HEADER};
use tracing::{trace, warn};

use crate::arena::{KeyArena, KeyId, MAX_DEPTH};
use crate::entry::decode_value;
use crate::error::{ParseError, ParseResult};

fn write_count(buf: &mut Buffer, count: usize) -> BufferResult<()> {
    let count = u32::try_from(count).map_err(|_| BufferError::CountOverflow(count))?;
    buf.write_scalar(count);
    Ok(())
}

/// Append `id` and its subtree, depth-first in list order.
pub(crate) fn encode_key(arena: &KeyArena, id: KeyId, buf: &mut Buffer) -> BufferResult<()> {
    let mut stack = vec![id];
    while let Some(next) = stack.pop() {
        let node = &arena[next];
        if node.parent.is_some() {
            buf.write_scalar(KEY_HEADER);
            buf.write_string(&node.name)?;
        }
        write_count(buf, node.entries.len() + node.children.len())?;
        for entry in &node.entries {
            entry.encode(buf)?;
        }
        stack.extend(node.children.iter().rev());
    }
    Ok(())
}

/// Decode `count` entities into `parent`.
pub(crate) fn decode_children(
    arena: &mut KeyArena,
    parent: KeyId,
    buf: &mut Buffer,
    count: u32,
    depth: usize,
) -> ParseResult<()> {
    for _ in 0..count {
        decode_entity(arena, parent, buf, depth)?;
    }
    Ok(())
}

fn decode_entity(
    arena: &mut KeyArena,
    parent: KeyId,
    buf: &mut Buffer,
    depth: usize,
) -> ParseResult<()> {
    let offset = buf.position();
    let header: u32 = buf.read_scalar()?;
    match header {
        ENTRY_HEADER => decode_entry(arena, parent, buf, offset),
        KEY_HEADER => decode_key(arena, parent, buf, offset, depth),
        other => {
            warn!(
                key = %arena[parent].name,
                offset,
                header = other,
                "invalid entity header"
            );
            Err(ParseError::InvalidEntityHeader {
                header: other,
                offset,
            })
        }
    }
}

fn decode_entry(
    arena: &mut KeyArena,
    parent: KeyId,
    buf: &mut Buffer,
    offset: usize,
) -> ParseResult<()> {
    let name = buf.read_string()?;
    let tag: u8 = buf.read_scalar()?;
    if name.is_empty() {
        warn!(key = %arena[parent].name, offset, "entry without a name");
        return Err(ParseError::EmptyName { offset });
    }
    if is_reserved(&name) {
        warn!(key = %arena[parent].name, entry = %name, "entry name is reserved");
        return Err(ParseError::ReservedName(name));
    }
    let unknown = |name: String| {
        warn!(key = %arena[parent].name, entry = %name, tag, "unrecognized entry type");
        ParseError::UnknownTag { name, tag }
    };
    let Ok(ty) = ValueType::from_tag(tag) else {
        return Err(unknown(name));
    };
    // tag 0 parses but carries no payload
    let Some(value) = decode_value(ty, buf)? else {
        return Err(unknown(name));
    };

    let node = &mut arena[parent];
    if let Err(existing) = node.upsert_entry(&name, value) {
        warn!(key = %node.name, entry = %name, %existing, found = %ty, "entry type conflict");
        return Err(ParseError::EntryConflict {
            name,
            existing,
            found: ty,
        });
    }
    trace!(key = %node.name, entry = %name, %ty, "decoded entry");
    Ok(())
}

fn decode_key(
    arena: &mut KeyArena,
    parent: KeyId,
    buf: &mut Buffer,
    offset: usize,
    depth: usize,
) -> ParseResult<()> {
    let name = buf.read_string()?;
    let count: u32 = buf.read_scalar()?;
    if name.is_empty() {
        warn!(key = %arena[parent].name, offset, "subkey without a name");
        return Err(ParseError::EmptyName { offset });
    }
    if is_reserved(&name) {
        warn!(key = %arena[parent].name, subkey = %name, "subkey name is reserved");
        return Err(ParseError::ReservedName(name));
    }
    if depth >= MAX_DEPTH {
        warn!(key = %arena[parent].name, depth, "keys nested too deeply");
        return Err(ParseError::TooDeep(MAX_DEPTH));
    }

    let child = arena.add_child(parent, name);
    trace!(key = %arena[child].name, instance = arena[child].instance, count, "decoding subkey");
    decode_children(arena, child, buf, count, depth + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::KeyNode;
    use regtree_types::Value;

    fn empty_tree() -> (KeyArena, KeyId) {
        let mut arena = KeyArena::default();
        let root = arena.insert(KeyNode::new("root", 0, None));
        (arena, root)
    }

    fn decode_root(bytes: Vec<u8>) -> (KeyArena, KeyId, ParseResult<()>) {
        let (mut arena, root) = empty_tree();
        let mut buf = Buffer::from_bytes(bytes);
        let result = buf
            .read_scalar::<u32>()
            .map_err(ParseError::from)
            .and_then(|count| decode_children(&mut arena, root, &mut buf, count, 0));
        (arena, root, result)
    }

    #[test]
    fn root_has_no_header() {
        let (arena, root) = empty_tree();
        let mut buf = Buffer::new();
        encode_key(&arena, root, &mut buf).unwrap();
        assert_eq!(buf.as_bytes(), &[0, 0, 0, 0]);
    }

    #[test]
    fn subkey_layout() {
        let (mut arena, root) = empty_tree();
        let a = arena.add_child(root, "a".into());
        arena[a].entries.push(crate::entry::Entry::new("n", Value::UInt8(7)));
        let mut buf = Buffer::new();
        encode_key(&arena, root, &mut buf).unwrap();
        assert_eq!(
            buf.as_bytes(),
            &[
                0, 0, 0, 1, // root count
                0x9E, 0x70, 0x81, 0x9E, // key header
                0, 0, 0, 1, b'a', // name
                0, 0, 0, 1, // count
                0x9E, 0x70, 0x81, 0x99, // entry header
                0, 0, 0, 1, b'n', // name
                4, 7, // u8 tag and payload
            ]
        );
    }

    #[test]
    fn encode_then_decode_rebuilds_instances() {
        let (mut arena, root) = empty_tree();
        for i in 0..3u8 {
            let k = arena.add_child(root, "dup".into());
            arena[k].entries.push(crate::entry::Entry::new("i", Value::UInt8(i)));
        }
        let mut buf = Buffer::new();
        encode_key(&arena, root, &mut buf).unwrap();

        let (decoded, droot, result) = decode_root(buf.into_bytes());
        result.unwrap();
        let children = &decoded[droot].children;
        assert_eq!(children.len(), 3);
        for (i, &child) in children.iter().enumerate() {
            assert_eq!(decoded[child].instance, i as u32);
            assert_eq!(decoded[child].entries[0].value(), &Value::UInt8(i as u8));
        }
    }

    #[test]
    fn bad_entity_header() {
        let mut buf = Buffer::new();
        buf.write_scalar(1u32).write_scalar(0xDEAD_BEEFu32);
        let (_, _, result) = decode_root(buf.into_bytes());
        assert_eq!(
            result.unwrap_err(),
            ParseError::InvalidEntityHeader {
                header: 0xDEAD_BEEF,
                offset: 4
            }
        );
    }

    #[test]
    fn unknown_and_zero_tags_fail() {
        for tag in [0u8, 9, 255] {
            let mut buf = Buffer::new();
            buf.write_scalar(1u32).write_scalar(ENTRY_HEADER);
            buf.write_string("x").unwrap();
            buf.write_scalar(tag).write_scalar(0u32);
            let (_, _, result) = decode_root(buf.into_bytes());
            assert_eq!(
                result.unwrap_err(),
                ParseError::UnknownTag {
                    name: "x".into(),
                    tag
                }
            );
        }
    }

    #[test]
    fn empty_and_reserved_names_fail() {
        let mut buf = Buffer::new();
        buf.write_scalar(1u32).write_scalar(KEY_HEADER);
        buf.write_string("").unwrap();
        buf.write_scalar(0u32);
        let (_, _, result) = decode_root(buf.into_bytes());
        assert_eq!(result.unwrap_err(), ParseError::EmptyName { offset: 4 });

        let mut buf = Buffer::new();
        buf.write_scalar(1u32).write_scalar(KEY_HEADER);
        buf.write_string("root").unwrap();
        buf.write_scalar(0u32);
        let (arena, _, result) = decode_root(buf.into_bytes());
        assert_eq!(result.unwrap_err(), ParseError::ReservedName("root".into()));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn conflicting_duplicate_entry() {
        let mut buf = Buffer::new();
        buf.write_scalar(2u32);
        for (tag, payload) in [(3u8, &[0u8, 0, 0, 1][..]), (7u8, &[0u8, 0, 0, 0][..])] {
            buf.write_scalar(ENTRY_HEADER);
            buf.write_string("x").unwrap();
            buf.write_scalar(tag).write(payload);
        }
        let (arena, root, result) = decode_root(buf.into_bytes());
        assert_eq!(
            result.unwrap_err(),
            ParseError::EntryConflict {
                name: "x".into(),
                existing: ValueType::Int32,
                found: ValueType::Float32
            }
        );
        assert_eq!(arena[root].entries[0].value(), &Value::Int32(1));
    }

    #[test]
    fn same_typed_duplicate_overwrites() {
        let mut buf = Buffer::new();
        buf.write_scalar(2u32);
        for v in [1u16, 2] {
            buf.write_scalar(ENTRY_HEADER);
            buf.write_string("x").unwrap();
            buf.write_scalar(5u8).write_scalar(v);
        }
        let (arena, root, result) = decode_root(buf.into_bytes());
        result.unwrap();
        assert_eq!(arena[root].entries.len(), 1);
        assert_eq!(arena[root].entries[0].value(), &Value::UInt16(2));
    }

    #[test]
    fn truncated_string_payload_is_an_error() {
        let mut buf = Buffer::new();
        buf.write_scalar(1u32).write_scalar(ENTRY_HEADER);
        buf.write_string("s").unwrap();
        buf.write_scalar(8u8).write_scalar(10u32).write(b"abc");
        let (arena, root, result) = decode_root(buf.into_bytes());
        assert!(matches!(
            result.unwrap_err(),
            ParseError::Buffer(BufferError::Underrun { .. })
        ));
        assert!(arena[root].entries.is_empty());
    }

    #[test]
    fn count_larger_than_stream() {
        let mut buf = Buffer::new();
        buf.write_scalar(5u32).write_scalar(KEY_HEADER);
        buf.write_string("a").unwrap();
        buf.write_scalar(0u32);
        let (arena, root, result) = decode_root(buf.into_bytes());
        assert!(matches!(result.unwrap_err(), ParseError::Buffer(_)));
        // partial tree stays
        assert_eq!(arena[root].children.len(), 1);
    }

    #[test]
    fn nesting_limit() {
        let mut buf = Buffer::new();
        buf.write_scalar(1u32);
        for _ in 0..=MAX_DEPTH {
            buf.write_scalar(KEY_HEADER);
            buf.write_string("k").unwrap();
            buf.write_scalar(1u32);
        }
        let (_, _, result) = decode_root(buf.into_bytes());
        assert_eq!(result.unwrap_err(), ParseError::TooDeep(MAX_DEPTH));
    }
}
