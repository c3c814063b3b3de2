use regtree_buffer::Buffer;
use regtree_store::ByteStore;
use regtree_types::{FORMAT_VERSION, REGISTRY_HEADER, ROOT_NAME};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::arena::{KeyArena, KeyId, KeyNode};
use crate::codec;
use crate::error::{ParseError, RegistryError, RegistryResult};
use crate::key::{KeyMut, KeyRef};
use crate::snapshot::{parse_path, FlatEntry, KeySnapshot};

/// Options for [`Registry::load_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Merge the loaded tree into the current one instead of replacing it.
    pub append: bool,
}

impl LoadOptions {
    pub fn append() -> Self {
        Self { append: true }
    }
}

/// A key tree rooted at `"root"`, with the framed binary file format.
///
/// A registry file is `REGISTRY_HEADER` (u32), `FORMAT_VERSION` (u16) and
/// the root's entity stream, all big-endian.
#[derive(Clone, Debug)]
pub struct Registry {
    arena: KeyArena,
    root: KeyId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry holding only the root key.
    pub fn new() -> Self {
        let mut arena = KeyArena::default();
        let root = arena.insert(KeyNode::new(ROOT_NAME, 0, None));
        Self { arena, root }
    }

    pub fn root(&self) -> KeyRef<'_> {
        KeyRef::new(&self.arena, self.root)
    }

    pub fn root_mut(&mut self) -> KeyMut<'_> {
        KeyMut::new(&mut self.arena, self.root)
    }

    pub fn root_id(&self) -> KeyId {
        self.root
    }

    /// Resolve a handle obtained from [`KeyRef::id`] or [`KeyMut::id`].
    pub fn key(&self, id: KeyId) -> RegistryResult<KeyRef<'_>> {
        if !self.arena.contains(id) {
            warn!(?id, "stale key handle");
            return Err(RegistryError::StaleKey);
        }
        Ok(KeyRef::new(&self.arena, id))
    }

    pub fn key_mut(&mut self, id: KeyId) -> RegistryResult<KeyMut<'_>> {
        if !self.arena.contains(id) {
            warn!(?id, "stale key handle");
            return Err(RegistryError::StaleKey);
        }
        Ok(KeyMut::new(&mut self.arena, id))
    }

    /// Number of live keys, root included.
    pub fn key_len(&self) -> usize {
        self.arena.len()
    }

    fn resolve(&self, path: &str) -> RegistryResult<KeyId> {
        let mut key = self.root();
        for segment in parse_path(path)? {
            key = key.key(&segment.name, segment.instance)?;
        }
        Ok(key.id())
    }

    /// Look up a key by path, e.g. `"graphics/display[1]"`.
    pub fn find(&self, path: &str) -> RegistryResult<KeyRef<'_>> {
        let id = self.resolve(path)?;
        Ok(KeyRef::new(&self.arena, id))
    }

    pub fn find_mut(&mut self, path: &str) -> RegistryResult<KeyMut<'_>> {
        let id = self.resolve(path)?;
        Ok(KeyMut::new(&mut self.arena, id))
    }

    /// Drop every entry and subkey of the root.
    pub fn clear(&mut self) {
        self.arena.clear_key(self.root);
    }

    /// Append the framed encoding of the whole tree to `buf`.
    pub fn save_to_buffer(&self, buf: &mut Buffer) -> RegistryResult<()> {
        let start = buf.len();
        buf.write_scalar(REGISTRY_HEADER).write_scalar(FORMAT_VERSION);
        codec::encode_key(&self.arena, self.root, buf)?;
        debug!(
            keys = self.arena.len(),
            bytes = buf.len() - start,
            "registry encoded"
        );
        Ok(())
    }

    /// Decode a framed registry from `buf`, starting at its cursor.
    ///
    /// Magic, version and the root entity count are read first; a failure
    /// there leaves the tree as it was. Unless `append` is set the tree is
    /// then cleared. A failure in the entity stream leaves whatever was
    /// decoded up to that point.
    pub fn load_from_buffer(&mut self, buf: &mut Buffer, append: bool) -> RegistryResult<()> {
        let magic: u32 = buf.read_scalar().map_err(ParseError::from)?;
        if magic != REGISTRY_HEADER {
            warn!(magic, "not a registry stream");
            return Err(ParseError::InvalidMagic {
                expected: REGISTRY_HEADER,
                actual: magic,
            }
            .into());
        }
        let version: u16 = buf.read_scalar().map_err(ParseError::from)?;
        if version != FORMAT_VERSION {
            warn!(version, "unsupported registry version");
            return Err(ParseError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: version,
            }
            .into());
        }

        let count: u32 = buf.read_scalar().map_err(ParseError::from)?;
        if !append {
            self.clear();
        }
        codec::decode_children(&mut self.arena, self.root, buf, count, 0)?;
        debug!(keys = self.arena.len(), append, "registry decoded");
        Ok(())
    }

    /// Encode the tree and write it to `name` in `store`.
    pub fn save_to_file<S: ByteStore + ?Sized>(&self, store: &S, name: &str) -> RegistryResult<()> {
        if name.is_empty() {
            warn!("save_to_file called without a name");
            return Err(RegistryError::NoName);
        }
        let mut buf = Buffer::new();
        self.save_to_buffer(&mut buf)?;
        buf.save_to(store, name).map_err(|source| {
            warn!(resource = name, error = %source, "registry save failed");
            RegistryError::FileSave {
                name: name.to_string(),
                source,
            }
        })
    }

    /// Read `name` from `store` and decode it into the tree.
    ///
    /// With `append == false` the current content is replaced, but only once
    /// the stream's magic, version and root count have been read.
    pub fn load_from_file<S: ByteStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        append: bool,
    ) -> RegistryResult<()> {
        if name.is_empty() {
            warn!("load_from_file called without a name");
            return Err(RegistryError::NoName);
        }
        let mut buf = Buffer::new();
        buf.load_from(store, name).map_err(|source| {
            warn!(resource = name, error = %source, "registry load failed");
            RegistryError::FileLoad {
                name: name.to_string(),
                source,
            }
        })?;
        self.load_from_buffer(&mut buf, append).map_err(|err| {
            warn!(resource = name, error = %err, "registry parse failed");
            err
        })
    }

    pub fn load_with<S: ByteStore + ?Sized>(
        &mut self,
        store: &S,
        name: &str,
        options: LoadOptions,
    ) -> RegistryResult<()> {
        self.load_from_file(store, name, options.append)
    }

    /// The framed encoding as a byte vector.
    pub fn to_bytes(&self) -> RegistryResult<Vec<u8>> {
        let mut buf = Buffer::new();
        self.save_to_buffer(&mut buf)?;
        Ok(buf.into_bytes())
    }

    /// Decode a registry from a framed byte vector.
    pub fn from_bytes(bytes: Vec<u8>) -> RegistryResult<Self> {
        let mut registry = Self::new();
        registry.load_from_buffer(&mut Buffer::from_bytes(bytes), false)?;
        Ok(registry)
    }

    /// Owned copy of the whole tree.
    pub fn snapshot(&self) -> KeySnapshot {
        self.root().snapshot()
    }

    /// Every entry of the tree in pre-order, with its key's path.
    pub fn flatten(&self) -> Vec<FlatEntry> {
        let mut out = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(key) = stack.pop() {
            let path = key.path();
            out.extend(key.entries().map(|entry| FlatEntry {
                path: path.clone(),
                name: entry.name().to_string(),
                instance: key.instance(),
                value_type: entry.value_type(),
                value: entry.value().clone(),
            }));
            let children: Vec<_> = key.keys().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }
}
