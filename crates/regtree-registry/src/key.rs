//! Borrowed views over one key of the tree.
//!
//! [`KeyRef`] reads, [`KeyMut`] reads and mutates. Both are thin
//! `(arena, id)` pairs; they are created by [`Registry`](crate::Registry)
//! and by navigating from another view.

use regtree_types::{validate_name, Primitive, TypeError, Value, ValueType};
use tracing::warn;

use crate::arena::{KeyArena, KeyId, MAX_DEPTH};
use crate::entry::{Entry, EntryMut};
use crate::error::{RegistryError, RegistryResult};
use crate::snapshot::KeySnapshot;

/// Map a name check failure onto the registry taxonomy.
fn check_name(name: &str) -> RegistryResult<()> {
    validate_name(name).map_err(|err| match err {
        TypeError::ReservedName(name) => RegistryError::NameReserved(name),
        _ => RegistryError::EmptyName,
    })
}

/// Emit the diagnostic for a rejected tree operation and pass the error on.
fn rejected(key: &str, op: &'static str, err: RegistryError) -> RegistryError {
    warn!(key, op, error = %err, "registry operation rejected");
    err
}

/// Read-only view of a key.
#[derive(Clone, Copy)]
pub struct KeyRef<'a> {
    arena: &'a KeyArena,
    id: KeyId,
}

impl<'a> KeyRef<'a> {
    pub(crate) fn new(arena: &'a KeyArena, id: KeyId) -> Self {
        Self { arena, id }
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        &self.arena[self.id].name
    }

    /// Rank among same-named siblings. Recomputed on every structural
    /// change to the parent, so it is not a stable identifier.
    pub fn instance(&self) -> u32 {
        self.arena[self.id].instance
    }

    /// `false` only for the root.
    pub fn has_parent(&self) -> bool {
        self.arena[self.id].parent.is_some()
    }

    pub fn parent(&self) -> Option<KeyRef<'a>> {
        self.arena[self.id]
            .parent
            .map(|id| KeyRef::new(self.arena, id))
    }

    pub fn entry_count(&self) -> usize {
        self.arena[self.id].entries.len()
    }

    pub fn key_count(&self) -> usize {
        self.arena[self.id].children.len()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &'a Entry> + 'a {
        self.arena[self.id].entries.iter()
    }

    /// Direct subkeys in list order.
    pub fn keys(&self) -> impl Iterator<Item = KeyRef<'a>> + 'a {
        let arena = self.arena;
        arena[self.id]
            .children
            .iter()
            .map(move |&id| KeyRef::new(arena, id))
    }

    /// The untyped entry called `name`.
    pub fn raw_entry(&self, name: &str) -> RegistryResult<&'a Entry> {
        let node = &self.arena[self.id];
        if name.is_empty() {
            return Err(rejected(&node.name, "get_entry", RegistryError::EmptyName));
        }
        node.entries
            .iter()
            .find(|e| e.name() == name)
            .ok_or_else(|| {
                rejected(
                    &node.name,
                    "get_entry",
                    RegistryError::EntryNotFound {
                        key: node.name.clone(),
                        entry: name.to_string(),
                    },
                )
            })
    }

    /// The payload of entry `name` as `T`.
    ///
    /// Fails if the name is empty, the entry does not exist, or it holds a
    /// type other than `T`. The entry itself is never changed.
    pub fn entry<T: Primitive>(&self, name: &str) -> RegistryResult<&'a T> {
        let entry = self.raw_entry(name)?;
        entry.get::<T>().ok_or_else(|| {
            rejected(
                self.name(),
                "get_entry",
                RegistryError::TypeMismatch {
                    entry: name.to_string(),
                    expected: T::TYPE,
                    actual: entry.value_type(),
                },
            )
        })
    }

    /// The entry at `index` in insertion order.
    pub fn entry_at(&self, index: usize) -> RegistryResult<&'a Entry> {
        let node = &self.arena[self.id];
        node.entries.get(index).ok_or_else(|| {
            rejected(
                &node.name,
                "entry_at",
                RegistryError::IndexOutOfRange {
                    key: node.name.clone(),
                    index,
                    len: node.entries.len(),
                },
            )
        })
    }

    /// Type of entry `name`, or [`ValueType::Unknown`] if it does not exist.
    pub fn entry_type(&self, name: &str) -> ValueType {
        self.arena[self.id]
            .entries
            .iter()
            .find(|e| e.name() == name)
            .map_or(ValueType::Unknown, Entry::value_type)
    }

    /// Render entry `name` as text, whatever its type.
    pub fn stringify_entry(&self, name: &str) -> RegistryResult<String> {
        Ok(self.raw_entry(name)?.value().to_string())
    }

    pub fn stringify_entry_at(&self, index: usize) -> RegistryResult<String> {
        Ok(self.entry_at(index)?.value().to_string())
    }

    fn find_child(&self, name: &str, instance: u32) -> RegistryResult<KeyId> {
        let node = &self.arena[self.id];
        check_name(name).map_err(|err| rejected(&node.name, "get_key", err))?;
        self.arena.find_child(self.id, name, instance).ok_or_else(|| {
            rejected(
                &node.name,
                "get_key",
                RegistryError::KeyNotFound {
                    parent: node.name.clone(),
                    name: name.to_string(),
                    instance,
                },
            )
        })
    }

    fn child_at(&self, index: usize) -> RegistryResult<KeyId> {
        let node = &self.arena[self.id];
        node.children.get(index).copied().ok_or_else(|| {
            rejected(
                &node.name,
                "key_at",
                RegistryError::IndexOutOfRange {
                    key: node.name.clone(),
                    index,
                    len: node.children.len(),
                },
            )
        })
    }

    /// The subkey `name` with the given instance.
    pub fn key(&self, name: &str, instance: u32) -> RegistryResult<KeyRef<'a>> {
        let id = self.find_child(name, instance)?;
        Ok(KeyRef::new(self.arena, id))
    }

    /// The subkey at `index` in list order.
    pub fn key_at(&self, index: usize) -> RegistryResult<KeyRef<'a>> {
        let id = self.child_at(index)?;
        Ok(KeyRef::new(self.arena, id))
    }

    /// Number of subkeys called `name`.
    pub fn instance_count(&self, name: &str) -> u32 {
        self.arena.instance_count(self.id, name)
    }

    /// Slash-separated path from the root, `name[n]` for instances above 0.
    /// The root's path is empty.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(*self);
        while let Some(key) = cursor {
            if !key.has_parent() {
                break;
            }
            segments.push(match key.instance() {
                0 => key.name().to_string(),
                n => format!("{}[{n}]", key.name()),
            });
            cursor = key.parent();
        }
        segments.reverse();
        segments.join("/")
    }

    /// Owned copy of this key and its subtree.
    pub fn snapshot(&self) -> KeySnapshot {
        KeySnapshot {
            name: self.name().to_string(),
            instance: self.instance(),
            entries: self.entries().cloned().collect(),
            keys: self.keys().map(|k| k.snapshot()).collect(),
        }
    }
}

impl std::fmt::Debug for KeyRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRef")
            .field("name", &self.name())
            .field("instance", &self.instance())
            .field("entries", &self.entry_count())
            .field("keys", &self.key_count())
            .finish()
    }
}

/// Mutable view of a key.
pub struct KeyMut<'a> {
    arena: &'a mut KeyArena,
    id: KeyId,
}

impl<'a> KeyMut<'a> {
    pub(crate) fn new(arena: &'a mut KeyArena, id: KeyId) -> Self {
        Self { arena, id }
    }

    /// Read-only view of the same key.
    pub fn view(&self) -> KeyRef<'_> {
        KeyRef::new(&*self.arena, self.id)
    }

    pub fn id(&self) -> KeyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.arena[self.id].name
    }

    pub fn instance(&self) -> u32 {
        self.arena[self.id].instance
    }

    pub fn entry_count(&self) -> usize {
        self.arena[self.id].entries.len()
    }

    pub fn key_count(&self) -> usize {
        self.arena[self.id].children.len()
    }

    pub fn instance_count(&self, name: &str) -> u32 {
        self.arena.instance_count(self.id, name)
    }

    /// See [`KeyRef::entry`].
    pub fn entry<T: Primitive>(&self, name: &str) -> RegistryResult<&T> {
        KeyRef::new(&*self.arena, self.id).entry(name)
    }

    fn reject(&self, op: &'static str, err: RegistryError) -> RegistryError {
        rejected(&self.arena[self.id].name, op, err)
    }

    fn entry_not_found(&self, name: &str) -> RegistryError {
        RegistryError::EntryNotFound {
            key: self.name().to_string(),
            entry: name.to_string(),
        }
    }

    /// Typed mutable access to an existing entry.
    pub fn entry_mut<T: Primitive>(&mut self, name: &str) -> RegistryResult<EntryMut<'_, T>> {
        if name.is_empty() {
            return Err(self.reject("entry_mut", RegistryError::EmptyName));
        }
        let Some(index) = self.arena[self.id].entry_position(name) else {
            let err = self.entry_not_found(name);
            return Err(self.reject("entry_mut", err));
        };
        let node = &mut self.arena[self.id];
        let key = &node.name;
        let entry = &mut node.entries[index];
        let actual = entry.value_type();
        entry.typed_mut::<T>().ok_or_else(|| {
            rejected(
                key,
                "entry_mut",
                RegistryError::TypeMismatch {
                    entry: name.to_string(),
                    expected: T::TYPE,
                    actual,
                },
            )
        })
    }

    /// Get-or-create entry `name` of type `T`.
    ///
    /// A new entry starts at `T::default()` and is appended. An existing
    /// entry of type `T` is returned unchanged; one of another type is an
    /// error and is left as it is.
    pub fn add_entry<T: Primitive>(&mut self, name: &str) -> RegistryResult<EntryMut<'_, T>> {
        check_name(name).map_err(|err| self.reject("add_entry", err))?;
        let node = &mut self.arena[self.id];
        if node.entry_position(name).is_none() {
            node.entries.push(Entry::new(name, T::default().into_value()));
        }
        self.entry_mut(name)
    }

    /// Get-or-create entry `name` and store `value` in it.
    pub fn set_entry<T: Primitive>(&mut self, name: &str, value: T) -> RegistryResult<()> {
        self.add_entry::<T>(name)?.set(value);
        Ok(())
    }

    /// Untyped form of [`set_entry`](Self::set_entry).
    pub fn insert_value(&mut self, name: &str, value: Value) -> RegistryResult<()> {
        check_name(name).map_err(|err| self.reject("insert_value", err))?;
        let found = value.value_type();
        match self.arena[self.id].upsert_entry(name, value) {
            Ok(_) => Ok(()),
            Err(actual) => {
                let err = RegistryError::TypeMismatch {
                    entry: name.to_string(),
                    expected: found,
                    actual,
                };
                Err(self.reject("insert_value", err))
            }
        }
    }

    /// Rename an entry in place, keeping its position.
    pub fn rename_entry(&mut self, old: &str, new: &str) -> RegistryResult<()> {
        if old.is_empty() {
            return Err(self.reject("rename_entry", RegistryError::EmptyName));
        }
        check_name(new).map_err(|err| self.reject("rename_entry", err))?;
        let node = &self.arena[self.id];
        if node.entry_position(new).is_some() {
            let err = RegistryError::EntryExists {
                key: node.name.clone(),
                entry: new.to_string(),
            };
            return Err(self.reject("rename_entry", err));
        }
        let Some(index) = node.entry_position(old) else {
            let err = self.entry_not_found(old);
            return Err(self.reject("rename_entry", err));
        };
        self.arena[self.id].entries[index].rename(new);
        Ok(())
    }

    /// Remove entry `name`. Returns `false` if there was none.
    pub fn remove_entry(&mut self, name: &str) -> bool {
        let node = &mut self.arena[self.id];
        match node.entry_position(name) {
            Some(index) => {
                node.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append a subkey called `name`. Its instance is the number of
    /// same-named siblings already present.
    ///
    /// Fails with [`RegistryError::TooDeep`] if the new key would sit more
    /// than [`MAX_DEPTH`] levels below the root.
    pub fn add_key(&mut self, name: &str) -> RegistryResult<KeyMut<'_>> {
        check_name(name).map_err(|err| self.reject("add_key", err))?;
        if self.arena.depth(self.id) >= MAX_DEPTH {
            return Err(self.reject("add_key", RegistryError::TooDeep(MAX_DEPTH)));
        }
        let child = self.arena.add_child(self.id, name.to_string());
        Ok(KeyMut::new(&mut *self.arena, child))
    }

    pub fn key_mut(&mut self, name: &str, instance: u32) -> RegistryResult<KeyMut<'_>> {
        let child = KeyRef::new(&*self.arena, self.id).find_child(name, instance)?;
        Ok(KeyMut::new(&mut *self.arena, child))
    }

    pub fn key_at_mut(&mut self, index: usize) -> RegistryResult<KeyMut<'_>> {
        let child = KeyRef::new(&*self.arena, self.id).child_at(index)?;
        Ok(KeyMut::new(&mut *self.arena, child))
    }

    /// Remove one subkey and its subtree, then renumber the remaining
    /// siblings of that name. Returns `false` if there was no such key.
    pub fn remove_key(&mut self, name: &str, instance: u32) -> bool {
        self.arena.remove_child(self.id, name, instance)
    }

    /// Rename this key. The root cannot be renamed.
    ///
    /// Both the old and the new sibling group are renumbered, so this key's
    /// instance becomes its rank among the new group in list order.
    pub fn rename(&mut self, name: &str) -> RegistryResult<()> {
        let Some(parent) = self.arena[self.id].parent else {
            return Err(self.reject("rename", RegistryError::RootRename));
        };
        check_name(name).map_err(|err| self.reject("rename", err))?;
        let old = std::mem::replace(&mut self.arena[self.id].name, name.to_string());
        self.arena.renumber(parent, &old);
        self.arena.renumber(parent, name);
        Ok(())
    }

    /// Drop every entry and subkey.
    pub fn clear(&mut self) {
        self.arena.clear_key(self.id);
    }

    /// Move the view to the parent key, or `None` at the root.
    pub fn into_parent(self) -> Option<KeyMut<'a>> {
        let parent = self.arena[self.id].parent?;
        Some(KeyMut::new(self.arena, parent))
    }

    pub fn snapshot(&self) -> KeySnapshot {
        self.view().snapshot()
    }
}

impl std::fmt::Debug for KeyMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMut")
            .field("name", &self.name())
            .field("instance", &self.instance())
            .field("entries", &self.entry_count())
            .field("keys", &self.key_count())
            .finish()
    }
}
