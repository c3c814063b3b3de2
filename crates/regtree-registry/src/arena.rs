//! Flat storage for the key tree.
//!
//! Keys live in generation-tagged slots and refer to each other by
//! [`KeyId`]. A parent owns its children through its `children` list;
//! the `parent` field is a plain back-index. Freeing a key frees its whole
//! subtree and bumps each slot's generation, so stale handles are detected
//! instead of aliasing a newer key.
//!
//! # Invariants
//!
//! - Within one parent, same-named children carry instances `0..n` in list
//!   order. [`KeyArena::renumber`] restores this and runs after every
//!   structural change (add, remove, rename).
//! - Every id in a live node's `children` refers to a live node whose
//!   `parent` is that node.

use std::ops::{Index, IndexMut};

use regtree_types::{Value, ValueType};

use crate::entry::Entry;

/// Deepest nesting of keys below the root. Enforced both when adding keys
/// and when decoding.
pub const MAX_DEPTH: usize = 512;

/// Handle to a key inside a [`Registry`](crate::Registry).
///
/// Handles stay valid until the key (or an ancestor) is removed. They do
/// not track instance renumbering; re-resolve by name after mutations if
/// the `(name, instance)` pair matters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyId {
    index: usize,
    generation: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct KeyNode {
    pub(crate) name: String,
    pub(crate) instance: u32,
    pub(crate) entries: Vec<Entry>,
    pub(crate) children: Vec<KeyId>,
    pub(crate) parent: Option<KeyId>,
}

impl KeyNode {
    pub(crate) fn new(name: impl Into<String>, instance: u32, parent: Option<KeyId>) -> Self {
        Self {
            name: name.into(),
            instance,
            entries: Vec::new(),
            children: Vec::new(),
            parent,
        }
    }

    pub(crate) fn entry_position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name() == name)
    }

    /// Get-or-create `name` holding `value`.
    ///
    /// An existing entry of the same type is overwritten in place. An
    /// existing entry of another type is left untouched and its type is
    /// returned as the error.
    pub(crate) fn upsert_entry(&mut self, name: &str, value: Value) -> Result<usize, ValueType> {
        match self.entry_position(name) {
            Some(index) => {
                let existing = self.entries[index].value_type();
                if existing != value.value_type() {
                    return Err(existing);
                }
                self.entries[index].set_value(value);
                Ok(index)
            }
            None => {
                self.entries.push(Entry::new(name, value));
                Ok(self.entries.len() - 1)
            }
        }
    }
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    node: Option<KeyNode>,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct KeyArena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl KeyArena {
    pub(crate) fn insert(&mut self, node: KeyNode) -> KeyId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            return KeyId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        KeyId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    pub(crate) fn get(&self, id: KeyId) -> Option<&KeyNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: KeyId) -> Option<&mut KeyNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    pub(crate) fn contains(&self, id: KeyId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live keys, root included.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    fn take(&mut self, id: KeyId) -> Option<KeyNode> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Some(node)
    }

    /// Free `id` and every descendant. Does not detach `id` from its parent.
    fn free_subtree(&mut self, id: KeyId) {
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.take(next) {
                stack.extend(node.children);
            }
        }
    }

    /// Number of ancestors of `id`. The root is at depth 0.
    pub(crate) fn depth(&self, id: KeyId) -> usize {
        let mut depth = 0;
        let mut cursor = self[id].parent;
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self[parent].parent;
        }
        depth
    }

    /// Count the children of `parent` named `name`.
    pub(crate) fn instance_count(&self, parent: KeyId, name: &str) -> u32 {
        let count = self[parent]
            .children
            .iter()
            .filter_map(|&child| self.get(child))
            .filter(|node| node.name == name)
            .count();
        count as u32
    }

    /// Reassign dense instance ids `0..n` to the children of `parent`
    /// named `name`, in list order. Returns `n`.
    pub(crate) fn renumber(&mut self, parent: KeyId, name: &str) -> u32 {
        let children = std::mem::take(&mut self[parent].children);
        let mut next = 0;
        for &child in &children {
            if let Some(node) = self.get_mut(child) {
                if node.name == name {
                    node.instance = next;
                    next += 1;
                }
            }
        }
        self[parent].children = children;
        next
    }

    /// Append a child named `name` to `parent` and return its id. The new
    /// key's instance is the number of same-named siblings before it.
    pub(crate) fn add_child(&mut self, parent: KeyId, name: String) -> KeyId {
        let instance = self.renumber(parent, &name);
        let id = self.insert(KeyNode::new(name, instance, Some(parent)));
        self[parent].children.push(id);
        id
    }

    pub(crate) fn find_child(&self, parent: KeyId, name: &str, instance: u32) -> Option<KeyId> {
        self[parent].children.iter().copied().find(|&child| {
            self.get(child)
                .map_or(false, |node| node.name == name && node.instance == instance)
        })
    }

    /// Remove one child and its subtree, then close the instance gap.
    pub(crate) fn remove_child(&mut self, parent: KeyId, name: &str, instance: u32) -> bool {
        let Some(child) = self.find_child(parent, name, instance) else {
            return false;
        };
        self[parent].children.retain(|&c| c != child);
        self.free_subtree(child);
        self.renumber(parent, name);
        true
    }

    /// Drop every entry and subkey of `id`.
    pub(crate) fn clear_key(&mut self, id: KeyId) {
        let node = &mut self[id];
        node.entries.clear();
        let children = std::mem::take(&mut node.children);
        for child in children {
            self.free_subtree(child);
        }
    }
}

impl Index<KeyId> for KeyArena {
    type Output = KeyNode;

    fn index(&self, id: KeyId) -> &KeyNode {
        self.get(id)
            .unwrap_or_else(|| panic!("stale key handle: {id:?}"))
    }
}

impl IndexMut<KeyId> for KeyArena {
    fn index_mut(&mut self, id: KeyId) -> &mut KeyNode {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("stale key handle: {id:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_with_root() -> (KeyArena, KeyId) {
        let mut arena = KeyArena::default();
        let root = arena.insert(KeyNode::new("root", 0, None));
        (arena, root)
    }

    fn instances(arena: &KeyArena, parent: KeyId) -> Vec<(String, u32)> {
        arena[parent]
            .children
            .iter()
            .map(|&c| (arena[c].name.clone(), arena[c].instance))
            .collect()
    }

    #[test]
    fn same_named_children_get_dense_instances() {
        let (mut arena, root) = arena_with_root();
        arena.add_child(root, "A".into());
        arena.add_child(root, "B".into());
        arena.add_child(root, "A".into());
        arena.add_child(root, "A".into());
        assert_eq!(
            instances(&arena, root),
            vec![
                ("A".into(), 0),
                ("B".into(), 0),
                ("A".into(), 1),
                ("A".into(), 2)
            ]
        );
        assert_eq!(arena.instance_count(root, "A"), 3);
        assert_eq!(arena.instance_count(root, "C"), 0);
    }

    #[test]
    fn remove_child_renumbers_survivors() {
        let (mut arena, root) = arena_with_root();
        let a0 = arena.add_child(root, "A".into());
        arena.add_child(root, "A".into());
        let a2 = arena.add_child(root, "A".into());
        assert!(arena.remove_child(root, "A", 1));
        assert_eq!(arena[a0].instance, 0);
        assert_eq!(arena[a2].instance, 1);
        assert!(!arena.remove_child(root, "A", 2));
    }

    #[test]
    fn removing_frees_whole_subtree() {
        let (mut arena, root) = arena_with_root();
        let a = arena.add_child(root, "a".into());
        let b = arena.add_child(a, "b".into());
        let c = arena.add_child(b, "c".into());
        assert_eq!(arena.len(), 4);
        arena.remove_child(root, "a", 0);
        assert_eq!(arena.len(), 1);
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert!(!arena.contains(c));
    }

    #[test]
    fn reused_slot_does_not_revive_old_handle() {
        let (mut arena, root) = arena_with_root();
        let old = arena.add_child(root, "x".into());
        arena.remove_child(root, "x", 0);
        let new = arena.add_child(root, "y".into());
        assert_eq!(old.index, new.index);
        assert!(arena.get(old).is_none());
        assert_eq!(arena[new].name, "y");
    }

    #[test]
    fn clear_key_keeps_the_key() {
        let (mut arena, root) = arena_with_root();
        let a = arena.add_child(root, "a".into());
        arena.add_child(a, "b".into());
        arena[a].entries.push(Entry::new("e", Value::UInt8(1)));
        arena.clear_key(a);
        assert!(arena.contains(a));
        assert!(arena[a].entries.is_empty());
        assert!(arena[a].children.is_empty());
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn upsert_rules() {
        let mut node = KeyNode::new("k", 0, None);
        assert_eq!(node.upsert_entry("x", Value::Int32(1)), Ok(0));
        assert_eq!(node.upsert_entry("x", Value::Int32(2)), Ok(0));
        assert_eq!(node.entries[0].value(), &Value::Int32(2));
        assert_eq!(
            node.upsert_entry("x", Value::Float32(1.0)),
            Err(ValueType::Int32)
        );
        assert_eq!(node.entries[0].value(), &Value::Int32(2));
    }

    #[test]
    fn depth_counts_ancestors() {
        let (mut arena, root) = arena_with_root();
        let a = arena.add_child(root, "a".into());
        let b = arena.add_child(a, "b".into());
        assert_eq!(arena.depth(root), 0);
        assert_eq!(arena.depth(a), 1);
        assert_eq!(arena.depth(b), 2);
    }

    #[test]
    #[should_panic(expected = "stale key handle")]
    fn indexing_stale_handle_panics() {
        let (mut arena, root) = arena_with_root();
        let a = arena.add_child(root, "a".into());
        arena.remove_child(root, "a", 0);
        let _ = &arena[a];
    }
}
