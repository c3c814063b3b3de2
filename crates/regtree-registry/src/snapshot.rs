//! Owned, serializable copies of the tree and key path syntax.

use regtree_types::{Value, ValueType};
use serde::{Deserialize, Serialize};

use crate::entry::Entry;
use crate::error::{RegistryError, RegistryResult};

/// Detached copy of a key and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySnapshot {
    pub name: String,
    pub instance: u32,
    pub entries: Vec<Entry>,
    pub keys: Vec<KeySnapshot>,
}

impl KeySnapshot {
    /// Total number of entries in this subtree.
    pub fn entry_total(&self) -> usize {
        self.entries.len() + self.keys.iter().map(Self::entry_total).sum::<usize>()
    }
}

/// One entry of a flattened tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatEntry {
    /// Path of the owning key, as produced by [`KeyRef::path`](crate::KeyRef::path).
    pub path: String,
    pub name: String,
    /// Instance of the owning key.
    pub instance: u32,
    pub value_type: ValueType,
    pub value: Value,
}

/// One `name[instance]` step of a key path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub instance: u32,
}

/// Split `a/b[1]/c` into segments. An empty path (or `/`) names the root.
pub fn parse_path(path: &str) -> RegistryResult<Vec<PathSegment>> {
    let invalid = |reason: &str| RegistryError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split('/')
        .map(|raw| {
            if raw.is_empty() {
                return Err(invalid("empty segment"));
            }
            let Some(open) = raw.find('[') else {
                return Ok(PathSegment {
                    name: raw.to_string(),
                    instance: 0,
                });
            };
            let Some(digits) = raw[open + 1..].strip_suffix(']') else {
                return Err(invalid("unterminated instance selector"));
            };
            let instance = digits
                .parse::<u32>()
                .map_err(|_| invalid("instance is not a number"))?;
            if open == 0 {
                return Err(invalid("segment has no name"));
            }
            Ok(PathSegment {
                name: raw[..open].to_string(),
                instance,
            })
        })
        .collect()
}
