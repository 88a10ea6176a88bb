//! typed objects and their payload codecs.
//!
//! every stored object is one of four kinds: blob, tree, commit, tag.
//! Each kind owns its payload codec — blobs pass bytes through, trees
//! use the binary entry codec, commits and tags use the kvlm text
//! format. Dispatch always happens on the format tag read from the
//! stored header, never on runtime type inspection.

mod kvlm;
mod tree;

pub use kvlm::Kvlm;
pub use tree::{parse_tree, serialize_tree, TreeEntry};

use std::fmt;
use std::str::FromStr;

use crate::storage::error::{StoreError, StoreResult};

/// the four on-disk object kinds, as they appear in frame headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    /// parse a format tag from a stored header.
    pub fn from_bytes(tag: &[u8]) -> StoreResult<Self> {
        match tag {
            b"blob" => Ok(ObjectKind::Blob),
            b"tree" => Ok(ObjectKind::Tree),
            b"commit" => Ok(ObjectKind::Commit),
            b"tag" => Ok(ObjectKind::Tag),
            other => Err(StoreError::UnknownObjectType(
                String::from_utf8_lossy(other).into_owned(),
            )),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes())
    }
}

/// a decoded object. Owns its payload and is immutable once built; a
/// change means constructing a new object (and therefore a new id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitObject {
    Blob(Vec<u8>),
    Tree(Vec<TreeEntry>),
    Commit(Kvlm),
    Tag(Kvlm),
}

impl GitObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            GitObject::Blob(_) => ObjectKind::Blob,
            GitObject::Tree(_) => ObjectKind::Tree,
            GitObject::Commit(_) => ObjectKind::Commit,
            GitObject::Tag(_) => ObjectKind::Tag,
        }
    }

    /// encode the payload (header not included).
    pub fn serialize(&self) -> Vec<u8> {
        match self {
            GitObject::Blob(data) => data.clone(),
            GitObject::Tree(entries) => serialize_tree(entries),
            GitObject::Commit(kvlm) | GitObject::Tag(kvlm) => kvlm.serialize(),
        }
    }

    /// decode a payload under the kind named by a frame header.
    pub fn deserialize(kind: ObjectKind, data: &[u8]) -> StoreResult<GitObject> {
        Ok(match kind {
            ObjectKind::Blob => GitObject::Blob(data.to_vec()),
            ObjectKind::Tree => GitObject::Tree(parse_tree(data)?),
            ObjectKind::Commit => GitObject::Commit(Kvlm::parse(data)?),
            ObjectKind::Tag => GitObject::Tag(Kvlm::parse(data)?),
        })
    }
}

/// first occurrence of `needle` in `haystack` at or after `from`.
pub(crate) fn find_byte(haystack: &[u8], needle: u8, from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| i + from)
}
