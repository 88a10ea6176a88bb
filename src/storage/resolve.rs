//! user-facing name resolution.
//!
//! turns "HEAD", a full hash, or a short hash prefix into exactly one
//! object id, optionally peeling toward a requested kind. Branch and
//! tag names are deliberately not handled here — callers route those
//! through the ref tree themselves.

use crate::object::{GitObject, Kvlm, ObjectKind};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::odb::ObjectStore;
use crate::storage::refs::RefStore;
use crate::storage::types::ObjectId;

/// every id `name` could mean: zero, one, or many.
pub(crate) fn resolve_candidates(
    odb: &ObjectStore,
    refs: &RefStore,
    name: &str,
) -> StoreResult<Vec<ObjectId>> {
    if name == "HEAD" {
        return Ok(vec![refs.resolve("HEAD")?]);
    }

    let is_hex = !name.is_empty() && name.bytes().all(|b| b.is_ascii_hexdigit());
    if is_hex && name.len() == 40 {
        return Ok(vec![ObjectId::from_hex(name)?]);
    }
    if is_hex && (4..40).contains(&name.len()) {
        return odb.scan_prefix(name);
    }

    Ok(Vec::new())
}

/// resolve `name` to exactly one id.
///
/// with a `wanted` kind, peels at most one step: a tag dereferences
/// its `object` field, a commit asked for as a tree dereferences its
/// `tree` field. Anything else that does not match the requested kind
/// is a miss, not an error chain — nested tags are never followed.
pub(crate) fn find(
    odb: &ObjectStore,
    refs: &RefStore,
    name: &str,
    wanted: Option<ObjectKind>,
) -> StoreResult<ObjectId> {
    let candidates = resolve_candidates(odb, refs, name)?;
    let id = match candidates.len() {
        0 => return Err(StoreError::NotFound(format!("no such object: {name}"))),
        1 => candidates[0],
        _ => {
            return Err(StoreError::AmbiguousReference {
                name: name.to_string(),
                candidates,
            })
        }
    };

    let Some(wanted) = wanted else {
        return Ok(id);
    };

    let obj = odb.read(&id)?;
    if obj.kind() == wanted {
        return Ok(id);
    }

    let target = match (&obj, wanted) {
        (GitObject::Tag(kvlm), _) => id_field(kvlm, b"object", &id)?,
        (GitObject::Commit(kvlm), ObjectKind::Tree) => id_field(kvlm, b"tree", &id)?,
        _ => {
            return Err(StoreError::NotFound(format!(
                "object {name} is a {}, not a {wanted}",
                obj.kind()
            )))
        }
    };

    // one peel step only: the landing object must already match
    let peeled = odb.read(&target)?;
    if peeled.kind() != wanted {
        return Err(StoreError::NotFound(format!(
            "{name} peels to a {}, not a {wanted}",
            peeled.kind()
        )));
    }
    Ok(target)
}

/// read a kvlm field that is expected to hold a full object id.
pub(crate) fn id_field(kvlm: &Kvlm, key: &[u8], owner: &ObjectId) -> StoreResult<ObjectId> {
    let key_name = String::from_utf8_lossy(key);
    let value = kvlm
        .first(key)
        .ok_or_else(|| StoreError::Format(format!("object {owner}: missing {key_name} field")))?;
    let hex_str = std::str::from_utf8(value)
        .map_err(|_| StoreError::Format(format!("object {owner}: non-utf8 {key_name} field")))?;
    ObjectId::from_hex(hex_str)
}
