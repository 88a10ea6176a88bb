//! the object database: content-addressed, zlib-compressed, sharded.
//!
//! an object on disk is the frame `kind SP decimal-length NUL payload`,
//! compressed whole and stored at `objects/<first two hex>/<remaining
//! 38>`. The id is the SHA-1 of the uncompressed frame, so identical
//! content always lands at the same path and rewrites are no-ops.

use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::object::{find_byte, GitObject, ObjectKind};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::types::ObjectId;

/// read/write access to the `objects/` tree under a gitdir.
pub struct ObjectStore {
    objects_dir: PathBuf,
}

impl ObjectStore {
    pub(crate) fn new(gitdir: &Path) -> Self {
        Self {
            objects_dir: gitdir.join("objects"),
        }
    }

    /// frame and hash an object without touching disk.
    pub fn hash_object(obj: &GitObject) -> (ObjectId, Vec<u8>) {
        let payload = obj.serialize();
        let mut frame = Vec::with_capacity(payload.len() + 16);
        frame.extend_from_slice(obj.kind().as_str().as_bytes());
        frame.push(b' ');
        frame.extend_from_slice(payload.len().to_string().as_bytes());
        frame.push(0);
        frame.extend_from_slice(&payload);

        let digest = Sha1::digest(&frame);
        (ObjectId::from_bytes(digest.into()), frame)
    }

    /// hash an object and, when `persist` is set, write it into its
    /// shard. The id comes back either way, so callers can do dry-run
    /// hashing without a writable store.
    pub fn write(&self, obj: &GitObject, persist: bool) -> StoreResult<ObjectId> {
        let (id, frame) = Self::hash_object(obj);
        if !persist {
            return Ok(id);
        }

        let hex = id.to_hex();
        let shard = self.objects_dir.join(&hex[..2]);
        let path = shard.join(&hex[2..]);
        if path.exists() {
            // content-addressed: same id means the same bytes are
            // already on disk
            return Ok(id);
        }

        fs::create_dir_all(&shard)?;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&frame)?;
        let compressed = encoder.finish()?;

        // publish via rename so the shard never holds a partial object
        let mut tmp = tempfile::NamedTempFile::new_in(&shard)?;
        tmp.write_all(&compressed)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(id = %id, bytes = frame.len(), "stored object");
        Ok(id)
    }

    /// load and decode one object by id.
    pub fn read(&self, id: &ObjectId) -> StoreResult<GitObject> {
        let path = self.object_path(id);
        let compressed = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::NotFound(format!("object {id}")),
            _ => StoreError::Io(e),
        })?;

        let mut raw = Vec::new();
        ZlibDecoder::new(compressed.as_slice()).read_to_end(&mut raw)?;

        let spc = find_byte(&raw, b' ', 0)
            .ok_or_else(|| StoreError::Format(format!("object {id}: missing kind header")))?;
        let nul = find_byte(&raw, 0, spc)
            .ok_or_else(|| StoreError::Format(format!("object {id}: missing length header")))?;

        let kind = ObjectKind::from_bytes(&raw[..spc])?;
        let size: usize = std::str::from_utf8(&raw[spc + 1..nul])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| StoreError::Format(format!("object {id}: malformed length header")))?;

        let payload = &raw[nul + 1..];
        if size != payload.len() {
            return Err(StoreError::Format(format!(
                "object {id}: length header says {size} but payload is {} bytes",
                payload.len()
            )));
        }

        GitObject::deserialize(kind, payload)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.object_path(id).exists()
    }

    /// all stored ids whose hex form starts with `prefix`.
    ///
    /// the prefix must be 4 to 39 hex characters; a missing shard
    /// directory simply yields no matches.
    pub fn scan_prefix(&self, prefix: &str) -> StoreResult<Vec<ObjectId>> {
        if prefix.len() < 4 || prefix.len() > 39 {
            return Err(StoreError::Format(format!(
                "short hash prefix must be 4 to 39 hex characters, got {}",
                prefix.len()
            )));
        }
        let prefix = prefix.to_ascii_lowercase();
        let shard = self.objects_dir.join(&prefix[..2]);
        let rest = &prefix[2..];

        let entries = match fs::read_dir(&shard) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.len() == 38 && name.starts_with(rest) {
                if let Ok(id) = ObjectId::from_hex(&format!("{}{}", &prefix[..2], name)) {
                    matches.push(id);
                }
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        self.objects_dir.join(&hex[..2]).join(&hex[2..])
    }
}
