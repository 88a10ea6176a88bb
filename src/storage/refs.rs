//! reference files: resolution, listing, creation.
//!
//! a ref is a plain text file under the gitdir holding either a 40-hex
//! object id or a `ref: <path>` redirect to another ref file, newline
//! terminated. HEAD is just another ref file. Refs form a pointer
//! graph that is supposed to be acyclic; resolution caps the hop count
//! so a broken graph fails instead of looping.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::storage::error::{StoreError, StoreResult};
use crate::storage::types::ObjectId;

/// symbolic redirect marker at the start of a ref file.
const SYMREF_PREFIX: &str = "ref: ";

/// most hops a symbolic chain may take before we call it a cycle.
const MAX_HOPS: usize = 16;

/// one level of the ref namespace, ordered by name.
pub type RefTree = BTreeMap<String, RefNode>;

/// a resolved leaf or a nested namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefNode {
    Id(ObjectId),
    Dir(RefTree),
}

/// access to the ref files under a gitdir.
pub struct RefStore {
    gitdir: PathBuf,
}

impl RefStore {
    pub(crate) fn new(gitdir: &Path) -> Self {
        Self {
            gitdir: gitdir.to_path_buf(),
        }
    }

    /// follow `name` (e.g. "HEAD" or "refs/heads/master") through any
    /// symbolic hops to a concrete object id.
    pub fn resolve(&self, name: &str) -> StoreResult<ObjectId> {
        let mut current = name.to_string();
        for _ in 0..MAX_HOPS {
            let path = self.gitdir.join(&current);
            let data = fs::read_to_string(&path).map_err(|e| match e.kind() {
                ErrorKind::NotFound => StoreError::NotFound(format!("ref {current}")),
                _ => StoreError::Io(e),
            })?;
            let content = data.strip_suffix('\n').unwrap_or(&data);

            match content.strip_prefix(SYMREF_PREFIX) {
                Some(target) => current = target.to_string(),
                None => return ObjectId::from_hex(content),
            }
        }
        Err(StoreError::RefChainTooDeep(name.to_string()))
    }

    /// walk a ref directory depth-first, names sorted lexicographically
    /// at every level, leaves resolved through any symbolic hops.
    ///
    /// `subdir` is relative to the gitdir and defaults to `refs`.
    pub fn list(&self, subdir: Option<&str>) -> StoreResult<RefTree> {
        let dir = self.gitdir.join(subdir.unwrap_or("refs"));
        self.list_dir(&dir)
    }

    fn list_dir(&self, dir: &Path) -> StoreResult<RefTree> {
        let mut tree = RefTree::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let path = entry.path();

            let node = if path.is_dir() {
                RefNode::Dir(self.list_dir(&path)?)
            } else {
                let rel = path
                    .strip_prefix(&self.gitdir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .into_owned();
                RefNode::Id(self.resolve(&rel)?)
            };
            tree.insert(name, node);
        }
        Ok(tree)
    }

    /// write `refs/<name>` pointing at `id`, creating parent
    /// directories as needed. Overwrites unconditionally.
    pub fn create(&self, name: &str, id: &ObjectId) -> StoreResult<()> {
        let path = self.gitdir.join("refs").join(name);
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Format(format!("invalid ref name: {name}")))?;
        fs::create_dir_all(dir)?;

        // replace by rename so readers never see a half-written ref
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(format!("{id}\n").as_bytes())?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(name, id = %id, "created ref");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_refs() -> (TempDir, RefStore) {
        let dir = TempDir::new().unwrap();
        let gitdir = dir.path().join(".git");
        fs::create_dir_all(gitdir.join("refs")).unwrap();
        let refs = RefStore::new(&gitdir);
        (dir, refs)
    }

    fn some_id() -> ObjectId {
        ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap()
    }

    #[test]
    fn test_create_then_resolve_direct() {
        let (_dir, refs) = setup_refs();
        refs.create("heads/master", &some_id()).unwrap();

        let resolved = refs.resolve("refs/heads/master").unwrap();
        assert_eq!(resolved, some_id());
    }

    #[test]
    fn test_head_follows_symbolic_chain() {
        let (_dir, refs) = setup_refs();
        fs::write(refs.gitdir.join("HEAD"), "ref: refs/heads/master\n").unwrap();
        refs.create("heads/master", &some_id()).unwrap();

        assert_eq!(refs.resolve("HEAD").unwrap(), some_id());
    }

    #[test]
    fn test_missing_ref_is_not_found() {
        let (_dir, refs) = setup_refs();
        let result = refs.resolve("refs/heads/absent");
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_cycle_hits_hop_limit() {
        let (_dir, refs) = setup_refs();
        fs::create_dir_all(refs.gitdir.join("refs/heads")).unwrap();
        fs::write(refs.gitdir.join("refs/heads/a"), "ref: refs/heads/b\n").unwrap();
        fs::write(refs.gitdir.join("refs/heads/b"), "ref: refs/heads/a\n").unwrap();

        let result = refs.resolve("refs/heads/a");
        assert!(matches!(result, Err(StoreError::RefChainTooDeep(_))));
    }

    #[test]
    fn test_malformed_ref_content_fails() {
        let (_dir, refs) = setup_refs();
        fs::create_dir_all(refs.gitdir.join("refs/heads")).unwrap();
        fs::write(refs.gitdir.join("refs/heads/bad"), "not a hash\n").unwrap();

        let result = refs.resolve("refs/heads/bad");
        assert!(matches!(result, Err(StoreError::Format(_))));
    }

    #[test]
    fn test_create_overwrites() {
        let (_dir, refs) = setup_refs();
        let other = ObjectId::from_bytes([9; 20]);

        refs.create("tags/v1", &some_id()).unwrap();
        refs.create("tags/v1", &other).unwrap();

        assert_eq!(refs.resolve("refs/tags/v1").unwrap(), other);
    }

    #[test]
    fn test_list_is_sorted_and_nested() {
        let (_dir, refs) = setup_refs();
        let id_a = ObjectId::from_bytes([1; 20]);
        let id_b = ObjectId::from_bytes([2; 20]);
        let id_t = ObjectId::from_bytes([3; 20]);

        refs.create("heads/zeta", &id_b).unwrap();
        refs.create("heads/alpha", &id_a).unwrap();
        refs.create("tags/v1", &id_t).unwrap();

        let tree = refs.list(None).unwrap();
        let names: Vec<&String> = tree.keys().collect();
        assert_eq!(names, vec!["heads", "tags"]);

        let RefNode::Dir(heads) = &tree["heads"] else {
            panic!("heads should be a directory");
        };
        let head_names: Vec<&String> = heads.keys().collect();
        assert_eq!(head_names, vec!["alpha", "zeta"]);
        assert_eq!(heads["alpha"], RefNode::Id(id_a));
        assert_eq!(heads["zeta"], RefNode::Id(id_b));
    }

    #[test]
    fn test_list_subdir() {
        let (_dir, refs) = setup_refs();
        refs.create("tags/v1", &some_id()).unwrap();
        refs.create("heads/master", &some_id()).unwrap();

        let tags = refs.list(Some("refs/tags")).unwrap();
        assert_eq!(tags.len(), 1);
        assert!(tags.contains_key("v1"));
    }
}
