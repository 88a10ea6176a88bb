//! the repository: composition root over the object database, refs,
//! and name resolution, plus the operations built from them
//! (checkout, tag creation, history walks).

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::debug;

use crate::object::{GitObject, Kvlm, ObjectKind, TreeEntry};
use crate::storage::config::Config;
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::odb::ObjectStore;
use crate::storage::refs::{RefStore, RefTree};
use crate::storage::resolve;
use crate::storage::types::ObjectId;

const GITDIR_NAME: &str = ".git";
const DEFAULT_HEAD: &str = "ref: refs/heads/master\n";
const DEFAULT_DESCRIPTION: &str =
    "Unnamed repository; edit this file 'description' to name the repository.\n";

/// a repository rooted at a worktree directory, with its `.git` state
/// directory alongside.
pub struct Repository {
    worktree: PathBuf,
    gitdir: PathBuf,
    config: Config,
    odb: ObjectStore,
    refs: RefStore,
}

impl Repository {
    /// open an existing repository rooted at `path`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        let gitdir = worktree.join(GITDIR_NAME);
        if !gitdir.is_dir() {
            return Err(StoreError::NotARepository(worktree));
        }

        let text = fs::read_to_string(gitdir.join("config")).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                StoreError::Config("configuration file missing".to_string())
            }
            _ => StoreError::Io(e),
        })?;
        let config = Config::parse(&text)?;

        Ok(Self::assemble(worktree, gitdir, config))
    }

    /// create a new repository at `path`.
    ///
    /// the target must not exist yet, or must be an empty directory.
    pub fn init(path: impl AsRef<Path>) -> StoreResult<Self> {
        let worktree = path.as_ref().to_path_buf();
        if worktree.exists() {
            if !worktree.is_dir() {
                return Err(StoreError::PathConflict(worktree));
            }
            if fs::read_dir(&worktree)?.next().is_some() {
                return Err(StoreError::PathConflict(worktree));
            }
        } else {
            fs::create_dir_all(&worktree)?;
        }

        let gitdir = worktree.join(GITDIR_NAME);
        for dir in ["branches", "objects", "refs/tags", "refs/heads"] {
            fs::create_dir_all(gitdir.join(dir))?;
        }
        fs::write(gitdir.join("description"), DEFAULT_DESCRIPTION)?;
        fs::write(gitdir.join("HEAD"), DEFAULT_HEAD)?;

        let config = Config::default();
        fs::write(gitdir.join("config"), config.render())?;

        debug!(path = %worktree.display(), "initialized empty repository");
        Ok(Self::assemble(worktree, gitdir, config))
    }

    /// walk up from `start` until a directory containing `.git`
    /// appears.
    pub fn discover(start: impl AsRef<Path>) -> StoreResult<Self> {
        let start = start
            .as_ref()
            .canonicalize()
            .map_err(|_| StoreError::NotARepository(start.as_ref().to_path_buf()))?;

        let mut dir = start.as_path();
        loop {
            if dir.join(GITDIR_NAME).is_dir() {
                return Self::open(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => return Err(StoreError::NotARepository(start.clone())),
            }
        }
    }

    fn assemble(worktree: PathBuf, gitdir: PathBuf, config: Config) -> Self {
        let odb = ObjectStore::new(&gitdir);
        let refs = RefStore::new(&gitdir);
        Self {
            worktree,
            gitdir,
            config,
            odb,
            refs,
        }
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn gitdir(&self) -> &Path {
        &self.gitdir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// the object database under this repository.
    pub fn objects(&self) -> &ObjectStore {
        &self.odb
    }

    /// the ref store under this repository.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// every id `name` could mean (see the name resolution rules).
    pub fn resolve_name(&self, name: &str) -> StoreResult<Vec<ObjectId>> {
        resolve::resolve_candidates(&self.odb, &self.refs, name)
    }

    /// resolve `name` to exactly one id, peeling at most one step
    /// toward `wanted` when a kind is requested.
    pub fn find_object(&self, name: &str, wanted: Option<ObjectKind>) -> StoreResult<ObjectId> {
        resolve::find(&self.odb, &self.refs, name, wanted)
    }

    /// the full ref namespace, sorted at every level.
    pub fn list_refs(&self) -> StoreResult<RefTree> {
        self.refs.list(None)
    }

    /// materialize the tree of `name` (a commit or a tree) under
    /// `target`, which must be absent or an empty directory.
    pub fn checkout(&self, name: &str, target: impl AsRef<Path>) -> StoreResult<()> {
        let id = self.find_object(name, None)?;
        let mut obj = self.odb.read(&id)?;
        if let GitObject::Commit(kvlm) = &obj {
            let tree_id = resolve::id_field(kvlm, b"tree", &id)?;
            obj = self.odb.read(&tree_id)?;
        }
        let entries = match obj {
            GitObject::Tree(entries) => entries,
            other => {
                return Err(StoreError::NotFound(format!(
                    "{name} is a {}, not a commit or tree",
                    other.kind()
                )))
            }
        };

        let target = target.as_ref().to_path_buf();
        if target.exists() {
            if !target.is_dir() {
                return Err(StoreError::PathConflict(target));
            }
            if fs::read_dir(&target)?.next().is_some() {
                return Err(StoreError::PathConflict(target));
            }
        } else {
            fs::create_dir_all(&target)?;
        }

        // worklist of trees still to materialize
        let mut pending: Vec<(Vec<TreeEntry>, PathBuf)> = vec![(entries, target)];
        while let Some((entries, dir)) = pending.pop() {
            for entry in entries {
                let dest = dir.join(String::from_utf8_lossy(&entry.path).as_ref());
                match self.odb.read(&entry.id)? {
                    GitObject::Tree(sub) => {
                        fs::create_dir(&dest)?;
                        pending.push((sub, dest));
                    }
                    GitObject::Blob(data) => fs::write(&dest, data)?,
                    other => {
                        return Err(StoreError::Format(format!(
                            "tree entry {} points at a {}",
                            String::from_utf8_lossy(&entry.path),
                            other.kind()
                        )))
                    }
                }
            }
        }
        Ok(())
    }

    /// create a tag named `name` pointing at whatever `target`
    /// resolves to.
    ///
    /// a lightweight tag is a bare ref to the target; an annotated tag
    /// stores a tag object first and points the ref at that. Returns
    /// the id the ref ends up holding.
    pub fn create_tag(&self, name: &str, target: &str, annotated: bool) -> StoreResult<ObjectId> {
        let id = self.find_object(target, None)?;

        let ref_target = if annotated {
            let target_kind = self.odb.read(&id)?.kind();

            let mut kvlm = Kvlm::new();
            kvlm.push(b"object", id.to_hex().into_bytes());
            kvlm.push(b"type", target_kind.as_str().as_bytes().to_vec());
            kvlm.push(b"tag", name.as_bytes().to_vec());
            kvlm.push(
                b"tagger",
                format!(
                    "gitplumb <gitplumb@localhost> {} +0000",
                    Utc::now().timestamp()
                )
                .into_bytes(),
            );
            kvlm.set_message(b"tag created by gitplumb\n".to_vec());

            self.odb.write(&GitObject::Tag(kvlm), true)?
        } else {
            id
        };

        self.refs.create(&format!("tags/{name}"), &ref_target)?;
        Ok(ref_target)
    }

    /// ids reachable from `start` through `parent` links, each visited
    /// once even when branches converge.
    pub fn history(&self, start: &ObjectId) -> StoreResult<Vec<ObjectId>> {
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut order = Vec::new();
        let mut pending = vec![*start];

        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            order.push(id);

            let kvlm = match self.odb.read(&id)? {
                GitObject::Commit(kvlm) => kvlm,
                other => {
                    return Err(StoreError::Format(format!(
                        "history reached object {id} which is a {}, not a commit",
                        other.kind()
                    )))
                }
            };
            for value in kvlm.values(b"parent") {
                let hex_str = std::str::from_utf8(value).map_err(|_| {
                    StoreError::Format(format!("object {id}: non-utf8 parent field"))
                })?;
                pending.push(ObjectId::from_hex(hex_str)?);
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_repo() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("work");
        let repo = Repository::init(&root).unwrap();
        (dir, repo)
    }

    fn store_blob(repo: &Repository, data: &[u8]) -> ObjectId {
        repo.objects()
            .write(&GitObject::Blob(data.to_vec()), true)
            .unwrap()
    }

    fn store_tree(repo: &Repository, entries: Vec<TreeEntry>) -> ObjectId {
        repo.objects()
            .write(&GitObject::Tree(entries), true)
            .unwrap()
    }

    fn store_commit(repo: &Repository, tree: &ObjectId, parents: &[ObjectId], msg: &str) -> ObjectId {
        let mut kvlm = Kvlm::new();
        kvlm.push(b"tree", tree.to_hex().into_bytes());
        for parent in parents {
            kvlm.push(b"parent", parent.to_hex().into_bytes());
        }
        kvlm.push(b"author", b"Ada Example <ada@example.com> 1527025023 +0200".to_vec());
        kvlm.push(
            b"committer",
            b"Ada Example <ada@example.com> 1527025023 +0200".to_vec(),
        );
        kvlm.set_message(format!("{msg}\n").into_bytes());
        repo.objects()
            .write(&GitObject::Commit(kvlm), true)
            .unwrap()
    }

    #[test]
    fn test_init_scaffolds_layout() {
        let (_dir, repo) = setup_repo();
        let gitdir = repo.gitdir();

        for dir in ["objects", "refs/heads", "refs/tags", "branches"] {
            assert!(gitdir.join(dir).is_dir(), "missing {dir}");
        }
        assert_eq!(
            fs::read_to_string(gitdir.join("HEAD")).unwrap(),
            "ref: refs/heads/master\n"
        );
        assert!(gitdir.join("description").is_file());

        let config = fs::read_to_string(gitdir.join("config")).unwrap();
        assert!(config.contains("repositoryformatversion = 0"));
    }

    #[test]
    fn test_init_refuses_non_empty_target() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("work");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("occupied.txt"), b"x").unwrap();

        let result = Repository::init(&root);
        assert!(matches!(result, Err(StoreError::PathConflict(_))));
    }

    #[test]
    fn test_init_refuses_file_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a-file");
        fs::write(&target, b"x").unwrap();

        let result = Repository::init(&target);
        assert!(matches!(result, Err(StoreError::PathConflict(_))));
    }

    #[test]
    fn test_open_requires_gitdir() {
        let dir = TempDir::new().unwrap();
        let result = Repository::open(dir.path());
        assert!(matches!(result, Err(StoreError::NotARepository(_))));
    }

    #[test]
    fn test_open_requires_config() {
        let (_dir, repo) = setup_repo();
        let root = repo.worktree().to_path_buf();
        fs::remove_file(repo.gitdir().join("config")).unwrap();

        let result = Repository::open(&root);
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_discover_walks_up() {
        let (_dir, repo) = setup_repo();
        let nested = repo.worktree().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = Repository::discover(&nested).unwrap();
        assert_eq!(
            found.worktree().canonicalize().unwrap(),
            repo.worktree().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_discover_outside_any_repo_fails() {
        let dir = TempDir::new().unwrap();
        let result = Repository::discover(dir.path());
        assert!(matches!(result, Err(StoreError::NotARepository(_))));
    }

    #[test]
    fn test_head_resolves_after_first_commit() {
        let (_dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());
        let commit = store_commit(&repo, &tree, &[], "initial");
        repo.refs().create("heads/master", &commit).unwrap();

        // HEAD was scaffolded to point at refs/heads/master
        assert_eq!(repo.find_object("HEAD", None).unwrap(), commit);
    }

    #[test]
    fn test_checkout_materializes_tree() {
        let (dir, repo) = setup_repo();
        let blob = store_blob(&repo, b"fn main() {}\n");
        let readme = store_blob(&repo, b"# demo\n");

        let subtree = store_tree(
            &repo,
            vec![TreeEntry::new(&b"100644"[..], &b"main.rs"[..], blob)],
        );
        let root_tree = store_tree(
            &repo,
            vec![
                TreeEntry::new(&b"100644"[..], &b"README.md"[..], readme),
                TreeEntry::new(&b"40000"[..], &b"src"[..], subtree),
            ],
        );
        let commit = store_commit(&repo, &root_tree, &[], "initial");

        let target = dir.path().join("out");
        repo.checkout(&commit.to_hex(), &target).unwrap();

        assert_eq!(fs::read(target.join("README.md")).unwrap(), b"# demo\n");
        assert_eq!(
            fs::read(target.join("src/main.rs")).unwrap(),
            b"fn main() {}\n"
        );
    }

    #[test]
    fn test_checkout_accepts_bare_tree() {
        let (dir, repo) = setup_repo();
        let blob = store_blob(&repo, b"data");
        let tree = store_tree(
            &repo,
            vec![TreeEntry::new(&b"100644"[..], &b"file"[..], blob)],
        );

        let target = dir.path().join("out");
        repo.checkout(&tree.to_hex(), &target).unwrap();
        assert_eq!(fs::read(target.join("file")).unwrap(), b"data");
    }

    #[test]
    fn test_checkout_refuses_non_empty_target() {
        let (dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());

        let target = dir.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("existing"), b"x").unwrap();

        let result = repo.checkout(&tree.to_hex(), &target);
        assert!(matches!(result, Err(StoreError::PathConflict(_))));
    }

    #[test]
    fn test_lightweight_tag_points_at_target() {
        let (_dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());
        let commit = store_commit(&repo, &tree, &[], "initial");

        let ref_target = repo.create_tag("v1", &commit.to_hex(), false).unwrap();
        assert_eq!(ref_target, commit);
        assert_eq!(repo.refs().resolve("refs/tags/v1").unwrap(), commit);
    }

    #[test]
    fn test_annotated_tag_stores_tag_object() {
        let (_dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());
        let commit = store_commit(&repo, &tree, &[], "initial");

        let tag_id = repo.create_tag("v1", &commit.to_hex(), true).unwrap();
        assert_ne!(tag_id, commit);
        assert_eq!(repo.refs().resolve("refs/tags/v1").unwrap(), tag_id);

        let obj = repo.objects().read(&tag_id).unwrap();
        let GitObject::Tag(kvlm) = obj else {
            panic!("ref should point at a tag object");
        };
        assert_eq!(kvlm.first(b"object").unwrap(), commit.to_hex().as_bytes());
        assert_eq!(kvlm.first(b"type").unwrap(), b"commit");
        assert_eq!(kvlm.first(b"tag").unwrap(), b"v1");
        assert!(kvlm.first(b"tagger").is_some());
    }

    #[test]
    fn test_history_walks_parents() {
        let (_dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());
        let c1 = store_commit(&repo, &tree, &[], "one");
        let c2 = store_commit(&repo, &tree, &[c1], "two");
        let c3 = store_commit(&repo, &tree, &[c2], "three");

        let order = repo.history(&c3).unwrap();
        assert_eq!(order, vec![c3, c2, c1]);
    }

    #[test]
    fn test_history_visits_shared_ancestors_once() {
        let (_dir, repo) = setup_repo();
        let tree = store_tree(&repo, Vec::new());
        let base = store_commit(&repo, &tree, &[], "base");
        let left = store_commit(&repo, &tree, &[base], "left");
        let right = store_commit(&repo, &tree, &[base], "right");
        let merge = store_commit(&repo, &tree, &[left, right], "merge");

        let order = repo.history(&merge).unwrap();
        assert_eq!(order.len(), 4);
        assert_eq!(order.iter().filter(|id| **id == base).count(), 1);
    }
}
