//! gitplumb - Git Object Store Plumbing
//!
//! This crate implements the plumbing layer of a content-addressable
//! version-control store: typed objects (blobs, trees, commits, tags)
//! with their on-disk codecs, a SHA-1 addressed, zlib-compressed object
//! database, and reference resolution including short-hash
//! disambiguation.
//!
//! # Example
//!
//! ```no_run
//! use gitplumb::object::GitObject;
//! use gitplumb::storage::Repository;
//!
//! let repo = Repository::init("./project").unwrap();
//! let id = repo
//!     .objects()
//!     .write(&GitObject::Blob(b"hello\n".to_vec()), true)
//!     .unwrap();
//! assert_eq!(repo.objects().read(&id).unwrap().serialize(), b"hello\n");
//! ```

pub mod object;
pub mod storage;
