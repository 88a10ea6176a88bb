//! storage layer for gitplumb
//!
//! this module is the whole persistence story: a content-addressed
//! object database, ref files, name resolution, and the repository
//! that composes them. Upper layers (the CLI) use this API and never
//! touch the on-disk formats directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Repository                            │
//! │   (open/init/discover, checkout, tags, history walks)       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │   resolve   │       │    odb      │       │    refs     │
//!  │  (names)    │──────▶│  (objects)  │◀──────│ (pointers)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   object    │
//!                        │  (codecs)   │
//!                        └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use gitplumb::object::{GitObject, ObjectKind};
//! use gitplumb::storage::Repository;
//!
//! // Initialize or open
//! let repo = Repository::init("./project")?;
//!
//! // Store a blob and read it back
//! let id = repo.objects().write(&GitObject::Blob(b"hello\n".to_vec()), true)?;
//! let obj = repo.objects().read(&id)?;
//!
//! // Resolve names
//! let head = repo.find_object("HEAD", Some(ObjectKind::Commit))?;
//! ```

mod config;
pub(crate) mod error;
mod odb;
mod refs;
mod repository;
mod resolve;
pub(crate) mod types;

// Re-export public API
pub use config::Config;
pub use error::{StoreError, StoreResult};
pub use odb::ObjectStore;
pub use refs::{RefNode, RefStore, RefTree};
pub use repository::Repository;
pub use types::ObjectId;
