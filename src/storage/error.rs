//! storage layer error types.
//!
//! every failure in this crate is deterministic — malformed data,
//! missing files, ambiguous names — so nothing is retried internally.
//! Errors are terminal for the operation that raised them; callers own
//! presentation and exit status.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::ObjectId;

/// the main error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// the path is not inside a repository
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    /// missing config file or unsupported repository format
    #[error("config error: {0}")]
    Config(String),

    /// malformed kvlm, malformed tree entry, or corrupt object header
    #[error("format error: {0}")]
    Format(String),

    /// the stored format tag names none of blob/tree/commit/tag
    #[error("unknown object type: {0}")]
    UnknownObjectType(String),

    /// a name or ref did not resolve to anything
    #[error("not found: {0}")]
    NotFound(String),

    /// a short name matched more than one stored object
    #[error("ambiguous reference {name}: candidates {}", candidate_list(.candidates))]
    AmbiguousReference {
        name: String,
        candidates: Vec<ObjectId>,
    },

    /// checkout/init target exists and is non-empty or not a directory
    #[error("path conflict: {}", .0.display())]
    PathConflict(PathBuf),

    /// a symbolic ref chain exceeded the hop limit (probable cycle)
    #[error("reference chain too deep starting at {0}")]
    RefChainTooDeep(String),

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_) | StoreError::NotARepository(_)
        )
    }

    /// check if this error indicates corrupt or malformed data
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            StoreError::Format(_) | StoreError::UnknownObjectType(_)
        )
    }
}

fn candidate_list(candidates: &[ObjectId]) -> String {
    candidates
        .iter()
        .map(|id| id.to_hex())
        .collect::<Vec<_>>()
        .join(" ")
}

/// result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
