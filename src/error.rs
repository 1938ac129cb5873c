// =====================================================================
// File: error.rs
// Description:
//   Error taxonomy for the B-tree record index: the user-origin
//   failures (duplicate key, not found, bad degree) and the snapshot
//   I/O failures that can surface from `save`.
// =====================================================================
use thiserror::Error;

/// Failure while reading or writing a snapshot file.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors the `Tree` public contract can signal.
///
/// Structural invariant violations are not represented here — they are
/// bugs, not errors, and must be impossible by construction.
#[derive(Debug, Error)]
pub enum BTreeError {
    #[error("duplicate key: {0}")]
    DuplicateKey(i64),

    #[error("key not found: {0}")]
    NotFound(i64),

    #[error("invalid minimum degree {0}: t must be >= 2")]
    InvalidDegree(usize),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
