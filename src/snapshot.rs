// =====================================================================
// File: snapshot.rs
// Description:
//   The deterministic JSON snapshot codec (C5): serializes/deserializes
//   a whole tree to/from a byte stream. `load` never errors — an
//   absent or corrupt file both resolve to a fresh empty tree, per the
//   contract below; `save` surfaces I/O failures to the caller
//   and writes through a temp file + rename to avoid torn writes.
// =====================================================================
use std::fs;
use std::path::Path;

use crate::error::SnapshotError;
use crate::index::node::Node;

/// Why `load` fell back to a fresh tree. Neither variant is an error —
/// both are handled by the caller constructing an empty `Node`.
pub enum LoadOutcome {
    Missing,
    Corrupt(serde_json::Error),
}

/// Reads and parses the snapshot at `path`. Returns `Ok(root)` on a
/// valid document, or an `Err(LoadOutcome)` the caller treats as "start
/// fresh" (`snapshot-missing` / `snapshot-corrupt` are not errors).
pub fn load(path: &Path) -> Result<Node, LoadOutcome> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Err(LoadOutcome::Missing),
    };
    serde_json::from_slice(&bytes).map_err(LoadOutcome::Corrupt)
}

/// Rewrites the snapshot file in whole. Writes to `<path>.tmp` and
/// renames over `path` so a crash mid-write cannot leave a torn file —
/// an atomicity guarantee the core contract permits but does not require.
pub fn save(path: &Path, root: &Node) -> Result<(), SnapshotError> {
    let bytes = serde_json::to_vec_pretty(root)?;
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, &bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::path::PathBuf::from(tmp)
}
