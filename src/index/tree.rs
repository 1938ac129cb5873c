// =====================================================================
// File: index/tree.rs
// Description:
//   Implements the B-tree index (`Tree`) that manages insertion,
//   search, update, and deletion over `Node`/`Record`. Owns the root,
//   the minimum degree `t`, and — when opened against a path — the
//   snapshot file the tree reloads from and re-saves to after every
//   mutation.
// =====================================================================
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::BTreeError;
use crate::snapshot;

use super::node::Node;
use super::record::Record;

/// B-tree index over `Record`s, keyed by `id`. Holds the minimum degree
/// `t` and the root node; when constructed with `open`, also persists
/// to a snapshot file after every mutating operation.
#[derive(Debug)]
pub struct Tree {
    t: usize,
    root: Node,
    path: Option<PathBuf>,
}

impl Tree {
    /// Creates a new empty in-memory B-tree. `t` must be `>= 2`.
    pub fn new(t: usize) -> Result<Self, BTreeError> {
        if t < 2 {
            return Err(BTreeError::InvalidDegree(t));
        }
        Ok(Self {
            t,
            root: Node::new_leaf(),
            path: None,
        })
    }

    /// Opens a tree backed by a snapshot file. An absent file starts a
    /// fresh empty tree (not an error); malformed JSON does the same,
    /// after logging a warning. Every subsequent mutating call re-saves
    /// to `path`.
    pub fn open(path: impl AsRef<Path>, t: usize) -> Result<Self, BTreeError> {
        if t < 2 {
            return Err(BTreeError::InvalidDegree(t));
        }
        let path = path.as_ref().to_path_buf();
        let root = match snapshot::load(&path) {
            Ok(root) => {
                info!("loaded snapshot from {}", path.display());
                root
            }
            Err(snapshot::LoadOutcome::Missing) => {
                debug!("no snapshot at {}, starting fresh", path.display());
                Node::new_leaf()
            }
            Err(snapshot::LoadOutcome::Corrupt(e)) => {
                warn!("snapshot at {} is corrupt ({e}); starting fresh", path.display());
                Node::new_leaf()
            }
        };
        Ok(Self {
            t,
            root,
            path: Some(path),
        })
    }

    pub fn t(&self) -> usize {
        self.t
    }

    fn save_if_backed(&self) -> Result<(), BTreeError> {
        if let Some(path) = &self.path {
            snapshot::save(path, &self.root)?;
        }
        Ok(())
    }

    /// Returns the record for `id`, or `None` if absent.
    pub fn search(&self, id: i64) -> Option<&Record> {
        self.root.find(id)
    }

    /// Inserts `rec`. Rejects (no-op) if `rec.id` is already present.
    pub fn insert(&mut self, rec: Record) -> Result<(), BTreeError> {
        if self.root.find(rec.id).is_some() {
            return Err(BTreeError::DuplicateKey(rec.id));
        }

        let t = self.t;
        if self.root.slots.len() == 2 * t - 1 {
            let mut new_root = Node::new_internal();
            let old_root = std::mem::replace(&mut self.root, Node::new_leaf());
            new_root.children.push(Box::new(old_root));
            new_root.split_full_child(t, 0);
            debug!("root split: tree grows to a new level");
            new_root.insert_non_full(t, rec);
            self.root = new_root;
        } else {
            self.root.insert_non_full(t, rec);
        }

        self.save_if_backed()
    }

    /// Replaces the payload fields of the record at `id`, leaving tree
    /// shape untouched. Errors if `id` is absent.
    pub fn update(&mut self, id: i64, name: impl Into<String>, age: u32) -> Result<(), BTreeError> {
        match self.root.find_mut(id) {
            Some(rec) => {
                rec.name = name.into();
                rec.age = age;
            }
            None => return Err(BTreeError::NotFound(id)),
        }
        self.save_if_backed()
    }

    /// Removes the record with `id`. Returns whether a record was
    /// removed; snapshot is written only when it was.
    pub fn remove(&mut self, id: i64) -> Result<bool, BTreeError> {
        let removed = self.root.remove(self.t, id);

        if !self.root.leaf && self.root.slots.is_empty() {
            let only_child = self.root.children.remove(0);
            self.root = *only_child;
            debug!("root collapse: tree shrinks by one level");
        }

        if removed {
            self.save_if_backed()?;
        }
        Ok(removed)
    }

    /// Emits all records via the node-first traversal order: a node's
    /// own slots, then each child's subtree in turn. Not strictly
    /// sorted; callers that need strict order should use `dump_sorted`.
    pub fn dump(&self) -> Vec<&Record> {
        let mut out = Vec::new();
        self.root.collect_node_first(&mut out);
        out
    }

    /// Emits all records in strict in-order (ascending `id`) order.
    pub fn dump_sorted(&self) -> Vec<&Record> {
        let mut out = Vec::new();
        self.root.collect_in_order(&mut out);
        out
    }

    /// Explicitly (re-)writes the snapshot file, regardless of whether
    /// the last call mutated the tree.
    pub fn save(&self) -> Result<(), BTreeError> {
        self.save_if_backed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64) -> Record {
        Record::new(id, format!("n{id}"), id as u32)
    }

    #[test]
    fn insert_then_search_round_trips() {
        let mut tree = Tree::new(2).unwrap();
        tree.insert(rec(10)).unwrap();
        assert_eq!(tree.search(10).unwrap().id, 10);
        assert!(tree.search(99).is_none());
    }

    #[test]
    fn duplicate_insert_is_rejected_and_tree_unchanged() {
        let mut tree = Tree::new(2).unwrap();
        tree.insert(Record::new(1, "a", 10)).unwrap();
        let err = tree.insert(Record::new(1, "x", 99)).unwrap_err();
        assert!(matches!(err, BTreeError::DuplicateKey(1)));
        assert_eq!(tree.search(1).unwrap().name, "a");
    }

    #[test]
    fn update_missing_key_errors_without_mutation() {
        let mut tree = Tree::new(2).unwrap();
        tree.insert(rec(1)).unwrap();
        let err = tree.update(2, "x", 1).unwrap_err();
        assert!(matches!(err, BTreeError::NotFound(2)));
    }

    #[test]
    fn update_preserves_shape_and_changes_payload_only() {
        let mut tree = Tree::new(2).unwrap();
        for id in [10, 20, 30, 40] {
            tree.insert(rec(id)).unwrap();
        }
        let before = tree.dump_sorted().iter().map(|r| r.id).collect::<Vec<_>>();
        tree.update(20, "renamed", 77).unwrap();
        let after = tree.dump_sorted().iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(before, after);
        assert_eq!(tree.search(20).unwrap().name, "renamed");
        assert_eq!(tree.search(20).unwrap().age, 77);
    }

    #[test]
    fn remove_missing_key_is_a_no_op() {
        let mut tree = Tree::new(2).unwrap();
        tree.insert(rec(1)).unwrap();
        assert_eq!(tree.remove(2).unwrap(), false);
        assert_eq!(tree.search(1).unwrap().id, 1);
    }

    #[test]
    fn insert_then_remove_round_trips_to_empty() {
        let mut tree = Tree::new(2).unwrap();
        tree.insert(rec(5)).unwrap();
        assert_eq!(tree.remove(5).unwrap(), true);
        assert!(tree.search(5).is_none());
    }

    // Root split after the fourth insert.
    #[test]
    fn scenario_root_split() {
        let mut tree = Tree::new(2).unwrap();
        for id in [10, 20, 30, 40] {
            tree.insert(rec(id)).unwrap();
        }
        assert_eq!(tree.root.slots.len(), 1);
        assert_eq!(tree.root.slots[0].id, 20);
        assert_eq!(
            tree.root.children[0].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![10]
        );
        assert_eq!(
            tree.root.children[1].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![30, 40]
        );
    }

    // Height grows again; leaves stay at a uniform depth.
    #[test]
    fn scenario_height_grows_again() {
        let mut tree = Tree::new(2).unwrap();
        for id in [10, 20, 30, 40, 50, 60, 70, 80] {
            tree.insert(rec(id)).unwrap();
        }
        assert_eq!(
            tree.root.slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![20, 40, 60]
        );
        let child_ids: Vec<Vec<i64>> = tree
            .root
            .children
            .iter()
            .map(|c| c.slots.iter().map(|r| r.id).collect())
            .collect();
        assert_eq!(child_ids, vec![vec![10], vec![30], vec![50], vec![70, 80]]);

        tree.insert(rec(90)).unwrap();
        tree.insert(rec(100)).unwrap();
        // height grew: root is no longer a single level of t=2 leaves
        assert!(!tree.root.leaf);
        assert!(tree.root.children.iter().any(|c| !c.leaf));
    }

    // Delete from a leaf with a borrow-from-right rebalance.
    #[test]
    fn scenario_delete_with_borrow() {
        let mut tree = Tree::new(2).unwrap();
        for id in [20, 10, 30, 40] {
            tree.insert(rec(id)).unwrap();
        }
        // root [20], children [10], [30,40]
        tree.remove(10).unwrap();
        assert_eq!(tree.root.slots[0].id, 30);
        assert_eq!(tree.root.children[0].slots[0].id, 20);
        assert_eq!(tree.root.children[1].slots[0].id, 40);
    }

    // Delete from a leaf with a sibling merge, collapsing the root.
    // Built directly: root [20], children [10], [30] isn't reachable
    // from only three inserts (no split has happened yet at that point).
    #[test]
    fn scenario_delete_with_merge_collapses_root() {
        let mut tree = Tree::new(2).unwrap();
        let mut root = Node::new_internal();
        root.slots.push(rec(20));
        let mut c0 = Node::new_leaf();
        c0.slots.push(rec(10));
        let mut c1 = Node::new_leaf();
        c1.slots.push(rec(30));
        root.children = vec![Box::new(c0), Box::new(c1)];
        tree.root = root;

        tree.remove(10).unwrap();
        assert!(tree.root.leaf);
        assert_eq!(
            tree.root.slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![20, 30]
        );
    }

    // Delete an internal record whose surrounding children are both
    // minimal, forcing a merge and then a recursive delete into it.
    // Built directly since this exact shape (three one-slot leaves
    // under a two-slot root) isn't the natural result of inserting
    // these ids from empty in any order.
    #[test]
    fn scenario_delete_internal_merge_recursion() {
        let mut tree = Tree::new(2).unwrap();
        let mut root = Node::new_internal();
        root.slots.push(rec(20));
        root.slots.push(rec(40));
        let mut c0 = Node::new_leaf();
        c0.slots.push(rec(10));
        let mut c1 = Node::new_leaf();
        c1.slots.push(rec(30));
        let mut c2 = Node::new_leaf();
        c2.slots.push(rec(50));
        root.children = vec![Box::new(c0), Box::new(c1), Box::new(c2)];
        tree.root = root;

        tree.remove(20).unwrap();

        assert!(!tree.root.leaf);
        assert_eq!(tree.root.slots.iter().map(|r| r.id).collect::<Vec<_>>(), vec![40]);
        assert_eq!(
            tree.root.children[0].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![10, 30]
        );
        assert_eq!(
            tree.root.children[1].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![50]
        );
        assert!(tree.search(20).is_none());
    }

    // Deleting from a middle child whose neighbors are both minimal
    // merges with the left sibling, not the right: the left child [5]
    // absorbs the separator and [15] to become [5,10,15], not the right
    // child absorbing the separator and [15].
    #[test]
    fn fill_prefers_left_merge_over_right_when_both_are_minimal() {
        let mut tree = Tree::new(2).unwrap();
        let mut root = Node::new_internal();
        root.slots.push(rec(10));
        root.slots.push(rec(20));
        let mut c0 = Node::new_leaf();
        c0.slots.push(rec(5));
        let mut c1 = Node::new_leaf();
        c1.slots.push(rec(15));
        let mut c2 = Node::new_leaf();
        c2.slots.push(rec(25));
        root.children = vec![Box::new(c0), Box::new(c1), Box::new(c2)];
        tree.root = root;

        tree.remove(15).unwrap();

        assert!(!tree.root.leaf);
        assert_eq!(tree.root.slots.iter().map(|r| r.id).collect::<Vec<_>>(), vec![20]);
        assert_eq!(
            tree.root.children[0].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![5, 10]
        );
        assert_eq!(
            tree.root.children[1].slots.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![25]
        );
        assert!(tree.search(15).is_none());
    }

    // Duplicate rejection plus a save/load round trip.
    #[test]
    fn scenario_duplicate_and_round_trip() {
        let dir = scratch_dir();
        let path = dir.join("snap.json");

        {
            let mut tree = Tree::open(&path, 2).unwrap();
            tree.insert(Record::new(1, "a", 10)).unwrap();
            tree.insert(Record::new(2, "b", 20)).unwrap();
            tree.insert(Record::new(3, "c", 30)).unwrap();

            let err = tree.insert(Record::new(2, "x", 99)).unwrap_err();
            assert!(matches!(err, BTreeError::DuplicateKey(2)));
            assert_eq!(tree.search(2).unwrap().name, "b");
        }

        let reloaded = Tree::open(&path, 2).unwrap();
        assert_eq!(reloaded.dump_sorted().len(), 3);
        let r = reloaded.search(2).unwrap();
        assert_eq!(r.name, "b");
        assert_eq!(r.age, 20);
    }

    fn scratch_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("btree_record_index_test_{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        dir
    }
}
