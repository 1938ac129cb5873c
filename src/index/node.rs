// =====================================================================
// File: index/node.rs
// Description:
//   Defines the B-tree node (`Node`): an ordered slot list, child
//   links, and a leaf flag. Implements the per-node algorithms that
//   the tree's insert/remove paths recurse into — `find`,
//   `insert_non_full`, `split_full_child`, and the full deletion
//   rebalance kernel (predecessor/successor replacement, borrow,
//   merge). `Node` derives `Serialize`/`Deserialize` directly so the
//   whole subtree can be written out as the snapshot codec's node
//   object (`leaf`, `slots`, `children`).
// =====================================================================
use log::trace;
use serde::{Deserialize, Serialize};

use super::record::Record;

/// A B-tree node. `slots` holds between `0` and `2t-1` records in
/// sorted order; `children` is empty for a leaf, else exactly
/// `slots.len() + 1` entries.
#[derive(Debug, Serialize, Deserialize)]
pub struct Node {
    pub leaf: bool,
    pub slots: Vec<Record>,
    pub children: Vec<Box<Node>>,
}

impl Node {
    pub fn new_leaf() -> Self {
        Self {
            leaf: true,
            slots: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn new_internal() -> Self {
        Self {
            leaf: false,
            slots: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Index of the first slot with `id >= key`, i.e. where `key` would
    /// sit if inserted.
    fn lower_bound(&self, id: i64) -> usize {
        self.slots
            .binary_search_by_key(&id, |r| r.id)
            .unwrap_or_else(|pos| pos)
    }

    /// Descends the subtree rooted at `self`, returning the located
    /// record or `None`. Never mutates.
    pub fn find(&self, id: i64) -> Option<&Record> {
        let idx = self.lower_bound(id);
        if idx < self.slots.len() && self.slots[idx].id == id {
            return Some(&self.slots[idx]);
        }
        if self.leaf {
            None
        } else {
            self.children[idx].find(id)
        }
    }

    /// Mutable counterpart of `find`, used by `update`.
    pub fn find_mut(&mut self, id: i64) -> Option<&mut Record> {
        let idx = self.lower_bound(id);
        if idx < self.slots.len() && self.slots[idx].id == id {
            return Some(&mut self.slots[idx]);
        }
        if self.leaf {
            None
        } else {
            self.children[idx].find_mut(id)
        }
    }

    /// Precondition: `self.slots.len() < 2t - 1`. Inserts `rec` into
    /// this subtree preserving ordering, occupancy, and shape. Assumes
    /// the caller has already established `rec.id` is unique.
    pub fn insert_non_full(&mut self, t: usize, rec: Record) {
        let idx = self.lower_bound(rec.id);

        if self.leaf {
            self.slots.insert(idx, rec);
            return;
        }

        let mut idx = idx;
        if self.children[idx].slots.len() == 2 * t - 1 {
            self.split_full_child(t, idx);
            if rec.id > self.slots[idx].id {
                idx += 1;
            }
        }
        self.children[idx].insert_non_full(t, rec);
    }

    /// Precondition: `self` is internal, `children[i]` has exactly
    /// `2t-1` slots, and `self.slots.len() < 2t-1`. Splits the full
    /// child in two, promoting its median record into `self`.
    pub fn split_full_child(&mut self, t: usize, i: usize) {
        let mut z = Box::new(Node {
            leaf: self.children[i].leaf,
            slots: Vec::new(),
            children: Vec::new(),
        });

        let y = &mut self.children[i];
        z.slots = y.slots.split_off(t);
        let median = y.slots.pop().expect("full child has a median slot");

        if !y.leaf {
            z.children = y.children.split_off(t);
        }

        trace!("split_full_child: promoting id={} at index {}", median.id, i);
        self.slots.insert(i, median);
        self.children.insert(i + 1, z);
    }

    /// Deletes `id` from this subtree if present. The caller guarantees
    /// `self` is either the root or already holds at least `t` slots;
    /// this function preserves that invariant for every child it
    /// descends into. Returns whether a record was removed.
    pub fn remove(&mut self, t: usize, id: i64) -> bool {
        let idx = self.lower_bound(id);

        if idx < self.slots.len() && self.slots[idx].id == id {
            if self.leaf {
                self.slots.remove(idx);
            } else {
                self.remove_internal_slot(t, idx);
            }
            return true;
        }

        if self.leaf {
            return false;
        }

        let next = self.fill(t, idx);
        self.children[next].remove(t, id)
    }

    /// Case A2: `self.slots[i]` holds `id` and `self` is internal.
    fn remove_internal_slot(&mut self, t: usize, i: usize) {
        if self.children[i].slots.len() >= t {
            let pred = Self::max_record(&mut self.children[i]).clone();
            let pred_id = pred.id;
            self.slots[i] = pred;
            self.children[i].remove(t, pred_id);
        } else if self.children[i + 1].slots.len() >= t {
            let succ = Self::min_record(&mut self.children[i + 1]).clone();
            let succ_id = succ.id;
            self.slots[i] = succ;
            self.children[i + 1].remove(t, succ_id);
        } else {
            let id = self.slots[i].id;
            self.merge_children(i);
            self.children[i].remove(t, id);
        }
    }

    /// Rightmost record in the subtree (predecessor of a deleted
    /// internal slot); descends to the rightmost leaf.
    fn max_record(node: &mut Node) -> &Record {
        let mut cur = node;
        while !cur.leaf {
            let last = cur.children.len() - 1;
            cur = &mut cur.children[last];
        }
        cur.slots.last().expect("non-empty leaf")
    }

    /// Leftmost record in the subtree (successor of a deleted internal
    /// slot); descends to the leftmost leaf.
    fn min_record(node: &mut Node) -> &Record {
        let mut cur = node;
        while !cur.leaf {
            cur = &mut cur.children[0];
        }
        cur.slots.first().expect("non-empty leaf")
    }

    /// Ensures `children[i]` holds at least `t` slots before the caller
    /// descends into it, via borrow-left, borrow-right, or merge; merge
    /// prefers the left sibling whenever one exists. Returns the index
    /// the caller should actually descend into, which shifts to `i - 1`
    /// when a left merge folds `children[i]` into its left sibling.
    fn fill(&mut self, t: usize, i: usize) -> usize {
        if self.children[i].slots.len() >= t {
            return i;
        }

        if i > 0 && self.children[i - 1].slots.len() >= t {
            self.borrow_from_left(i);
            i
        } else if i + 1 < self.children.len() && self.children[i + 1].slots.len() >= t {
            self.borrow_from_right(i);
            i
        } else if i > 0 {
            self.merge_children(i - 1);
            i - 1
        } else {
            self.merge_children(i);
            i
        }
    }

    /// Rotates the left sibling's last record through the parent into
    /// the front of `children[i]`.
    fn borrow_from_left(&mut self, i: usize) {
        let separator = self.slots[i - 1].clone();

        let (left_slice, right_slice) = self.children.split_at_mut(i);
        let left = &mut left_slice[i - 1];
        let child = &mut right_slice[0];

        child.slots.insert(0, separator);
        let left_last = left.slots.pop().expect("left sibling has >= t slots");
        self.slots[i - 1] = left_last;

        if !left.leaf {
            let moved = left.children.pop().expect("left sibling has a child to move");
            child.children.insert(0, moved);
        }
    }

    /// Rotates the right sibling's first record through the parent into
    /// the back of `children[i]`.
    fn borrow_from_right(&mut self, i: usize) {
        let separator = self.slots[i].clone();

        let (left_slice, right_slice) = self.children.split_at_mut(i + 1);
        let child = &mut left_slice[i];
        let right = &mut right_slice[0];

        child.slots.push(separator);
        let right_first = right.slots.remove(0);
        self.slots[i] = right_first;

        if !right.leaf {
            let moved = right.children.remove(0);
            child.children.push(moved);
        }
    }

    /// Merges `children[i]`, the separating slot `slots[i]`, and
    /// `children[i+1]` into a single node of `2t-1` slots stored back
    /// at `children[i]`.
    fn merge_children(&mut self, i: usize) {
        trace!("merge_children: folding child {} and {} together", i, i + 1);
        let mut right = self.children.remove(i + 1);
        let separator = self.slots.remove(i);

        let left = &mut self.children[i];
        left.slots.push(separator);
        left.slots.append(&mut right.slots);
        if !left.leaf {
            left.children.append(&mut right.children);
        }
    }

    /// Strict in-order traversal: a child's subtree, then the slot that
    /// separates it from the next, alternating to the final child.
    pub fn collect_in_order<'a>(&'a self, out: &mut Vec<&'a Record>) {
        if self.leaf {
            out.extend(self.slots.iter());
            return;
        }
        for i in 0..self.slots.len() {
            self.children[i].collect_in_order(out);
            out.push(&self.slots[i]);
        }
        self.children[self.slots.len()].collect_in_order(out);
    }

    /// Non-strict traversal order kept for driver compatibility: a
    /// node's own slots first, then each child's subtree in turn.
    pub fn collect_node_first<'a>(&'a self, out: &mut Vec<&'a Record>) {
        out.extend(self.slots.iter());
        for child in &self.children {
            child.collect_node_first(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_leaf_is_empty() {
        let n = Node::new_leaf();
        assert!(n.leaf);
        assert!(n.slots.is_empty());
        assert!(n.children.is_empty());
    }

    #[test]
    fn lower_bound_matches_sorted_position() {
        let mut n = Node::new_leaf();
        n.slots.push(Record::new(10, "a", 1));
        n.slots.push(Record::new(30, "b", 2));
        assert_eq!(n.lower_bound(5), 0);
        assert_eq!(n.lower_bound(10), 0);
        assert_eq!(n.lower_bound(20), 1);
        assert_eq!(n.lower_bound(40), 2);
    }

    #[test]
    fn insert_non_full_keeps_leaf_sorted() {
        let mut n = Node::new_leaf();
        n.insert_non_full(2, Record::new(30, "c", 1));
        n.insert_non_full(2, Record::new(10, "a", 1));
        n.insert_non_full(2, Record::new(20, "b", 1));
        let ids: Vec<i64> = n.slots.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }

    #[test]
    fn split_full_child_promotes_median() {
        let mut parent = Node::new_internal();
        let mut full = Node::new_leaf();
        for id in [10, 20, 30] {
            full.slots.push(Record::new(id, "x", 1));
        }
        parent.children.push(Box::new(full));
        parent.split_full_child(2, 0);

        assert_eq!(parent.slots.len(), 1);
        assert_eq!(parent.slots[0].id, 20);
        assert_eq!(parent.children[0].slots[0].id, 10);
        assert_eq!(parent.children[1].slots[0].id, 30);
    }
}
