// =====================================================================
// File: index/record.rs
// Description:
//   Defines the `Record` carried at each slot of the B-tree: an
//   ordering key (`id`) plus opaque payload (`name`, `age`). Ordering
//   and equality are defined on `id` alone.
// =====================================================================
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single indexed record. `id` is the unique ordering key; `name` and
/// `age` are payload the tree never inspects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub age: u32,
}

impl Record {
    pub fn new(id: i64, name: impl Into<String>, age: u32) -> Self {
        Self {
            id,
            name: name.into(),
            age,
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Record {}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}
