//! # btree-record-index
//! An in-memory B-tree index over fixed-schema `Record { id, name, age }`
//! values, with durable JSON snapshotting so the index survives between
//! process runs.
//!
//! ## Features
//! - Canonical dictionary operations: `insert`, `search`, `update`, `remove`.
//! - A human-readable, ordered `dump` of the indexed records.
//! - Whole-tree JSON snapshot, written after every mutating operation and
//!   reloaded transparently on the next `Tree::open`.
//!
//! ## Usage
//! This crate exposes [`Tree`] as its only public entry point; a thin demo
//! binary in `src/bin/btreedb.rs` drives it interactively, the way an
//! external caller (REPL, test harness, or other embedding) would.
pub mod error;
pub mod index;
mod snapshot;

pub use error::{BTreeError, SnapshotError};
pub use index::{Node, Record, Tree};
