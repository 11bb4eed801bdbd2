//! # B-Tree Index Navigation
//!
//! Read-only navigation of clustered and spatial B-trees. Index pages
//! (type 2) at level `L > 0` store sorted `(key, child_page)` rows; the child
//! at slot `i` roots the subtree whose keys lie in `[key[i], key[i+1])`. The
//! leaf level consists of data pages (type 1) chained through their header
//! sibling pointers.
//!
//! ## Index row layout
//!
//! ```text
//! +-----------+------------------+--------------+
//! | status u8 | key (key_length) | child PageId |
//! +-----------+------------------+--------------+
//! ```
//!
//! Slot 0 of a page whose `prev_page` is null carries the −∞ key: its key
//! bytes are not compared.
//!
//! ## Descent
//!
//! `find_leaf` binary-searches each index page for the rightmost slot whose
//! key is `≤` the search key and follows its child until a data page is
//! reached. Keys compare sub-key by sub-key in cluster-index order
//! ([`KeyComparator`]); integers compare by their little-endian value, binary
//! kinds byte-lexicographically.
//!
//! A child or sibling pointer that resolves to a page of the wrong type,
//! level, or object yields `CorruptIndex`.

mod key;
mod tree;

pub use key::{KeyComparator, KeyKind, KeyPart};
pub use tree::{IndexPage, IndexTree, LeafChain};
