//! An order-statistic red-black tree multimap for Rust.
//!
//! This crate provides [`OSRBTree`], a sorted multimap in which every key owns
//! an insertion-ordered bag of values. Besides the usual O(log n) insert,
//! remove and lookup it answers order-statistic queries over the flattened
//! value sequence:
//!
//! - [`select`](OSRBTree::select) - Get the key owning the value at a given sorted position
//! - [`rank`](OSRBTree::rank) - Get the sorted position of a key's first value
//! - Indexing by [`Rank`] - e.g., `tree[Rank(0)]` for the smallest key
//!
//! # Example
//!
//! ```
//! use osrb_tree::{OSRBTree, Rank};
//!
//! let mut tree = OSRBTree::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(key, key * 100);
//! }
//!
//! assert_eq!(tree.select(0), Ok(&1));
//! assert_eq!(tree.select(6), Ok(&9));
//! assert_eq!(tree.rank(&7), Ok(4));
//!
//! // A second value under 3 widens its range of ranks.
//! tree.insert(3, 301);
//! assert_eq!(tree.len(), 8);
//! assert_eq!(tree.get(&3), Ok(&[300, 301][..]));
//! assert_eq!(tree.rank(&3), Ok(1));
//! assert_eq!(tree[Rank(1)], 3);
//! assert_eq!(tree[Rank(2)], 3);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, no standard library dependency
//! - **Bag semantics** - Duplicate keys share one node; values keep insertion order
//! - **O(log n) rank operations** - Subtree value counts are cached in every node
//! - **Arena storage** - Nodes live in one contiguous arena addressed by compact handles
//!
//! # Implementation
//!
//! The tree is a classic red-black tree. Parent links are arena handles rather
//! than pointers, so the tree owns every node outright and never forms a
//! reference cycle. Rebalancing picks its case from small color tables and
//! applies it through a single rotation primitive that also repairs the cached
//! subtree sizes. Fix-up decisions are reported through the [`log`] facade at
//! `trace` level.
//!
//! [`log`]: https://docs.rs/log

#![no_std]
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod error;
mod order_statistic;
mod raw;

pub mod osrb_tree;

pub use error::{Error, InvariantViolation, Result};
pub use order_statistic::Rank;
pub use osrb_tree::OSRBTree;
