//! An ordered set backed by a copy-on-write B-tree.
//!
//! [`BTreeSet`] stores its elements in B-tree nodes whose element buffers
//! are sized for the CPU's L1 data cache. Sets are values: cloning one is
//! O(1) and shares every node, and the first insertion into either copy
//! clones only the nodes on its own path.
//!
//! # Quick Start
//!
//! ```
//! use cow_btree::BTreeSet;
//!
//! let mut set = BTreeSet::new();
//! set.insert("b");
//! set.insert("c");
//! set.insert("a");
//!
//! let before = set.clone();
//! assert_eq!(set.insert("d"), (true, "d"));
//!
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), ["a", "b", "c", "d"]);
//! assert_eq!(before.count(), 3);
//! ```
//!
//! # Cursors
//!
//! A [`Cursor`] is a position in a particular version of a set. It steps in
//! order with [`BTreeSet::advance`] and [`BTreeSet::retreat`] and compares by
//! element. Cursors never keep nodes alive or force copies; instead every
//! node carries a mutation counter, and a cursor whose tree has changed since
//! it was created panics on use rather than reading stale data.
//!
//! # Node sizing
//!
//! The default [`Order`] (the maximum number of children of a node) is
//! derived from the L1 data cache size reported by [`cache`], or from
//! [`Order::FALLBACK_CACHE_SIZE`] when the platform does not report one.
//! Leaf and internal nodes can be given different orders with
//! [`Order::with_internal`].

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(any(feature = "std", test))]
extern crate std;

extern crate alloc;

/// The set, its cursors and iterators.
pub mod btree;
pub mod cache;
mod common;
mod error;
mod order;

pub use btree::{BTreeSet, Cursor, Iter};
pub use error::{Error, Result};
pub use order::Order;
