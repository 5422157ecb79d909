// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! # Copy-on-write hash sets
//!
//! This crate offers a single data structure: [`CowSet`], an immutable
//! set of keys stored in a [hash array mapped trie][hamt].
//!
//! ## Persistence
//!
//! Each insert produces a new version of the set. Nodes of the trie are
//! never modified once built: the insert copies the handful of nodes on
//! the path from the root to the new key's slot, and every other node
//! is shared between the old version and the new one. That makes
//! [`clone`][Clone::clone] O(1), and a clone is a snapshot that no later
//! insert, through either copy, can change.
//!
//! ```
//! # use cowset::{CowSet, StringKey};
//! let mut set = CowSet::new();
//! set.insert(StringKey::from("bob"));
//! let snapshot = set.clone();
//! set.insert(StringKey::from("sally"));
//! assert!(set.contains(&StringKey::from("sally")));
//! assert!(!snapshot.contains(&StringKey::from("sally")));
//! ```
//!
//! Nodes are reference counted through [`archery`]'s
//! [`SharedPointer`][shared_ptr::SharedPointer], so snapshots can be
//! handed to other threads when the default [`ArcK`][shared_ptr::ArcK]
//! pointer kind is used.
//!
//! ## Structure
//!
//! A key's 64-bit hash is consumed six bits at a time, shallowest level
//! first, each chunk picking one of 64 slots. Nodes with four or fewer
//! occupied slots store them in a packed array under a bitmap, and grow
//! into a plain 64 slot array when a fifth slot is needed. Keys whose
//! hashes are identical all the way down to [`MAX_DEPTH`] share a
//! collision bucket.
//!
//! The [`view`] module exposes all of this read-only, and [`stats`]
//! builds on it to summarise the shape of a set.
//!
//! ## Keys
//!
//! Elements implement [`HamtKey`], which asks for a stable hash and an
//! equality test. [`StringKey`] and [`HashedKey`] cover the common
//! cases, and [`AnyKey`] lets keys of different types live in one set.
//!
//! ```
//! # use std::sync::Arc;
//! # use cowset::{AnyKey, CowSet, HashedKey, StringKey};
//! let mut set: CowSet<AnyKey> = CowSet::new();
//! set.insert(Arc::new(StringKey::from("7")));
//! set.insert(Arc::new(HashedKey::<u32>::new(7)));
//! assert_eq!(2, set.len());
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! | ------- | ----------- |
//! | [`proptest`](https://crates.io/crates/proptest) | Strategies for all these data structures, for the proptest crate |
//! | [`arbitrary`](https://crates.io/crates/arbitrary/) | [`arbitrary::Arbitrary`](https://docs.rs/arbitrary/latest/arbitrary/trait.Arbitrary.html) implementation for [`GenericCowSet`] |
//! | [`triomphe`](https://crates.io/crates/triomphe/) | Use [`triomphe::Arc`](https://docs.rs/triomphe/latest/triomphe/struct.Arc.html) as the default reference counted pointer |
//! | `debug` | Check the trie's structural invariants after every insert |
//!
//! [hamt]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie

#![forbid(rust_2018_idioms)]
#![deny(unsafe_code, nonstandard_style)]
#![warn(unreachable_pub, missing_docs)]

#[macro_use]
mod util;

mod config;
mod nodes;

pub mod key;
pub mod set;
pub mod shared_ptr;
pub mod stats;
pub mod view;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest;

#[cfg(feature = "arbitrary")]
mod arbitrary;


pub use crate::config::{MAX_DEPTH, VALUES_PER_LEVEL};
pub use crate::key::{AnyKey, DynKey, HamtKey, HashedKey, StringKey};
pub use crate::set::{CowSet, GenericCowSet};
pub use crate::stats::{CopyCounters, Instrument, TreeStats};
