// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Instrumentation and structural statistics.
//!
//! [`Instrument`] is handed to
//! [`insert_instrumented`][crate::GenericCowSet::insert_instrumented] to
//! observe the copying the trie does on each insert. [`TreeStats`]
//! summarises the shape of a set after the fact, using nothing but the
//! read-only [`view`][crate::view] interface.

use std::fmt::{Display, Error, Formatter};

use archery::SharedPointerKind;

use crate::config::{MAX_DEPTH, VALUES_PER_LEVEL};
use crate::set::GenericCowSet;
use crate::view::{NodeRef, Slot};

/// Hooks called by the trie while it builds a new version.
///
/// Every method has an empty default, and `()` implements the trait
/// doing nothing at all, which is what a plain
/// [`insert`][crate::GenericCowSet::insert] uses.
pub trait Instrument {
    /// A sparse node of the given width was copied.
    fn sparse_copied(&mut self, _width: usize) {}

    /// A dense node of the given width was copied.
    fn dense_copied(&mut self, _width: usize) {}

    /// A full sparse node was upgraded to a dense node.
    fn grown(&mut self) {}

    /// A collision bucket of the given length was written.
    fn bucket_written(&mut self, _len: usize) {}
}

impl Instrument for () {}

/// An [`Instrument`] that counts.
///
/// # Examples
///
/// ```
/// # use cowset::{CopyCounters, CowSet, StringKey};
/// let mut counters = CopyCounters::default();
/// let mut set = CowSet::new();
/// for name in ["bob", "sally", "hank"] {
///     set.insert_instrumented(StringKey::from(name), &mut counters);
/// }
/// assert!(counters.sparse_copies >= 3);
/// assert_eq!(0, counters.growths);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CopyCounters {
    /// Sparse node copies.
    pub sparse_copies: u64,
    /// Dense node copies, indexed by the width of the copied node.
    pub dense_copies: [u64; VALUES_PER_LEVEL + 1],
    /// Sparse to dense upgrades.
    pub growths: u64,
    /// Collision buckets written.
    pub bucket_writes: u64,
}

impl Default for CopyCounters {
    fn default() -> Self {
        CopyCounters {
            sparse_copies: 0,
            dense_copies: [0; VALUES_PER_LEVEL + 1],
            growths: 0,
            bucket_writes: 0,
        }
    }
}

impl CopyCounters {
    /// Total dense node copies of any width.
    #[must_use]
    pub fn total_dense_copies(&self) -> u64 {
        self.dense_copies.iter().sum()
    }
}

impl Instrument for CopyCounters {
    fn sparse_copied(&mut self, _width: usize) {
        self.sparse_copies += 1;
    }

    fn dense_copied(&mut self, width: usize) {
        self.dense_copies[width] += 1;
    }

    fn grown(&mut self) {
        self.growths += 1;
    }

    fn bucket_written(&mut self, _len: usize) {
        self.bucket_writes += 1;
    }
}

/// A census of a set's nodes and keys.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeStats {
    /// Number of nodes.
    pub nodes: u64,
    /// Nodes, indexed by their width.
    pub nodes_by_width: [u64; VALUES_PER_LEVEL + 1],
    /// Nodes, indexed by their depth.
    pub nodes_by_depth: [u64; MAX_DEPTH + 1],
    /// Keys, indexed by the depth of the node holding them.
    pub leaves_by_depth: [u64; MAX_DEPTH + 1],
    /// Keys stored in collision buckets.
    pub colliding_leaves: u64,
}

impl Default for TreeStats {
    fn default() -> Self {
        TreeStats {
            nodes: 0,
            nodes_by_width: [0; VALUES_PER_LEVEL + 1],
            nodes_by_depth: [0; MAX_DEPTH + 1],
            leaves_by_depth: [0; MAX_DEPTH + 1],
            colliding_leaves: 0,
        }
    }
}

impl TreeStats {
    /// Walk a set and count its nodes and keys.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cowset::{CowSet, HashedKey, TreeStats};
    /// let set: CowSet<HashedKey<u32>> = (0..1000).map(HashedKey::new).collect();
    /// let stats = TreeStats::collect(&set);
    /// assert_eq!(1000, stats.leaves());
    /// ```
    #[must_use]
    pub fn collect<A, P: SharedPointerKind>(set: &GenericCowSet<A, P>) -> Self {
        let mut stats = TreeStats::default();
        if let Some(root) = set.root() {
            stats.visit(root, 0);
        }
        stats
    }

    fn visit<A, P: SharedPointerKind>(&mut self, node: NodeRef<'_, A, P>, depth: usize) {
        self.nodes += 1;
        self.nodes_by_depth[depth] += 1;
        self.nodes_by_width[node.width()] += 1;
        for (_, slot) in node.occupied() {
            match slot {
                Slot::Node(child) => self.visit(child, depth + 1),
                Slot::Key(_) => self.leaves_by_depth[depth] += 1,
                Slot::Collision(keys) => {
                    self.leaves_by_depth[depth] += keys.len() as u64;
                    self.colliding_leaves += keys.len() as u64;
                }
                Slot::Empty => {}
            }
        }
    }

    /// Total number of keys found.
    #[must_use]
    pub fn leaves(&self) -> u64 {
        self.leaves_by_depth.iter().sum()
    }

    /// The deepest level holding a node, if there are any nodes.
    #[must_use]
    pub fn depth(&self) -> Option<usize> {
        self.nodes_by_depth.iter().rposition(|&count| count > 0)
    }
}

impl Display for TreeStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        writeln!(f, "Width:  {:?}", &self.nodes_by_width[..])?;
        writeln!(f, "Depth:  {:?}", self.nodes_by_depth)?;
        writeln!(f, "Leaves: {:?}", self.leaves_by_depth)?;
        write!(
            f,
            "Nodes: {} Collisions: {}",
            self.nodes, self.colliding_leaves
        )
    }
}
