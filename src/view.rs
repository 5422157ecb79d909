// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A read-only window onto the trie.
//!
//! This is enough to walk a set's whole structure from the outside:
//! [`GenericCowSet::root`][crate::GenericCowSet::root] gives the top
//! [`NodeRef`], and every node hands out its 64 [`Slot`]s. Nothing
//! reachable from here can modify the set.
//!
//! # Examples
//!
//! ```
//! # use cowset::{CowSet, StringKey};
//! # use cowset::view::{NodeRef, Slot};
//! fn count<A>(node: NodeRef<'_, A>) -> usize {
//!     node.slots()
//!         .map(|(_, slot)| match slot {
//!             Slot::Empty => 0,
//!             Slot::Key(_) => 1,
//!             Slot::Collision(keys) => keys.len(),
//!             Slot::Node(child) => count(child),
//!         })
//!         .sum()
//! }
//!
//! let set: CowSet<StringKey> = ["bob", "sally", "hank"].into_iter().map(StringKey::from).collect();
//! assert_eq!(3, count(set.root().unwrap()));
//! ```

use std::fmt::{Debug, Error, Formatter};

use archery::{SharedPointer, SharedPointerKind};

use crate::config::VALUES_PER_LEVEL;
use crate::nodes::hamt::{Entry, Node};
use crate::shared_ptr::DefaultSharedPtr;

/// Which representation a node uses.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A bitmap and a packed array of at most four entries.
    Sparse,
    /// A directly indexed array of 64 slots.
    Dense,
}

/// A borrowed trie node.
pub struct NodeRef<'a, A, P: SharedPointerKind = DefaultSharedPtr> {
    node: &'a SharedPointer<Node<A, P>, P>,
}

impl<'a, A, P: SharedPointerKind> Clone for NodeRef<'a, A, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, A, P: SharedPointerKind> Copy for NodeRef<'a, A, P> {}

/// The contents of one slot of a node.
pub enum Slot<'a, A, P: SharedPointerKind = DefaultSharedPtr> {
    /// Nothing here.
    Empty,
    /// A node one level down.
    Node(NodeRef<'a, A, P>),
    /// A single key.
    Key(&'a A),
    /// Two or more keys with identical hashes, in insertion order.
    /// Only found at [`MAX_DEPTH`][crate::MAX_DEPTH].
    Collision(&'a [A]),
}

impl<'a, A, P: SharedPointerKind> Clone for Slot<'a, A, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, A, P: SharedPointerKind> Copy for Slot<'a, A, P> {}

impl<'a, A, P: SharedPointerKind> Slot<'a, A, P> {
    fn from_entry(entry: Option<&'a Entry<A, P>>) -> Self {
        match entry {
            None => Slot::Empty,
            Some(Entry::Value(value, _)) => Slot::Key(value),
            Some(Entry::Collision(coll)) => Slot::Collision(coll.values()),
            Some(Entry::Node(node)) => Slot::Node(NodeRef::new(node)),
        }
    }

    /// Test whether the slot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

impl<'a, A: 'a, P: SharedPointerKind + 'a> NodeRef<'a, A, P> {
    pub(crate) fn new(node: &'a SharedPointer<Node<A, P>, P>) -> Self {
        NodeRef { node }
    }

    /// The node's representation.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match **self.node {
            Node::Sparse(_) => NodeKind::Sparse,
            Node::Dense(_) => NodeKind::Dense,
        }
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn width(&self) -> usize {
        self.node.width()
    }

    /// The contents of slot `index`.
    ///
    /// Panics if `index` is not below
    /// [`VALUES_PER_LEVEL`][crate::VALUES_PER_LEVEL].
    #[must_use]
    pub fn slot(&self, index: usize) -> Slot<'a, A, P> {
        assert!(
            index < VALUES_PER_LEVEL,
            "NodeRef::slot: index {} out of range",
            index
        );
        Slot::from_entry(self.node.child_at_index(index))
    }

    /// All 64 slots, empty ones included, in index order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Slot<'a, A, P>)> + 'a {
        let this = *self;
        (0..VALUES_PER_LEVEL).map(move |index| (index, this.slot(index)))
    }

    /// The occupied slots, in index order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, Slot<'a, A, P>)> + 'a {
        let node: &'a Node<A, P> = self.node;
        node.entries()
            .map(|(index, entry)| (index, Slot::from_entry(Some(entry))))
    }

    /// Test whether two refs point at the same node in memory.
    ///
    /// Versions of a set share every node an insert didn't have to
    /// copy, so this is how structural sharing shows up from outside.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        SharedPointer::ptr_eq(self.node, other.node)
    }
}

impl<'a, A: Debug, P: SharedPointerKind> Debug for NodeRef<'a, A, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        Debug::fmt(&**self.node, f)
    }
}

impl<'a, A: Debug, P: SharedPointerKind> Debug for Slot<'a, A, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            Slot::Empty => write!(f, "Empty"),
            Slot::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Slot::Key(key) => f.debug_tuple("Key").field(key).finish(),
            Slot::Collision(keys) => f.debug_tuple("Collision").field(keys).finish(),
        }
    }
}
