// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::iter::FusedIterator;
use std::slice::Iter as SliceIter;

use archery::SharedPointerKind;
use bitmaps::Bitmap;
use imbl_sized_chunks::sized_chunk::Chunk;
use tracing::trace;

use crate::config::{SPARSE_WIDTH, VALUES_PER_LEVEL};
use crate::nodes::dense::DenseNode;
use crate::nodes::hamt::{Entry, Node};
use crate::stats::Instrument;

/// A node with at most [`SPARSE_WIDTH`] children.
///
/// Invariants:
/// - `map.len() == data.len()`
/// - `data[k]` holds the entry for the `k`th set bit of `map`, counting
///   from the least significant bit.
pub(crate) struct SparseNode<A, P: SharedPointerKind> {
    map: Bitmap<VALUES_PER_LEVEL>,
    data: Chunk<Entry<A, P>, SPARSE_WIDTH>,
}

impl<A: Clone, P: SharedPointerKind> Clone for SparseNode<A, P> {
    fn clone(&self) -> Self {
        SparseNode {
            map: self.map,
            data: self.data.clone(),
        }
    }
}

impl<A, P: SharedPointerKind> Default for SparseNode<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, P: SharedPointerKind> SparseNode<A, P> {
    #[inline]
    pub(crate) fn new() -> Self {
        SparseNode {
            map: Bitmap::new(),
            data: Chunk::new(),
        }
    }

    #[inline]
    pub(crate) fn width(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.width() >= SPARSE_WIDTH
    }

    /// Position in `data` of the entry for `index`: the number of
    /// occupied slots below it.
    #[inline]
    fn offset(&self, index: usize) -> usize {
        let below = (1u64 << index) - 1;
        (self.map.into_value() & below).count_ones() as usize
    }

    pub(crate) fn child_at_index(&self, index: usize) -> Option<&Entry<A, P>> {
        if self.map.get(index) {
            Some(&self.data[self.offset(index)])
        } else {
            None
        }
    }

    /// Write `entry` into slot `index`.
    ///
    /// Panics if the slot is empty and the node is already full: new
    /// slots must go through [`SparseNode::copy_for_growth`].
    pub(crate) fn set_child_at_index(&mut self, index: usize, entry: Entry<A, P>) {
        if self.map.get(index) {
            let offset = self.offset(index);
            self.data[offset] = entry;
        } else {
            if self.is_full() {
                panic!(
                    "SparseNode::set_child_at_index: slot {} would exceed a full node of width {}",
                    index, SPARSE_WIDTH
                );
            }
            self.map.set(index, true);
            let offset = self.offset(index);
            self.data.insert(offset, entry);
        }
    }

    pub(crate) fn entries(&self) -> Entries<'_, A, P> {
        Entries {
            map: self.map,
            data: self.data.iter(),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> SparseNode<A, P> {
    /// Copy the node, sharing its children.
    pub(crate) fn copy<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Self {
        instrument.sparse_copied(self.width());
        self.clone()
    }

    /// Copy the node so that it can take one more child.
    ///
    /// A full node comes back as a dense node holding the same slots.
    pub(crate) fn copy_for_growth<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Node<A, P> {
        if !self.is_full() {
            return Node::Sparse(self.copy(instrument));
        }
        instrument.grown();
        trace!(
            target: "cowset::hamt",
            width = self.width(),
            "upgrading sparse node to dense"
        );
        let mut dense = DenseNode::new();
        for index in 0..VALUES_PER_LEVEL {
            if let Some(entry) = self.child_at_index(index) {
                dense.set_child_at_index(index, entry.clone());
            }
        }
        Node::Dense(dense)
    }
}

/// Occupied slots of a sparse node, in index order.
pub(crate) struct Entries<'a, A, P: SharedPointerKind> {
    map: Bitmap<VALUES_PER_LEVEL>,
    data: SliceIter<'a, Entry<A, P>>,
}

impl<'a, A, P: SharedPointerKind> Clone for Entries<'a, A, P> {
    fn clone(&self) -> Self {
        Entries {
            map: self.map,
            data: self.data.clone(),
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Entries<'a, A, P> {
    type Item = (usize, &'a Entry<A, P>);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.map.first_index()?;
        self.map.set(index, false);
        self.data.next().map(|entry| (index, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.map.len();
        (len, Some(len))
    }
}

impl<'a, A, P: SharedPointerKind> FusedIterator for Entries<'a, A, P> {}
