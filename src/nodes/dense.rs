// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::iter::FusedIterator;

use archery::SharedPointerKind;
use imbl_sized_chunks::sparse_chunk::SparseChunk;

use crate::config::VALUES_PER_LEVEL;
use crate::nodes::hamt::{Entry, Node};
use crate::stats::Instrument;

/// A node with one slot per chunk value.
///
/// Dense nodes are only ever made by growing a full
/// [`SparseNode`][crate::nodes::sparse::SparseNode], and never change
/// representation again.
pub(crate) struct DenseNode<A, P: SharedPointerKind> {
    data: SparseChunk<Entry<A, P>, VALUES_PER_LEVEL>,
}

impl<A: Clone, P: SharedPointerKind> Clone for DenseNode<A, P> {
    fn clone(&self) -> Self {
        DenseNode {
            data: self.data.clone(),
        }
    }
}

impl<A, P: SharedPointerKind> DenseNode<A, P> {
    #[inline]
    pub(crate) fn new() -> Self {
        DenseNode {
            data: SparseChunk::new(),
        }
    }

    #[inline]
    pub(crate) fn width(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn child_at_index(&self, index: usize) -> Option<&Entry<A, P>> {
        self.data.get(index)
    }

    #[inline]
    pub(crate) fn set_child_at_index(&mut self, index: usize, entry: Entry<A, P>) {
        self.data.insert(index, entry);
    }

    pub(crate) fn entries(&self) -> Entries<'_, A, P> {
        Entries {
            node: self,
            index: 0,
            remaining: self.width(),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> DenseNode<A, P> {
    pub(crate) fn copy<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Self {
        instrument.dense_copied(self.width());
        self.clone()
    }

    #[inline]
    pub(crate) fn copy_for_growth<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Node<A, P> {
        Node::Dense(self.copy(instrument))
    }
}

/// Occupied slots of a dense node, in index order.
pub(crate) struct Entries<'a, A, P: SharedPointerKind> {
    node: &'a DenseNode<A, P>,
    index: usize,
    remaining: usize,
}

impl<'a, A, P: SharedPointerKind> Clone for Entries<'a, A, P> {
    fn clone(&self) -> Self {
        Entries {
            node: self.node,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Entries<'a, A, P> {
    type Item = (usize, &'a Entry<A, P>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining > 0 && self.index < VALUES_PER_LEVEL {
            let index = self.index;
            self.index += 1;
            if let Some(entry) = self.node.child_at_index(index) {
                self.remaining -= 1;
                return Some((index, entry));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, A, P: SharedPointerKind> FusedIterator for Entries<'a, A, P> {}
