// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;
use std::iter::FusedIterator;
use std::mem;
use std::slice::Iter as SliceIter;

use archery::{SharedPointer, SharedPointerKind};
use bitmaps::{Bits, BitsImpl};
use tracing::trace;

use crate::config::{BITS_PER_LEVEL, MAX_DEPTH, VALUES_PER_LEVEL};
use crate::key::HamtKey;
use crate::nodes::dense::{self, DenseNode};
use crate::nodes::sparse::{self, SparseNode};
use crate::stats::Instrument;

pub(crate) type HashBits = <BitsImpl<VALUES_PER_LEVEL> as Bits>::Store; // a u64
const INDEX_MASK: HashBits = (VALUES_PER_LEVEL - 1) as HashBits;

/// The slot a hash selects at `depth`.
#[inline]
pub(crate) fn index_for_depth(hash: HashBits, depth: usize) -> usize {
    (hash >> (depth * BITS_PER_LEVEL) & INDEX_MASK) as usize
}

/// Keys that share every bit of their hash.
///
/// Only ever found at [`MAX_DEPTH`], and always holds at least two
/// pairwise unequal keys.
pub(crate) struct CollisionNode<A> {
    hash: HashBits,
    data: Vec<A>,
}

impl<A: Clone> Clone for CollisionNode<A> {
    fn clone(&self) -> Self {
        CollisionNode {
            hash: self.hash,
            data: self.data.clone(),
        }
    }
}

impl<A> CollisionNode<A> {
    fn new(hash: HashBits, value1: A, value2: A) -> Self {
        CollisionNode {
            hash,
            data: vec![value1, value2],
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn values(&self) -> &[A] {
        &self.data
    }
}

impl<A: HamtKey> CollisionNode<A> {
    fn get(&self, key: &A) -> Option<&A> {
        self.data.iter().find(|item| A::key_eq(item, key))
    }

    fn position(&self, key: &A) -> Option<usize> {
        self.data.iter().position(|item| item.key_eq(key))
    }
}

/// The contents of an occupied slot.
pub(crate) enum Entry<A, P: SharedPointerKind> {
    Value(A, HashBits),
    Collision(SharedPointer<CollisionNode<A>, P>),
    Node(SharedPointer<Node<A, P>, P>),
}

impl<A: Clone, P: SharedPointerKind> Clone for Entry<A, P> {
    fn clone(&self) -> Self {
        match self {
            Entry::Value(value, hash) => Entry::Value(value.clone(), *hash),
            Entry::Collision(coll) => Entry::Collision(coll.clone()),
            Entry::Node(node) => Entry::Node(node.clone()),
        }
    }
}

impl<A, P: SharedPointerKind> From<CollisionNode<A>> for Entry<A, P> {
    fn from(node: CollisionNode<A>) -> Self {
        Entry::Collision(SharedPointer::new(node))
    }
}

/// What an insert did to the set.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Inserted<A> {
    /// The key was new.
    Added,
    /// An equal key was overwritten; this is the old one.
    Replaced(A),
    /// An equal key was already present and was left in place. The
    /// tree came back pointer identical.
    Unchanged,
}

/// A trie node, in one of two representations.
pub(crate) enum Node<A, P: SharedPointerKind> {
    Sparse(SparseNode<A, P>),
    Dense(DenseNode<A, P>),
}

impl<A: Clone, P: SharedPointerKind> Clone for Node<A, P> {
    fn clone(&self) -> Self {
        match self {
            Node::Sparse(node) => Node::Sparse(node.clone()),
            Node::Dense(node) => Node::Dense(node.clone()),
        }
    }
}

impl<A, P: SharedPointerKind> Default for Node<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, P: SharedPointerKind> Node<A, P> {
    /// An empty sparse node.
    #[inline]
    pub(crate) fn new() -> Self {
        Node::Sparse(SparseNode::new())
    }

    #[inline]
    pub(crate) fn width(&self) -> usize {
        match self {
            Node::Sparse(node) => node.width(),
            Node::Dense(node) => node.width(),
        }
    }

    #[inline]
    pub(crate) fn child_at_index(&self, index: usize) -> Option<&Entry<A, P>> {
        match self {
            Node::Sparse(node) => node.child_at_index(index),
            Node::Dense(node) => node.child_at_index(index),
        }
    }

    #[inline]
    pub(crate) fn set_child_at_index(&mut self, index: usize, entry: Entry<A, P>) {
        match self {
            Node::Sparse(node) => node.set_child_at_index(index, entry),
            Node::Dense(node) => node.set_child_at_index(index, entry),
        }
    }

    /// Occupied slots in index order.
    pub(crate) fn entries(&self) -> Entries<'_, A, P> {
        match self {
            Node::Sparse(node) => Entries::Sparse(node.entries()),
            Node::Dense(node) => Entries::Dense(node.entries()),
        }
    }
}

impl<A: Clone, P: SharedPointerKind> Node<A, P> {
    pub(crate) fn copy<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Self {
        match self {
            Node::Sparse(node) => Node::Sparse(node.copy(instrument)),
            Node::Dense(node) => Node::Dense(node.copy(instrument)),
        }
    }

    pub(crate) fn copy_for_growth<I: Instrument + ?Sized>(&self, instrument: &mut I) -> Self {
        match self {
            Node::Sparse(node) => node.copy_for_growth(instrument),
            Node::Dense(node) => node.copy_for_growth(instrument),
        }
    }
}

impl<A: HamtKey, P: SharedPointerKind> Node<A, P> {
    pub(crate) fn get(&self, hash: HashBits, depth: usize, key: &A) -> Option<&A> {
        match self.child_at_index(index_for_depth(hash, depth))? {
            Entry::Value(value, _) => {
                if value.key_eq(key) {
                    Some(value)
                } else {
                    None
                }
            }
            Entry::Collision(coll) => coll.get(key),
            Entry::Node(child) => child.get(hash, depth + 1, key),
        }
    }
}

impl<A: HamtKey + Clone, P: SharedPointerKind> Node<A, P> {
    /// Build a fresh subtree holding two keys that share a slot one
    /// level up.
    fn branch_of<I: Instrument + ?Sized>(
        value1: A,
        hash1: HashBits,
        value2: A,
        hash2: HashBits,
        depth: usize,
        instrument: &mut I,
    ) -> SharedPointer<Self, P> {
        let index1 = index_for_depth(hash1, depth);
        let index2 = index_for_depth(hash2, depth);
        let mut node = Node::new();
        if index1 != index2 {
            // Both values fit on the same level.
            node.set_child_at_index(index1, Entry::Value(value1, hash1));
            node.set_child_at_index(index2, Entry::Value(value2, hash2));
        } else if depth < MAX_DEPTH {
            // Pass the values down a level.
            let child = Node::branch_of(value1, hash1, value2, hash2, depth + 1, instrument);
            node.set_child_at_index(index1, Entry::Node(child));
        } else {
            // Out of hash bits: it's a full collision.
            node.set_child_at_index(index1, collision(hash1, value1, value2, instrument));
        }
        SharedPointer::new(node)
    }

    /// Insert `value` into the trie rooted at `this`.
    ///
    /// `this` is never written to. Every node on the path to the
    /// value's slot that has to change is copied, the copy is updated,
    /// and the new root of the path is returned; all other subtrees are
    /// shared with `this`. If nothing changed, `this` itself comes back.
    pub(crate) fn insert<I: Instrument + ?Sized>(
        this: &SharedPointer<Self, P>,
        hash: HashBits,
        depth: usize,
        value: A,
        overwrite: bool,
        instrument: &mut I,
    ) -> (SharedPointer<Self, P>, Inserted<A>) {
        let index = index_for_depth(hash, depth);
        let (entry, outcome) = match this.child_at_index(index) {
            Some(Entry::Node(child)) => {
                let (new_child, outcome) =
                    Node::insert(child, hash, depth + 1, value, overwrite, instrument);
                if SharedPointer::ptr_eq(&new_child, child) {
                    return (this.clone(), outcome);
                }
                (Entry::Node(new_child), outcome)
            }
            Some(Entry::Value(current, current_hash)) => {
                if current.key_eq(&value) {
                    if !overwrite {
                        return (this.clone(), Inserted::Unchanged);
                    }
                    (Entry::Value(value, hash), Inserted::Replaced(current.clone()))
                } else if depth < MAX_DEPTH {
                    let child = Node::branch_of(
                        current.clone(),
                        *current_hash,
                        value,
                        hash,
                        depth + 1,
                        instrument,
                    );
                    (Entry::Node(child), Inserted::Added)
                } else {
                    debug_assert_eq!(*current_hash, hash);
                    let coll = collision(hash, current.clone(), value, instrument);
                    (coll, Inserted::Added)
                }
            }
            Some(Entry::Collision(coll)) => {
                debug_assert_eq!(depth, MAX_DEPTH);
                let position = coll.position(&value);
                if position.is_some() && !overwrite {
                    return (this.clone(), Inserted::Unchanged);
                }
                let mut coll_copy = (**coll).clone();
                let outcome = match position {
                    Some(position) => {
                        Inserted::Replaced(mem::replace(&mut coll_copy.data[position], value))
                    }
                    None => {
                        coll_copy.data.push(value);
                        Inserted::Added
                    }
                };
                instrument.bucket_written(coll_copy.len());
                trace!(
                    target: "cowset::hamt",
                    depth,
                    len = coll_copy.len(),
                    "rewriting collision bucket"
                );
                (Entry::from(coll_copy), outcome)
            }
            None => {
                let mut node = this.copy_for_growth(instrument);
                node.set_child_at_index(index, Entry::Value(value, hash));
                return (SharedPointer::new(node), Inserted::Added);
            }
        };
        let mut node = this.copy(instrument);
        node.set_child_at_index(index, entry);
        (SharedPointer::new(node), outcome)
    }
}

fn collision<A, P: SharedPointerKind, I: Instrument + ?Sized>(
    hash: HashBits,
    value1: A,
    value2: A,
    instrument: &mut I,
) -> Entry<A, P> {
    instrument.bucket_written(2);
    trace!(target: "cowset::hamt", hash, "full hash collision, starting a bucket");
    Entry::from(CollisionNode::new(hash, value1, value2))
}

#[cfg(any(test, feature = "debug"))]
impl<A: HamtKey, P: SharedPointerKind> Node<A, P> {
    /// Walk the subtree checking its structural invariants, and return
    /// the number of keys it holds.
    pub(crate) fn check_sane(&self, depth: usize) -> usize {
        assert!(depth <= MAX_DEPTH, "node below maximum depth");
        if let Node::Sparse(node) = self {
            assert!(
                node.width() <= crate::config::SPARSE_WIDTH,
                "sparse node over capacity"
            );
        }
        let mut width = 0;
        let mut keys = 0;
        for (index, entry) in self.entries() {
            width += 1;
            match entry {
                Entry::Value(value, hash) => {
                    assert_eq!(value.hash_code(), *hash, "stale cached hash");
                    assert_eq!(index, index_for_depth(*hash, depth), "key in wrong slot");
                    keys += 1;
                }
                Entry::Collision(coll) => {
                    assert_eq!(depth, MAX_DEPTH, "collision bucket above maximum depth");
                    assert!(coll.len() >= 2, "collision bucket with a single key");
                    assert_eq!(index, index_for_depth(coll.hash, depth));
                    for (i, value) in coll.data.iter().enumerate() {
                        assert_eq!(value.hash_code(), coll.hash, "bucket hash mismatch");
                        assert!(
                            coll.data[i + 1..].iter().all(|other| !other.key_eq(value)),
                            "duplicate key in collision bucket"
                        );
                    }
                    keys += coll.len();
                }
                Entry::Node(child) => {
                    assert!(depth < MAX_DEPTH, "child node at maximum depth");
                    keys += child.check_sane(depth + 1);
                }
            }
        }
        assert_eq!(width, self.width(), "width disagrees with occupied slots");
        keys
    }
}

/// Occupied slots of a node, in index order.
pub(crate) enum Entries<'a, A, P: SharedPointerKind> {
    Sparse(sparse::Entries<'a, A, P>),
    Dense(dense::Entries<'a, A, P>),
}

impl<'a, A, P: SharedPointerKind> Clone for Entries<'a, A, P> {
    fn clone(&self) -> Self {
        match self {
            Entries::Sparse(it) => Entries::Sparse(it.clone()),
            Entries::Dense(it) => Entries::Dense(it.clone()),
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Entries<'a, A, P> {
    type Item = (usize, &'a Entry<A, P>);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Entries::Sparse(it) => it.next(),
            Entries::Dense(it) => it.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Entries::Sparse(it) => it.size_hint(),
            Entries::Dense(it) => it.size_hint(),
        }
    }
}

impl<'a, A, P: SharedPointerKind> FusedIterator for Entries<'a, A, P> {}

// Ref iterator

pub(crate) struct Iter<'a, A, P: SharedPointerKind> {
    count: usize,
    stack: Vec<Entries<'a, A, P>>,
    collision: Option<SliceIter<'a, A>>,
}

// We impl Clone instead of deriving it, because we want Clone even if A isn't.
impl<'a, A, P: SharedPointerKind> Clone for Iter<'a, A, P> {
    fn clone(&self) -> Self {
        Self {
            count: self.count,
            stack: self.stack.clone(),
            collision: self.collision.clone(),
        }
    }
}

impl<'a, A, P: SharedPointerKind> Iter<'a, A, P>
where
    A: 'a,
{
    pub(crate) fn new(root: Option<&'a Node<A, P>>, size: usize) -> Self {
        let mut result = Iter {
            count: size,
            stack: Vec::with_capacity(MAX_DEPTH + 1),
            collision: None,
        };
        if let Some(node) = root {
            result.stack.push(node.entries());
        }
        result
    }
}

impl<'a, A, P: SharedPointerKind> Iterator for Iter<'a, A, P>
where
    A: 'a,
{
    type Item = &'a A;

    fn next(&mut self) -> Option<Self::Item> {
        'outer: loop {
            if let Some(ref mut coll) = self.collision {
                match coll.next() {
                    None => self.collision = None,
                    Some(value) => {
                        self.count -= 1;
                        return Some(value);
                    }
                };
            }

            while let Some(current) = self.stack.last_mut() {
                match current.next() {
                    Some((_, Entry::Value(value, _))) => {
                        self.count -= 1;
                        return Some(value);
                    }
                    Some((_, Entry::Node(child))) => {
                        self.stack.push(child.entries());
                    }
                    Some((_, Entry::Collision(coll))) => {
                        self.collision = Some(coll.data.iter());
                        continue 'outer;
                    }
                    None => {
                        self.stack.pop();
                    }
                }
            }
            return None;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.count, Some(self.count))
    }
}

impl<'a, A, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> where A: 'a {}

impl<'a, A, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> where A: 'a {}

impl<A: fmt::Debug, P: SharedPointerKind> fmt::Debug for Node<A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            Node::Sparse(_) => write!(f, "Sparse[ ")?,
            Node::Dense(_) => write!(f, "Dense[ ")?,
        }
        for (index, entry) in self.entries() {
            write!(f, "{}: ", index)?;
            match entry {
                Entry::Value(v, _) => write!(f, "{:?}, ", v)?,
                Entry::Collision(c) => write!(f, "Coll{:?} :: {}, ", c.data, c.hash)?,
                Entry::Node(n) => write!(f, "{:?}, ", n)?,
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared_ptr::DefaultSharedPtr;
    use crate::stats::CopyCounters;
    use crate::test::{hash_of, Probe};
    use pretty_assertions::assert_eq;

    type Ref = SharedPointer<Node<Probe, DefaultSharedPtr>, DefaultSharedPtr>;

    fn insert(root: &Ref, probe: Probe) -> (Ref, Inserted<Probe>) {
        let hash = probe.hash;
        Node::insert(root, hash, 0, probe, true, &mut ())
    }

    fn find<'a>(root: &'a Ref, probe: &Probe) -> Option<&'a Probe> {
        root.get(probe.hash, 0, probe)
    }

    #[test]
    fn index_for_depth_takes_six_bit_chunks() {
        let hash = hash_of(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        for depth in 0..=MAX_DEPTH {
            assert_eq!(depth + 1, index_for_depth(hash, depth));
        }
        assert_eq!(63, index_for_depth(u64::MAX, 0));
        // Only four bits are left at the bottom.
        assert_eq!(15, index_for_depth(u64::MAX, MAX_DEPTH));
    }

    #[test]
    fn insert_into_empty_node() {
        let root = Ref::new(Node::new());
        let (root2, outcome) = insert(&root, Probe::new(1, 5));
        assert_eq!(Inserted::Added, outcome);
        assert_eq!(0, root.width());
        assert_eq!(1, root2.width());
        assert!(find(&root2, &Probe::new(1, 5)).is_some());
        assert!(find(&root, &Probe::new(1, 5)).is_none());
    }

    #[test]
    fn shared_chunk_pushes_keys_down() {
        let root = Ref::new(Node::new());
        let a = Probe::new(1, hash_of(&[7, 1]));
        let b = Probe::new(2, hash_of(&[7, 2]));
        let (root, _) = insert(&root, a.clone());
        let (root, _) = insert(&root, b.clone());
        assert_eq!(1, root.width());
        match root.child_at_index(7) {
            Some(Entry::Node(child)) => {
                assert_eq!(2, child.width());
                assert!(matches!(child.child_at_index(1), Some(Entry::Value(_, _))));
                assert!(matches!(child.child_at_index(2), Some(Entry::Value(_, _))));
            }
            _ => panic!("expected a child node at slot 7"),
        }
        assert_eq!(2, root.check_sane(0));
    }

    #[test]
    fn unchanged_insert_returns_same_node() {
        let root = Ref::new(Node::new());
        let probe = Probe::new(1, hash_of(&[3, 3, 3]));
        let (root, _) = insert(&root, probe.clone());
        let (root, _) = insert(&root, Probe::new(2, hash_of(&[3, 3, 4])));
        let (again, outcome) = Node::insert(&root, probe.hash, 0, probe, false, &mut ());
        assert_eq!(Inserted::Unchanged, outcome);
        assert!(SharedPointer::ptr_eq(&root, &again));
    }

    #[test]
    fn overwrite_replaces_payload() {
        let root = Ref::new(Node::new());
        let (root, _) = insert(&root, Probe::with_payload(1, 9, 100));
        let (root2, outcome) = insert(&root, Probe::with_payload(1, 9, 200));
        match outcome {
            Inserted::Replaced(old) => assert_eq!(100, old.payload),
            other => panic!("expected a replacement, got {:?}", other),
        }
        assert_eq!(100, find(&root, &Probe::new(1, 9)).unwrap().payload);
        assert_eq!(200, find(&root2, &Probe::new(1, 9)).unwrap().payload);
    }

    #[test]
    fn keys_split_by_last_four_bits_are_not_a_collision() {
        let prefix = [5, 5, 5, 5, 5, 5, 5, 5, 5, 5];
        let mut low = prefix.to_vec();
        low.push(1);
        let mut high = prefix.to_vec();
        high.push(2);
        let root = Ref::new(Node::new());
        let (root, _) = insert(&root, Probe::new(1, hash_of(&low)));
        let (root, _) = insert(&root, Probe::new(2, hash_of(&high)));
        let mut node = root.clone();
        for _ in 0..MAX_DEPTH {
            let next = match node.child_at_index(5) {
                Some(Entry::Node(child)) => child.clone(),
                _ => panic!("expected a chain of single child nodes"),
            };
            node = next;
        }
        assert_eq!(2, node.width());
        assert!(matches!(node.child_at_index(1), Some(Entry::Value(_, _))));
        assert!(matches!(node.child_at_index(2), Some(Entry::Value(_, _))));
        assert_eq!(2, root.check_sane(0));
    }

    #[test]
    fn full_collisions_fill_a_bucket() {
        let hash = 0xdead_beef_cafe_f00d;
        let mut counters = CopyCounters::default();
        let mut root = Ref::new(Node::new());
        for id in 0..3 {
            let (next, outcome) =
                Node::insert(&root, hash, 0, Probe::new(id, hash), true, &mut counters);
            assert_eq!(Inserted::Added, outcome);
            root = next;
        }
        for id in 0..3 {
            assert_eq!(id, find(&root, &Probe::new(id, hash)).unwrap().id);
        }
        assert!(find(&root, &Probe::new(3, hash)).is_none());
        assert_eq!(2, counters.bucket_writes);
        assert_eq!(3, root.check_sane(0));
    }

    #[test]
    fn bucket_overwrite_and_keep() {
        let hash = 42;
        let root = Ref::new(Node::new());
        let (root, _) = insert(&root, Probe::with_payload(1, hash, 1));
        let (root, _) = insert(&root, Probe::with_payload(2, hash, 2));
        let (kept, outcome) =
            Node::insert(&root, hash, 0, Probe::with_payload(2, hash, 3), false, &mut ());
        assert_eq!(Inserted::Unchanged, outcome);
        assert!(SharedPointer::ptr_eq(&root, &kept));
        let (replaced, outcome) = insert(&root, Probe::with_payload(2, hash, 3));
        assert!(matches!(outcome, Inserted::Replaced(Probe { payload: 2, .. })));
        assert_eq!(3, find(&replaced, &Probe::new(2, hash)).unwrap().payload);
        assert_eq!(2, find(&root, &Probe::new(2, hash)).unwrap().payload);
        assert_eq!(2, replaced.check_sane(0));
    }

    #[test]
    fn iter_visits_everything_once() {
        let mut root = Ref::new(Node::new());
        let mut expected = Vec::new();
        for id in 0..200u32 {
            // Every id shares its hash with one neighbour.
            let hash = u64::from(id / 2).wrapping_mul(0x9e37_79b9_7f4a_7c15);
            let (next, _) = insert(&root, Probe::new(id, hash));
            root = next;
            expected.push(id);
        }
        let mut seen: Vec<u32> = Iter::new(Some(&*root), 200).map(|p| p.id).collect();
        seen.sort_unstable();
        assert_eq!(expected, seen);
        assert_eq!(200, root.check_sane(0));
    }

    #[test]
    fn debug_output_shows_structure() {
        let root = Ref::new(Node::new());
        let (root, _) = insert(&root, Probe::new(1, 3));
        let text = format!("{:?}", root);
        assert!(text.starts_with("Sparse[ 3: Probe"));
    }
}
