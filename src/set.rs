// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A copy-on-write set.
//!
//! An immutable hash set using [hash array mapped tries] [1].
//!
//! Every insert builds a new version of the trie, copying only the
//! nodes on the path from the root to the key's slot and sharing all
//! others with the previous version. Cloning a set is O(1) and gives
//! you a snapshot that later inserts into either copy can't disturb.
//!
//! Values will have a predictable order based on their
//! [`hash_code`][crate::HamtKey::hash_code], but no ordering guarantee
//! beyond that is offered.
//!
//! [1]: https://en.wikipedia.org/wiki/Hash_array_mapped_trie

use std::fmt::{Debug, Error, Formatter};
use std::iter::{FromIterator, FusedIterator};

use archery::{SharedPointer, SharedPointerKind};

use crate::key::HamtKey;
use crate::nodes::hamt::{Inserted, Iter as NodeIter, Node};
use crate::shared_ptr::DefaultSharedPtr;
use crate::stats::Instrument;
use crate::view::NodeRef;

/// Construct a set from a sequence of values.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate cowset;
/// # use cowset::{CowSet, StringKey};
/// # fn main() {
/// assert_eq!(
///   cowset![StringKey::from("bob"), StringKey::from("sally")],
///   CowSet::from(vec![StringKey::from("sally"), StringKey::from("bob")])
/// );
/// # }
/// ```
#[macro_export]
macro_rules! cowset {
    () => { $crate::CowSet::new() };

    ( $($x:expr),* ) => {{
        let mut l = $crate::CowSet::new();
        $(
            l.insert($x);
        )*
            l
    }};

    ( $($x:expr ,)* ) => {{
        let mut l = $crate::CowSet::new();
        $(
            l.insert($x);
        )*
            l
    }};
}

/// Type alias for [`GenericCowSet`] that uses [`DefaultSharedPtr`] as the pointer type.
///
/// [GenericCowSet]: ./struct.GenericCowSet.html
/// [DefaultSharedPtr]: ../shared_ptr/type.DefaultSharedPtr.html
pub type CowSet<A> = GenericCowSet<A, DefaultSharedPtr>;

/// A copy-on-write set.
///
/// The set holds the root of the current version of its trie, or
/// nothing when empty. Nodes reachable from a root are never modified,
/// so any number of snapshots can be read while one owner keeps
/// inserting.
pub struct GenericCowSet<A, P: SharedPointerKind> {
    root: Option<SharedPointer<Node<A, P>, P>>,
    size: usize,
}

impl<A, P: SharedPointerKind> GenericCowSet<A, P> {
    /// Construct an empty set.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        GenericCowSet {
            root: None,
            size: 0,
        }
    }

    /// Test whether a set is empty.
    ///
    /// Time: O(1)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of keys in a set.
    ///
    /// Time: O(1)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate cowset;
    /// # use cowset::StringKey;
    /// let set = cowset![StringKey::from("a"), StringKey::from("b"), StringKey::from("a")];
    /// assert_eq!(2, set.len());
    /// ```
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Test whether two sets refer to the same content in memory.
    ///
    /// This is true if the two sides are references to the same set,
    /// or if the two sets refer to the same root node.
    ///
    /// Time: O(1)
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(a), Some(b)) => SharedPointer::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Discard all elements from the set.
    ///
    /// Snapshots taken earlier keep their contents.
    pub fn clear(&mut self) {
        self.root = None;
        self.size = 0;
    }

    /// Get an iterator over the values in a set.
    ///
    /// Values come out in slot order, level by level, so the order is
    /// the same every time for the same set, but it's neither insertion
    /// order nor sort order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, A, P> {
        Iter {
            it: NodeIter::new(self.root.as_deref(), self.size),
        }
    }

    /// The top node of the trie, or `None` for an empty set.
    ///
    /// See the [`view`][crate::view] module for walking the structure.
    #[must_use]
    pub fn root(&self) -> Option<NodeRef<'_, A, P>> {
        self.root.as_ref().map(NodeRef::new)
    }
}

impl<A: HamtKey, P: SharedPointerKind> GenericCowSet<A, P> {
    /// Look up the stored key equal to `key`.
    ///
    /// This never allocates.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate cowset;
    /// # use cowset::StringKey;
    /// let set = cowset![StringKey::from("bob")];
    /// assert_eq!(Some("bob"), set.find(&StringKey::from("bob")).map(|k| k.as_str()));
    /// assert_eq!(None, set.find(&StringKey::from("nope")));
    /// ```
    #[must_use]
    pub fn find(&self, key: &A) -> Option<&A> {
        self.root
            .as_ref()
            .and_then(|root| root.get(key.hash_code(), 0, key))
    }

    /// Test if a key is part of a set.
    ///
    /// Time: O(log n)
    #[must_use]
    pub fn contains(&self, key: &A) -> bool {
        self.find(key).is_some()
    }

    /// Test whether a set is a subset of another set, meaning that
    /// all values in our set must also be in the other set.
    ///
    /// Time: O(n log n)
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|a| other.contains(a))
    }
}

impl<A: HamtKey + Clone, P: SharedPointerKind> GenericCowSet<A, P> {
    /// Construct a set with a single value.
    #[inline]
    #[must_use]
    pub fn unit(a: A) -> Self {
        GenericCowSet::new().update(a)
    }

    /// Insert a value into a set.
    ///
    /// If an equal value was already there it's replaced, and the old
    /// one is returned.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # use cowset::{CowSet, StringKey};
    /// let mut set = CowSet::new();
    /// assert_eq!(None, set.insert(StringKey::from("bob")));
    /// assert_eq!(Some(StringKey::from("bob")), set.insert(StringKey::from("bob")));
    /// assert_eq!(1, set.len());
    /// ```
    #[inline]
    pub fn insert(&mut self, a: A) -> Option<A> {
        match self.insert_with(a, true, &mut ()) {
            Inserted::Replaced(old) => Some(old),
            Inserted::Added | Inserted::Unchanged => None,
        }
    }

    /// Insert a value into a set unless an equal one is already there.
    ///
    /// Returns `true` if the value was added. When it wasn't, the set
    /// is left exactly as it was: even its root node is the same.
    ///
    /// Time: O(log n)
    pub fn insert_new(&mut self, a: A) -> bool {
        matches!(self.insert_with(a, false, &mut ()), Inserted::Added)
    }

    /// Insert a value into a set, reporting the work done to
    /// `instrument`.
    ///
    /// Behaves exactly like [`insert`][GenericCowSet::insert].
    pub fn insert_instrumented<I>(&mut self, a: A, instrument: &mut I) -> Option<A>
    where
        I: Instrument + ?Sized,
    {
        match self.insert_with(a, true, instrument) {
            Inserted::Replaced(old) => Some(old),
            Inserted::Added | Inserted::Unchanged => None,
        }
    }

    fn insert_with<I>(&mut self, a: A, overwrite: bool, instrument: &mut I) -> Inserted<A>
    where
        I: Instrument + ?Sized,
    {
        let hash = a.hash_code();
        let root = self
            .root
            .get_or_insert_with(|| SharedPointer::new(Node::new()));
        let (new_root, outcome) = Node::insert(root, hash, 0, a, overwrite, instrument);
        *root = new_root;
        if let Inserted::Added = outcome {
            self.size += 1;
        }
        #[cfg(feature = "debug")]
        self.assert_sane();
        outcome
    }

    /// Construct a new set from the current set with the given value
    /// added.
    ///
    /// Time: O(log n)
    ///
    /// # Examples
    ///
    /// ```
    /// # #[macro_use] extern crate cowset;
    /// # use cowset::StringKey;
    /// let set = cowset![StringKey::from("bob")];
    /// let bigger = set.update(StringKey::from("hank"));
    /// assert_eq!(1, set.len());
    /// assert_eq!(2, bigger.len());
    /// ```
    #[must_use]
    pub fn update(&self, a: A) -> Self {
        let mut out = self.clone();
        out.insert(a);
        out
    }
}

#[cfg(any(test, feature = "debug"))]
impl<A: HamtKey, P: SharedPointerKind> GenericCowSet<A, P> {
    /// Check every structural invariant of the trie, panicking on the
    /// first violation.
    pub fn assert_sane(&self) {
        let keys = self.root.as_ref().map_or(0, |root| root.check_sane(0));
        assert_eq!(keys, self.size, "stored key count disagrees with len()");
    }
}

// Core traits

impl<A, P: SharedPointerKind> Clone for GenericCowSet<A, P> {
    /// Clone a set.
    ///
    /// The clone shares every node with the original.
    ///
    /// Time: O(1)
    #[inline]
    fn clone(&self) -> Self {
        GenericCowSet {
            root: self.root.clone(),
            size: self.size,
        }
    }
}

impl<A, P: SharedPointerKind> Default for GenericCowSet<A, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: HamtKey, P: SharedPointerKind> PartialEq for GenericCowSet<A, P> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.iter().all(|a| other.contains(a)))
    }
}

impl<A: HamtKey, P: SharedPointerKind> Eq for GenericCowSet<A, P> {}

impl<A: Debug, P: SharedPointerKind> Debug for GenericCowSet<A, P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        f.debug_set().entries(self.iter()).finish()
    }
}

// Iterators

/// An iterator over the elements of a set.
pub struct Iter<'a, A, P: SharedPointerKind> {
    it: NodeIter<'a, A, P>,
}

// We impl Clone instead of deriving it, because we want Clone even if A isn't.
impl<'a, A, P: SharedPointerKind> Clone for Iter<'a, A, P> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
        }
    }
}

impl<'a, A, P> Iterator for Iter<'a, A, P>
where
    A: 'a,
    P: SharedPointerKind,
{
    type Item = &'a A;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, A, P: SharedPointerKind> ExactSizeIterator for Iter<'a, A, P> where A: 'a {}

impl<'a, A, P: SharedPointerKind> FusedIterator for Iter<'a, A, P> where A: 'a {}

impl<'a, A, P: SharedPointerKind> IntoIterator for &'a GenericCowSet<A, P> {
    type Item = &'a A;
    type IntoIter = Iter<'a, A, P>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A, R, P> FromIterator<R> for GenericCowSet<A, P>
where
    A: HamtKey + Clone + From<R>,
    P: SharedPointerKind,
{
    fn from_iter<T>(i: T) -> Self
    where
        T: IntoIterator<Item = R>,
    {
        let mut set = Self::new();
        for value in i {
            set.insert(From::from(value));
        }
        set
    }
}

impl<A, R, P> Extend<R> for GenericCowSet<A, P>
where
    A: HamtKey + Clone + From<R>,
    P: SharedPointerKind,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = R>,
    {
        for value in iter {
            self.insert(From::from(value));
        }
    }
}

// Conversions

impl<A, const N: usize, P> From<[A; N]> for GenericCowSet<A, P>
where
    A: HamtKey + Clone,
    P: SharedPointerKind,
{
    fn from(arr: [A; N]) -> Self {
        IntoIterator::into_iter(arr).collect()
    }
}

impl<'a, A, P> From<&'a [A]> for GenericCowSet<A, P>
where
    A: HamtKey + Clone,
    P: SharedPointerKind,
{
    fn from(slice: &'a [A]) -> Self {
        slice.iter().cloned().collect()
    }
}

impl<A, P> From<Vec<A>> for GenericCowSet<A, P>
where
    A: HamtKey + Clone,
    P: SharedPointerKind,
{
    fn from(vec: Vec<A>) -> Self {
        vec.into_iter().collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::key::{HashedKey, StringKey};
    use crate::proptest::cow_set;
    use crate::test::{hash_of, Probe};
    use crate::view::{NodeKind, Slot};
    use ::proptest::collection;
    use ::proptest::num;
    use ::proptest::proptest;
    use ::proptest::strategy::Strategy;
    use archery::RcK;
    use pretty_assertions::assert_eq;
    use static_assertions::{assert_impl_all, assert_not_impl_any};
    use std::collections::HashSet as StdHashSet;

    assert_impl_all!(CowSet<StringKey>: Send, Sync);
    assert_not_impl_any!(GenericCowSet<StringKey, RcK>: Send, Sync);
    assert_covariant!(CowSet<T> in T);

    fn key(name: &str) -> StringKey {
        StringKey::from(name)
    }

    #[test]
    fn bob_sally_bob_hank() {
        let mut set = CowSet::new();
        for name in ["bob", "sally", "bob", "hank"] {
            set.insert(key(name));
        }
        assert!(set.contains(&key("bob")));
        assert!(set.contains(&key("sally")));
        assert!(set.contains(&key("hank")));
        assert!(!set.contains(&key("nope")));
        assert_eq!(3, set.len());
        assert_eq!(3, set.iter().count());
        assert_eq!(3, crate::TreeStats::collect(&set).leaves());
    }

    #[test]
    fn bigger_name_list() {
        let names = [
            "bob", "sally", "hank", "sue", "billy", "ned", "zippy", "stu", "fred", "leopold",
            "groucho",
        ];
        let set: CowSet<StringKey> = names.iter().copied().map(StringKey::from).collect();
        for name in names {
            assert!(set.contains(&key(name)), "{} went missing", name);
        }
        for name in ["boopsy", "snucko", "flash"] {
            assert!(!set.contains(&key(name)));
        }
    }

    #[test]
    fn empty_set() {
        let set = CowSet::<StringKey>::new();
        assert!(set.is_empty());
        assert!(set.root().is_none());
        assert_eq!(None, set.find(&key("bob")));
        assert_eq!(0, set.iter().count());
        assert_eq!(set, CowSet::default());
    }

    #[test]
    fn reinsert_overwrites_payload() {
        let mut set = CowSet::new();
        set.insert(Probe::with_payload(1, 77, 10));
        let before = set.clone();
        let old = set.insert(Probe::with_payload(1, 77, 20));
        assert_eq!(Some(10), old.map(|p| p.payload));
        assert_eq!(1, set.len());
        assert_eq!(20, set.find(&Probe::new(1, 77)).unwrap().payload);
        assert_eq!(10, before.find(&Probe::new(1, 77)).unwrap().payload);
        // Overwriting still makes a new root.
        assert!(!set.ptr_eq(&before));
    }

    #[test]
    fn insert_new_keeps_existing_and_root() {
        let mut set = CowSet::new();
        assert!(set.insert_new(Probe::with_payload(1, 5, 1)));
        assert!(set.insert_new(Probe::with_payload(2, hash_of(&[5, 1]), 2)));
        let before = set.clone();
        assert!(!set.insert_new(Probe::with_payload(1, 5, 99)));
        assert!(!set.insert_new(Probe::with_payload(2, hash_of(&[5, 1]), 99)));
        assert!(set.ptr_eq(&before));
        assert_eq!(1, set.find(&Probe::new(1, 5)).unwrap().payload);
        assert_eq!(2, set.len());
    }

    #[test]
    fn unrelated_subtrees_are_shared() {
        let mut set = CowSet::new();
        for (id, chunks) in [(1, [1, 1]), (2, [1, 2]), (3, [2, 1]), (4, [2, 2])] {
            set.insert(Probe::new(id, hash_of(&chunks)));
        }
        let before = set.clone();
        set.insert(Probe::new(5, hash_of(&[3])));
        set.insert(Probe::new(6, hash_of(&[1, 3])));

        let old_root = before.root().unwrap();
        let new_root = set.root().unwrap();
        assert!(!old_root.ptr_eq(&new_root));
        match (old_root.slot(2), new_root.slot(2)) {
            (Slot::Node(old), Slot::Node(new)) => assert!(old.ptr_eq(&new)),
            _ => panic!("expected a node under slot 2"),
        }
        match (old_root.slot(1), new_root.slot(1)) {
            (Slot::Node(old), Slot::Node(new)) => {
                assert!(!old.ptr_eq(&new));
                assert_eq!(2, old.width());
                assert_eq!(3, new.width());
            }
            _ => panic!("expected a node under slot 1"),
        }
        assert!(before.root().unwrap().slot(3).is_empty());
    }

    #[test]
    fn snapshots_are_isolated() {
        let mut s = CowSet::new();
        for id in 0..50 {
            s.insert(Probe::new(id, u64::from(id) * 0x0123_4567_89ab_cdef));
        }
        let k = Probe::new(1000, 0xffff);
        let mut s2 = s.update(k.clone());
        assert!(s2.contains(&k));
        assert!(!s.contains(&k));
        for id in 1001..1100 {
            s2.insert(Probe::new(id, u64::from(id)));
        }
        assert_eq!(50, s.len());
        assert_eq!(150, s2.len());
        for id in 0..50 {
            assert!(s.contains(&Probe::new(id, u64::from(id) * 0x0123_4567_89ab_cdef)));
        }
        assert!(!s.contains(&Probe::new(1050, 1050)));
        s.assert_sane();
    }

    #[test]
    fn fifth_slot_upgrades_root_to_dense() {
        let mut set = CowSet::new();
        for chunk in 0..4 {
            set.insert(Probe::new(chunk as u32, hash_of(&[chunk * 10])));
        }
        assert_eq!(NodeKind::Sparse, set.root().unwrap().kind());
        set.insert(Probe::new(4, hash_of(&[40])));
        let root = set.root().unwrap();
        assert_eq!(NodeKind::Dense, root.kind());
        assert_eq!(5, root.width());
        for chunk in 0..5 {
            assert!(set.contains(&Probe::new(chunk as u32, hash_of(&[chunk * 10]))));
        }
        set.assert_sane();
    }

    #[test]
    fn growth_happens_at_any_depth() {
        let mut set = CowSet::new();
        for chunk in 0..6 {
            set.insert(Probe::new(chunk as u32, hash_of(&[8, 8, chunk])));
        }
        let mut node = set.root().unwrap();
        for _ in 0..2 {
            assert_eq!(NodeKind::Sparse, node.kind());
            node = match node.slot(8) {
                Slot::Node(child) => child,
                other => panic!("expected a node, found {:?}", other),
            };
        }
        assert_eq!(NodeKind::Dense, node.kind());
        assert_eq!(6, node.width());
        set.assert_sane();
    }

    #[test]
    fn colliding_keys_live_together() {
        let hash = 0x5555_aaaa_5555_aaaa;
        let mut set = CowSet::new();
        set.insert(Probe::new(1, hash));
        set.insert(Probe::new(2, hash));
        assert!(set.contains(&Probe::new(1, hash)));
        assert!(set.contains(&Probe::new(2, hash)));
        let pair = set.clone();
        set.insert(Probe::new(3, hash));
        assert_eq!(3, set.len());
        for id in 1..=3 {
            assert!(set.contains(&Probe::new(id, hash)));
        }
        assert!(!pair.contains(&Probe::new(3, hash)));
        assert_eq!(2, pair.len());
        assert_eq!(3, crate::TreeStats::collect(&set).colliding_leaves);
        set.assert_sane();
        pair.assert_sane();
    }

    #[test]
    fn large_sets_check_once() {
        let mut set: CowSet<HashedKey<u32>> = CowSet::new();
        for value in 0..100_000 {
            set.insert(HashedKey::new(value));
        }
        assert_eq!(100_000, set.len());
        assert!(set.contains(&HashedKey::new(99_999)));
        assert!(!set.contains(&HashedKey::new(100_000)));
        set.assert_sane();
    }

    #[test]
    fn conversions_and_equality() {
        let from_vec: CowSet<StringKey> = CowSet::from(vec![key("a"), key("b")]);
        let from_array: CowSet<StringKey> = CowSet::from([key("b"), key("a")]);
        let from_slice: CowSet<StringKey> = CowSet::from(&[key("a"), key("b"), key("a")][..]);
        assert_eq!(from_vec, from_array);
        assert_eq!(from_vec, from_slice);
        assert_ne!(from_vec, CowSet::unit(key("a")));
        let mut extended = CowSet::unit(key("a"));
        extended.extend(["b"]);
        assert_eq!(from_vec, extended);
        assert!(CowSet::unit(key("a")).is_subset(&from_vec));
        assert!(!from_vec.is_subset(&CowSet::unit(key("a"))));
    }

    #[test]
    fn clear_leaves_snapshots_alone() {
        let mut set = cowset![key("x"), key("y")];
        let snapshot = set.clone();
        set.clear();
        assert!(set.is_empty());
        assert_eq!(2, snapshot.len());
        assert!(snapshot.contains(&key("x")));
    }

    #[test]
    fn macro_allows_trailing_comma() {
        let set1 = cowset! {key("foo"), key("bar")};
        let set2 = cowset! {
            key("foo"),
            key("bar"),
        };
        assert_eq!(set1, set2);
    }

    #[test]
    fn debug_lists_values() {
        let set = cowset![key("only")];
        assert_eq!("{\"only\"}", format!("{:?}", set));
    }

    proptest! {
        #[test]
        fn proptest_a_set(ref s in cow_set::<_, DefaultSharedPtr>(
            num::i16::ANY.prop_map(HashedKey::<i16>::new),
            10..100,
        )) {
            assert!(s.len() < 100);
            assert!(s.len() >= 10);
        }

        #[test]
        fn membership_matches_std(ref input in collection::vec(num::i16::ANY, 0..1000)) {
            let mut set: CowSet<HashedKey<i16>> = CowSet::new();
            let mut std = StdHashSet::new();
            for &value in input {
                let added = set.insert(HashedKey::new(value)).is_none();
                assert_eq!(std.insert(value), added);
                assert_eq!(std.len(), set.len());
            }
            for value in -200..200i16 {
                assert_eq!(std.contains(&value), set.contains(&HashedKey::new(value)));
            }
            let mut out: Vec<i16> = set.iter().map(|k| **k).collect();
            out.sort_unstable();
            let mut expected: Vec<i16> = std.into_iter().collect();
            expected.sort_unstable();
            assert_eq!(expected, out);
            set.assert_sane();
        }

        #[test]
        fn heavy_collisions_match_std(ref ids in collection::vec(num::u8::ANY, 0..300)) {
            // Only eight distinct hashes, so nearly every key ends up in a bucket.
            let probe = |id: u8| {
                Probe::new(u32::from(id), u64::from(id % 8).wrapping_mul(0x9e37_79b9_7f4a_7c15))
            };
            let mut set = CowSet::new();
            let mut std = StdHashSet::new();
            for &id in ids {
                assert_eq!(std.insert(id), set.insert_new(probe(id)));
            }
            assert_eq!(std.len(), set.len());
            for id in 0..=u8::MAX {
                assert_eq!(std.contains(&id), set.contains(&probe(id)));
            }
            set.assert_sane();
        }

        #[test]
        fn every_version_stays_intact(ref input in collection::vec(num::i16::ANY, 1..200)) {
            let mut versions = vec![CowSet::<HashedKey<i16>>::new()];
            for &value in input {
                let next = versions.last().unwrap().update(HashedKey::new(value));
                versions.push(next);
            }
            for (count, version) in versions.iter().enumerate() {
                let mut expected = StdHashSet::new();
                expected.extend(input[..count].iter().copied());
                assert_eq!(expected.len(), version.len());
                for value in &input[..count] {
                    assert!(version.contains(&HashedKey::new(*value)));
                }
                version.assert_sane();
            }
        }
    }
}
