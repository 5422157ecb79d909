#![no_main]

use std::collections::HashSet as NatSet;
use std::iter::FromIterator;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use cowset::{CowSet, HamtKey};

/// A key whose hash only depends on its top ten bits, so runs of 64
/// neighbouring ids share a collision bucket.
#[derive(Arbitrary, Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Key(u16);

impl HamtKey for Key {
    fn hash_code(&self) -> u64 {
        u64::from(self.0 >> 6).wrapping_mul(0x0041_0410_4104_1041)
    }

    fn key_eq(&self, other: &Self) -> bool {
        self == other
    }
}

#[derive(Arbitrary, Debug)]
enum Action {
    Insert(Key),
    InsertNew(Key),
    Extend(CowSet<Key>),
    Snapshot,
}

fuzz_target!(|actions: Vec<Action>| {
    let mut set = CowSet::new();
    let mut nat = NatSet::new();
    let mut snapshots = Vec::new();
    for action in actions {
        match action {
            Action::Insert(value) => {
                let len = nat.len() + if nat.contains(&value) { 0 } else { 1 };
                nat.insert(value);
                set.insert(value);
                assert_eq!(len, set.len());
            }
            Action::InsertNew(value) => {
                let before = set.clone();
                let added = set.insert_new(value);
                assert_eq!(nat.insert(value), added);
                if !added {
                    assert!(set.ptr_eq(&before));
                }
            }
            Action::Extend(other) => {
                other.assert_sane();
                nat.extend(other.iter().copied());
                set.extend(other.iter().copied());
            }
            Action::Snapshot => snapshots.push((set.clone(), nat.clone())),
        }
        assert_eq!(nat.len(), set.len());
    }
    for (snapshot, expected) in &snapshots {
        assert_eq!(&NatSet::from_iter(snapshot.iter().copied()), expected);
    }
    for value in &nat {
        assert!(set.contains(value));
    }
    set.assert_sane();
    assert_eq!(NatSet::from_iter(set.iter().copied()), nat);
    assert_eq!(CowSet::from_iter(nat.iter().copied()), set);
    assert_eq!(set.iter().count(), nat.len());
});
