// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Keys.
//!
//! Anything stored in a [`CowSet`][crate::CowSet] implements [`HamtKey`]:
//! it produces a stable 64-bit hash, and it can tell whether another key
//! of the same type is equal to it.
//!
//! The trie never checks that the two agree. A key whose
//! [`key_eq`][HamtKey::key_eq] says two values are equal while
//! [`hash_code`][HamtKey::hash_code] gives them different hashes, or
//! whose hash changes between calls, leads to undefined membership
//! results (though never to memory unsafety).
//!
//! A few ready made keys live here too:
//!
//! * [`StringKey`], an owned string hashed with 64-bit FNV-1a.
//! * [`HashedKey`], which adapts any [`Hash`] + [`Eq`] type through a
//!   deterministic [`BuildHasher`].
//! * [`AnyKey`], a shared trait object for sets of mixed key types.

use std::any::Any;
use std::borrow::Borrow;
use std::collections::hash_map::DefaultHasher;
use std::fmt::{Debug, Display, Error, Formatter};
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

/// The capability every element of a set must provide.
pub trait HamtKey {
    /// A 64-bit hash of the key.
    ///
    /// Must return the same value every time for keys that are equal
    /// according to [`key_eq`][HamtKey::key_eq]. It need not be
    /// collision free: keys with identical hashes end up in a collision
    /// bucket at the bottom of the trie.
    fn hash_code(&self) -> u64;

    /// Test whether two keys are the same logical key.
    ///
    /// Must be reflexive and symmetric.
    fn key_eq(&self, other: &Self) -> bool;
}

impl<K: HamtKey + ?Sized> HamtKey for &K {
    #[inline]
    fn hash_code(&self) -> u64 {
        (**self).hash_code()
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(*other)
    }
}

impl<K: HamtKey + ?Sized> HamtKey for Box<K> {
    #[inline]
    fn hash_code(&self) -> u64 {
        (**self).hash_code()
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(other)
    }
}

impl<K: HamtKey + ?Sized> HamtKey for Rc<K> {
    #[inline]
    fn hash_code(&self) -> u64 {
        (**self).hash_code()
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(other)
    }
}

impl<K: HamtKey + ?Sized> HamtKey for Arc<K> {
    #[inline]
    fn hash_code(&self) -> u64 {
        (**self).hash_code()
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        (**self).key_eq(other)
    }
}

// String keys

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a over a byte string.
pub(crate) fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// An owned string key, hashed with 64-bit FNV-1a.
///
/// # Examples
///
/// ```
/// # use cowset::{CowSet, StringKey};
/// let mut set = CowSet::new();
/// set.insert(StringKey::from("bob"));
/// assert!(set.contains(&StringKey::from("bob")));
/// assert!(!set.contains(&StringKey::from("sally")));
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StringKey(String);

impl StringKey {
    /// Construct a key from anything string-like.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        StringKey(value.into())
    }

    /// The key's string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap the key into its string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl HamtKey for StringKey {
    #[inline]
    fn hash_code(&self) -> u64 {
        fnv1a_64(self.0.as_bytes())
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Deref for StringKey {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Borrow<str> for StringKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StringKey {
    fn from(value: &str) -> Self {
        StringKey(value.to_owned())
    }
}

impl From<String> for StringKey {
    fn from(value: String) -> Self {
        StringKey(value)
    }
}

impl Debug for StringKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        Debug::fmt(&self.0, f)
    }
}

impl Display for StringKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        Display::fmt(&self.0, f)
    }
}

// Std hash adapter

/// A key made from any [`Hash`] + [`Eq`] value.
///
/// The hash comes from a fresh `S::default()` hasher on every call, so
/// `S` must build hashers that don't depend on per-instance state (a
/// [`RandomState`][std::collections::hash_map::RandomState] would give
/// each call a different hash). The default,
/// [`BuildHasherDefault<DefaultHasher>`], is deterministic within a
/// single build of the program.
///
/// # Examples
///
/// ```
/// # use cowset::{CowSet, HashedKey};
/// let set: CowSet<HashedKey<i32>> = (0..100).map(HashedKey::new).collect();
/// assert!(set.contains(&HashedKey::new(42)));
/// assert_eq!(100, set.len());
/// ```
pub struct HashedKey<A, S = BuildHasherDefault<DefaultHasher>> {
    value: A,
    hasher: PhantomData<fn() -> S>,
}

impl<A> HashedKey<A> {
    /// Wrap a value, hashing it with the default hasher.
    ///
    /// Use [`From`] to pick a different `S`.
    #[inline]
    #[must_use]
    pub fn new(value: A) -> Self {
        HashedKey::from(value)
    }
}

impl<A, S> HashedKey<A, S> {
    /// Unwrap the key into its value.
    #[must_use]
    pub fn into_inner(self) -> A {
        self.value
    }
}

impl<A, S> HamtKey for HashedKey<A, S>
where
    A: Hash + Eq,
    S: BuildHasher + Default,
{
    #[inline]
    fn hash_code(&self) -> u64 {
        S::default().hash_one(&self.value)
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<A, S> Deref for HashedKey<A, S> {
    type Target = A;
    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<A: Clone, S> Clone for HashedKey<A, S> {
    fn clone(&self) -> Self {
        HashedKey::from(self.value.clone())
    }
}

impl<A: PartialEq, S> PartialEq for HashedKey<A, S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<A: Eq, S> Eq for HashedKey<A, S> {}

impl<A: Debug, S> Debug for HashedKey<A, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        Debug::fmt(&self.value, f)
    }
}

impl<A, S> From<A> for HashedKey<A, S> {
    fn from(value: A) -> Self {
        HashedKey {
            value,
            hasher: PhantomData,
        }
    }
}

// Trait object keys

/// Object safe form of [`HamtKey`], for sets holding more than one
/// concrete key type.
///
/// Every `'static` [`HamtKey`] that implements [`Debug`] gets this for
/// free. Two keys of different concrete types are never equal.
pub trait DynKey: Any + Debug {
    /// See [`HamtKey::hash_code`].
    fn dyn_hash(&self) -> u64;

    /// Equality against a key of any type.
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<K: HamtKey + Any + Debug> DynKey for K {
    fn dyn_hash(&self) -> u64 {
        self.hash_code()
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other
            .as_any()
            .downcast_ref::<K>()
            .is_some_and(|other| self.key_eq(other))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl HamtKey for dyn DynKey + Send + Sync {
    #[inline]
    fn hash_code(&self) -> u64 {
        self.dyn_hash()
    }

    #[inline]
    fn key_eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

/// A shared, type erased key.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use cowset::{AnyKey, CowSet, HashedKey, StringKey};
/// let mut set: CowSet<AnyKey> = CowSet::new();
/// set.insert(Arc::new(StringKey::from("7")));
/// set.insert(Arc::new(HashedKey::<i32>::new(7)));
/// assert_eq!(2, set.len());
/// assert!(set.contains(&(Arc::new(HashedKey::<i32>::new(7)) as AnyKey)));
/// ```
pub type AnyKey = Arc<dyn DynKey + Send + Sync>;
