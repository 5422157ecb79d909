// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Proptest strategies.
//!
//! These are only available when using the `proptest` feature flag.

use crate::key::HamtKey;
use crate::set::GenericCowSet;
use crate::shared_ptr::SharedPointerKind;
use ::proptest::collection::vec;
use ::proptest::strategy::{BoxedStrategy, Strategy, ValueTree};
use std::fmt::Debug;
use std::iter::FromIterator;
use std::ops::Range;

/// A strategy for a [`GenericCowSet`] of a given size.
///
/// Duplicates drawn from `element` collapse, so sets come out no larger
/// than `size.end - 1`, and draws ending up smaller than `size.start`
/// are rejected.
///
/// # Examples
///
/// ```rust,ignore
/// # use ::proptest::proptest;
/// # use ::proptest::strategy::Strategy;
/// # use cowset::{CowSet, HashedKey};
/// proptest! {
///     #[test]
///     fn proptest_a_set(ref s in cowset::proptest::cow_set::<_, cowset::shared_ptr::DefaultSharedPtr>(
///         (0..9999u32).prop_map(HashedKey::<u32>::new),
///         10..100,
///     )) {
///         assert!(s.len() < 100);
///         assert!(s.len() >= 10);
///     }
/// }
/// ```
pub fn cow_set<A, P>(
    element: A,
    size: Range<usize>,
) -> BoxedStrategy<GenericCowSet<<A::Tree as ValueTree>::Value, P>>
where
    A: Strategy + 'static,
    <A::Tree as ValueTree>::Value: HamtKey + Clone + Debug,
    P: SharedPointerKind + 'static,
{
    vec(element, size.clone())
        .prop_map(GenericCowSet::from_iter)
        .prop_filter("CowSet minimum size".to_owned(), move |s| {
            s.len() >= size.start
        })
        .boxed()
}
