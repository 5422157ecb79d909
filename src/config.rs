// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// The level size of the trie, in bits.
/// Branching factor is 2 ^ BITS_PER_LEVEL.
pub(crate) const BITS_PER_LEVEL: usize = 6;

/// Number of slots in a node, one per possible chunk value.
pub const VALUES_PER_LEVEL: usize = 1 << BITS_PER_LEVEL;

/// The deepest level of the trie.
///
/// At this depth only `64 % BITS_PER_LEVEL` bits of the hash remain,
/// and past it two distinct keys can only be told apart by equality.
pub const MAX_DEPTH: usize = 64 / BITS_PER_LEVEL;

/// Capacity of a sparse node's packed array.
// A fifth occupied slot upgrades the node to dense.
pub(crate) const SPARSE_WIDTH: usize = 4;
