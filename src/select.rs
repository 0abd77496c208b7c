//! Chunk selection: from a packet seed to the set of source chunks it
//! carries.
//!
//! [`chunk_set`] is the single coupling point between encoder and decoder.
//! Both sides call it with the same `(seed, chunk_count)` pair and must
//! get the same answer, so the derivation is fixed:
//!
//! 1. Open `Distribution::new(seed, K)`. Its first bounded draw `v` gives
//!    the packet degree `d = v + 1`, so `d` is uniform over `[1, K]`.
//! 2. The next raw 32-bit output of the same generator seeds a nested
//!    `Distribution::new(raw, K)`; [`select`] draws `d` indices from it.
//! 3. Draws are used directly, duplicates allowed. An index drawn an even
//!    number of times cancels under XOR and is dropped from the effective
//!    set, which may leave the set empty.

use std::collections::BTreeSet;

use crate::rng::Distribution;

/// Draw `count` raw indices from a bounded stream.
///
/// Direct draws with replacement; the caller reduces duplicates.
pub fn select(count: u32, stream: &mut Distribution) -> Vec<u32> {
    stream.take(count as usize).collect()
}

/// Derive the effective chunk-index set for a packet seed.
///
/// Returns the empty set when `chunk_count` is zero or every draw
/// cancelled pairwise.
pub fn chunk_set(seed: u32, chunk_count: u32) -> BTreeSet<u32> {
    let mut degrees = Distribution::new(seed, chunk_count);
    let Some(first) = degrees.next() else {
        return BTreeSet::new();
    };
    let degree = first + 1;
    let nested_seed = degrees.next_raw();

    let mut indices = Distribution::new(nested_seed, chunk_count);
    let mut set = BTreeSet::new();
    for index in select(degree, &mut indices) {
        // Parity toggle: pairs of equal draws cancel under XOR
        if !set.insert(index) {
            set.remove(&index);
        }
    }
    set
}
