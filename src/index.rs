//! Bucket indexing: hash-to-bucket reduction.
//!
//! Hashing itself happens at the map layer through `S: BuildHasher`
//! (`hash_one`); this module only turns the resulting code into an index.
//! Hash codes are unsigned here, so no sign normalization is needed before
//! the modulo step (sources that produce signed codes must take the absolute
//! value first to avoid negative indices).

/// Reduce a hash code to an index in `[0, buckets)`.
///
/// Pure and deterministic: a fixed `(hash, buckets)` always yields the same
/// index. `buckets` must be non-zero, which the map guarantees (capacity is
/// positive at all times and growth only doubles it).
#[inline]
pub(crate) fn bucket_index(hash: u64, buckets: usize) -> usize {
    debug_assert!(buckets > 0, "bucket array must be non-empty");
    (hash % buckets as u64) as usize
}
