//! chained-map: a single-threaded hash map built from scratch on separate
//! chaining, with explicit buckets, chain-length-triggered growth, and a
//! stateful traversal cursor.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: build the whole engine — indexing, chains, growth, traversal — in
//!   safe, verifiable layers so each piece can be reasoned about
//!   independently. Nothing is delegated to an existing table type.
//! - Layers:
//!   - index: reduces a 64-bit hash to a bucket index for a given bucket
//!     count. Pure and deterministic.
//!   - Chain<K, V>: an owned, ordered sequence of entries sharing a bucket;
//!     enforces key uniqueness within itself. Backed by a Vec rather than
//!     linked nodes, so chain positions never alias.
//!   - ChainedMap<K, V, S>: owns the bucket array (`Vec<Option<Chain>>`),
//!     the entry and used-bucket counts, and orchestrates insert / lookup /
//!     update / remove / clear plus doubling growth.
//!   - Cursor<'a, K, V>: borrowed, single-pass enumerator walking buckets in
//!     ascending index order and each chain in its stored order.
//!
//! Constraints
//! - Single-threaded: exclusive access is enforced by `&mut self`; there is
//!   no internal locking.
//! - An empty bucket is `None`, never an allocated zero-length chain, so the
//!   used-bucket count stays exact.
//! - Unique keys: duplicate inserts fail with [`InsertError::DuplicateKey`]
//!   and leave the map untouched.
//! - Growth triggers on a single chain's length exceeding a fixed limit
//!   (default 10), not on a global load factor. A hot bucket grows the table
//!   even when the table is otherwise sparse.
//! - Each entry caches its `u64` hash at insertion; growth redistributes via
//!   the cached hash and never re-invokes `K: Hash`.
//!
//! Documented quirks (kept for compatibility, not bugs)
//! - `update`/`upsert` on a present key replace the entry by removing it and
//!   appending the replacement, which moves the key to its chain's tail and
//!   is visible in traversal order.
//! - Absence signaling is asymmetric: [`ChainedMap::remove`] and
//!   [`ChainedMap::contains_key`] report absence as `false`, while
//!   [`ChainedMap::lookup`] and [`ChainedMap::update`] report it as
//!   [`LookupError::KeyNotFound`].
//!
//! Traversal and mutation
//! - A [`Cursor`] (or the [`Entries`] iterator over it) borrows the map for
//!   its whole lifetime, so mutating the map mid-traversal is a compile
//!   error rather than a documented-undefined hazard.
//! - Cursors are single-pass: once `advance` reports exhaustion it stays
//!   exhausted. A fresh traversal is a fresh cursor.
//!
//! Reentrancy
//! - `K: Eq`/`K: Hash` is the only user code that runs while internal state
//!   may be transiently inconsistent. A debug-only guard at each entry point
//!   panics on nested entry; release builds pay nothing.
//!
//! Notes and non-goals
//! - No thread-safety, no persistence, no shrink-on-deletion.
//! - Iteration order is deterministic for a fixed map state but unspecified
//!   across mutations (growth and update both reorder).
//! - Public surface is `ChainedMap`, `Cursor`/`Entries`, and the error
//!   enums; `index`, `chain`, and the guard are implementation details.

mod chain;
mod cursor;
mod guard;
mod index;
mod table;
mod table_proptest;

// Public surface
pub use chain::InsertError;
pub use cursor::{Cursor, CursorError, Entries};
pub use table::{ChainedMap, LookupError};
