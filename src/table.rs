//! ChainedMap: the table core plus the key-indexed upsert accessor.

use crate::chain::{Chain, Entry, InsertError};
use crate::cursor::{Cursor, Entries};
use crate::guard::ReentryCheck;
use crate::index::bucket_index;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Bucket count used by [`ChainedMap::new`].
const DEFAULT_CAPACITY: usize = 10;

/// Chain length a single bucket may reach before the next insert into it
/// doubles the table. Per-chain trigger: one hot bucket grows the table even
/// when the rest is sparse.
const DEFAULT_CHAIN_LIMIT: usize = 10;

/// Error raised by [`ChainedMap::lookup`] and [`ChainedMap::update`] when
/// the key is absent.
///
/// [`ChainedMap::remove`] and [`ChainedMap::contains_key`] deliberately do
/// not use this: they report absence as `false`. The asymmetry is preserved
/// from the source behavior rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    KeyNotFound,
}

impl core::fmt::Display for LookupError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LookupError::KeyNotFound => f.write_str("key not present"),
        }
    }
}

impl std::error::Error for LookupError {}

/// A separate-chaining hash map: a bucket array of optional chains, entry
/// and used-bucket counts, and doubling growth driven by chain length.
///
/// An absent bucket is `None`; a chain exists only while it holds at least
/// one entry. See the crate docs for the full contract, including the
/// documented update-moves-to-tail and asymmetric-absence quirks.
pub struct ChainedMap<K, V, S = RandomState> {
    hasher: S,
    buckets: Vec<Option<Chain<K, V>>>,
    items: usize,
    used_buckets: usize,
    chain_limit: usize,
    reentry: ReentryCheck,
}

fn fresh_buckets<K, V>(capacity: usize) -> Vec<Option<Chain<K, V>>> {
    (0..capacity).map(|_| None).collect()
}

impl<K, V> ChainedMap<K, V>
where
    K: Eq + Hash,
{
    /// A map with the default capacity (10) and hasher.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// A map with `capacity` buckets. Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// A map with `capacity` buckets and an explicit growth threshold:
    /// a chain passing `chain_limit` entries doubles the table on the
    /// insert that did it. Panics if either argument is zero.
    pub fn with_chain_limit(capacity: usize, chain_limit: usize) -> Self {
        assert!(chain_limit > 0, "chain limit must be positive");
        let mut map = Self::with_capacity(capacity);
        map.chain_limit = chain_limit;
        map
    }
}

impl<K, V> Default for ChainedMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ChainedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// A map with the default capacity and the given hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hasher)
    }

    /// A map with `capacity` buckets and the given hasher. Panics if
    /// `capacity` is zero.
    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        assert!(capacity > 0, "capacity must be positive");
        Self {
            hasher,
            buckets: fresh_buckets(capacity),
            items: 0,
            used_buckets: 0,
            chain_limit: DEFAULT_CHAIN_LIMIT,
            reentry: ReentryCheck::new(),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    /// Number of entries across all chains.
    pub fn len(&self) -> usize {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items == 0
    }

    /// Current capacity of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of buckets currently holding a chain.
    pub fn used_bucket_count(&self) -> usize {
        self.used_buckets
    }

    /// Insert a new key. Fails with [`InsertError::DuplicateKey`] if the key
    /// is already present, leaving the map unchanged.
    ///
    /// If the insert pushes the receiving chain past the chain limit, the
    /// table doubles and redistributes every entry before returning. Growth
    /// is invisible to the caller apart from [`ChainedMap::bucket_count`].
    pub fn insert(&mut self, key: K, value: V) -> Result<(), InsertError> {
        let _g = self.reentry.enter();
        let hash = self.make_hash(&key);
        let idx = bucket_index(hash, self.buckets.len());
        let entry = Entry { key, value, hash };
        match self.buckets[idx].as_mut() {
            Some(chain) => chain.insert_unique(entry)?,
            None => {
                self.buckets[idx] = Some(Chain::with_entry(entry));
                self.used_buckets += 1;
            }
        }
        self.items += 1;

        let overflow = self.buckets[idx]
            .as_ref()
            .map(|chain| chain.len() > self.chain_limit)
            .unwrap_or(false);
        if overflow {
            // The structure is consistent again; release the guard before
            // the rebuild takes `&mut self`.
            drop(_g);
            self.grow();
        }
        Ok(())
    }

    /// Borrow the value stored under `q`, or fail with
    /// [`LookupError::KeyNotFound`].
    pub fn lookup<Q>(&self, q: &Q) -> Result<&V, LookupError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        let hash = self.make_hash(q);
        let idx = bucket_index(hash, self.buckets.len());
        let chain = self.buckets[idx].as_ref().ok_or(LookupError::KeyNotFound)?;
        let pos = chain.find(q).ok_or(LookupError::KeyNotFound)?;
        match chain.get(pos) {
            Some((_key, value)) => Ok(value),
            None => Err(LookupError::KeyNotFound),
        }
    }

    /// Whether `q` is present. Absence is `false`, never an error.
    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        let hash = self.make_hash(q);
        let idx = bucket_index(hash, self.buckets.len());
        self.buckets[idx]
            .as_ref()
            .map(|chain| chain.find(q).is_some())
            .unwrap_or(false)
    }

    /// Replace the value stored under an existing key, or fail with
    /// [`LookupError::KeyNotFound`] without mutating anything.
    ///
    /// Replacement is remove-then-append: the key moves to its chain's
    /// tail, which is visible in traversal order. Counts are unchanged.
    pub fn update(&mut self, key: K, value: V) -> Result<(), LookupError> {
        let _g = self.reentry.enter();
        let hash = self.make_hash(&key);
        let idx = bucket_index(hash, self.buckets.len());
        let chain = self.buckets[idx].as_mut().ok_or(LookupError::KeyNotFound)?;
        let pos = chain.find(&key).ok_or(LookupError::KeyNotFound)?;
        chain.replace_at(pos, Entry { key, value, hash });
        Ok(())
    }

    /// Remove `q` if present. Returns whether an entry was removed; absence
    /// is `false`, never an error.
    ///
    /// A chain emptied by removal reverts to an absent bucket, so the
    /// used-bucket count stays exact.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentry.enter();
        let hash = self.make_hash(q);
        let idx = bucket_index(hash, self.buckets.len());
        let chain = match self.buckets[idx].as_mut() {
            Some(chain) => chain,
            None => return false,
        };
        let pos = match chain.find(q) {
            Some(pos) => pos,
            None => return false,
        };
        chain.remove_at(pos);
        self.items -= 1;
        if chain.is_empty() {
            self.buckets[idx] = None;
            self.used_buckets -= 1;
        }
        true
    }

    /// Key-indexed write accessor: update if present, insert otherwise.
    /// The one mutation path that never reports duplicates or absence.
    pub fn upsert(&mut self, key: K, value: V) {
        // Probes the chain twice (contains, then update/insert): the
        // accessor composes the public operations instead of sharing a
        // chain scan with them.
        if self.contains_key(&key) {
            let _ = self.update(key, value);
        } else {
            let _ = self.insert(key, value);
        }
    }

    /// Reset every bucket to absent and both counts to zero. Capacity is
    /// unchanged.
    pub fn clear(&mut self) {
        let _g = self.reentry.enter();
        for slot in &mut self.buckets {
            *slot = None;
        }
        self.items = 0;
        self.used_buckets = 0;
    }

    /// A fresh single-pass [`Cursor`] over all entries. The cursor borrows
    /// the map, so no mutation can happen while it exists.
    pub fn cursor(&self) -> Cursor<'_, K, V> {
        Cursor::new(&self.buckets)
    }

    /// Iterator over `(&K, &V)` pairs, built on [`ChainedMap::cursor`].
    pub fn iter(&self) -> Entries<'_, K, V> {
        Entries::new(self.cursor())
    }

    /// Double the bucket array and redistribute every entry via its cached
    /// hash. Infallible: all keys are already known-unique. The swap is
    /// atomic from the caller's point of view; only `bucket_count` changes.
    fn grow(&mut self) {
        let doubled = self.buckets.len() * 2;
        let old = core::mem::replace(&mut self.buckets, fresh_buckets(doubled));
        self.items = 0;
        self.used_buckets = 0;
        for chain in old.into_iter().flatten() {
            for entry in chain.into_entries() {
                self.place(entry);
            }
        }
    }

    /// Re-home one entry during growth, keeping counts in step. No overflow
    /// check here: growth never cascades mid-rebuild.
    fn place(&mut self, entry: Entry<K, V>) {
        let idx = bucket_index(entry.hash, self.buckets.len());
        match self.buckets[idx].as_mut() {
            Some(chain) => {
                let res = chain.insert_unique(entry);
                debug_assert!(res.is_ok(), "growth re-inserts only known-unique keys");
            }
            None => {
                self.buckets[idx] = Some(Chain::with_entry(entry));
                self.used_buckets += 1;
            }
        }
        self.items += 1;
    }

    /// Structural invariants, asserted by the in-crate property tests after
    /// every operation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(!self.buckets.is_empty(), "capacity stays positive");
        let total: usize = self
            .buckets
            .iter()
            .flatten()
            .map(|chain| chain.len())
            .sum();
        assert_eq!(self.items, total, "len equals sum of chain lengths");
        let used = self.buckets.iter().filter(|slot| slot.is_some()).count();
        assert_eq!(self.used_buckets, used, "used-bucket count is exact");
        assert!(
            self.buckets.iter().flatten().all(|chain| !chain.is_empty()),
            "an emptied chain reverts to an absent bucket"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    // Forces every key into bucket 0 to make chain behavior observable.
    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: inserts with distinct keys are all retrievable and len
    /// tracks the number of inserts.
    #[test]
    fn insert_then_lookup() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        for i in 0..20 {
            m.insert(format!("k{i}"), i).unwrap();
        }
        assert_eq!(m.len(), 20);
        for i in 0..20 {
            assert_eq!(m.lookup(&format!("k{i}")), Ok(&i));
        }
        m.check_invariants();
    }

    /// Invariant: duplicate insert fails, mutates nothing, and keeps the
    /// original value.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        m.insert("dup".to_string(), 1).unwrap();
        assert_eq!(
            m.insert("dup".to_string(), 2),
            Err(InsertError::DuplicateKey)
        );
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup("dup"), Ok(&1));
        m.check_invariants();
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        m.insert("hello".to_string(), 1).unwrap();
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.lookup("hello"), Ok(&1));
        assert_eq!(m.lookup("world"), Err(LookupError::KeyNotFound));
        assert!(m.remove("hello"));
        assert!(!m.remove("hello"));
    }

    /// Update replaces the value without touching counts and moves the key
    /// to its chain's tail (observable through a constant hasher).
    #[test]
    fn update_replaces_and_moves_to_tail() {
        let mut m: ChainedMap<String, i32, ConstBuildHasher> =
            ChainedMap::with_hasher(ConstBuildHasher);
        for (k, v) in [("a", 1), ("b", 2), ("c", 3)] {
            m.insert(k.to_string(), v).unwrap();
        }
        m.update("a".to_string(), 10).unwrap();

        assert_eq!(m.len(), 3);
        assert_eq!(m.used_bucket_count(), 1);
        assert_eq!(m.lookup("a"), Ok(&10));

        let order: Vec<String> = m.iter().map(|(k, _v)| k.clone()).collect();
        assert_eq!(order, ["b", "c", "a"]);
        m.check_invariants();
    }

    /// update on an absent key fails without mutating anything.
    #[test]
    fn update_absent_key_fails() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        m.insert("a".to_string(), 1).unwrap();
        assert_eq!(
            m.update("missing".to_string(), 9),
            Err(LookupError::KeyNotFound)
        );
        assert_eq!(m.len(), 1);
        m.check_invariants();
    }

    /// Removing a chain's last entry marks its bucket absent again.
    #[test]
    fn remove_reverts_bucket_to_absent() {
        let mut m: ChainedMap<String, i32, ConstBuildHasher> =
            ChainedMap::with_hasher(ConstBuildHasher);
        m.insert("a".to_string(), 1).unwrap();
        m.insert("b".to_string(), 2).unwrap();
        assert_eq!(m.used_bucket_count(), 1);

        assert!(m.remove("a"));
        assert_eq!(m.used_bucket_count(), 1, "chain still holds b");
        assert!(m.remove("b"));
        assert_eq!(m.used_bucket_count(), 0);
        assert_eq!(m.len(), 0);
        m.check_invariants();
    }

    /// Growth doubles the bucket array when one chain passes the limit and
    /// every entry survives with its value.
    #[test]
    fn growth_preserves_entries() {
        let mut m: ChainedMap<String, i32, ConstBuildHasher> =
            ChainedMap::with_hasher(ConstBuildHasher);
        let before = m.bucket_count();
        // Constant hasher: every insert lands in one chain, so the limit
        // is crossed as soon as len passes it.
        for i in 0..(DEFAULT_CHAIN_LIMIT as i32 + 5) {
            m.insert(format!("k{i}"), i).unwrap();
        }
        assert!(m.bucket_count() >= before * 2);
        for i in 0..(DEFAULT_CHAIN_LIMIT as i32 + 5) {
            assert_eq!(m.lookup(&format!("k{i}")), Ok(&i));
        }
        m.check_invariants();
    }

    /// Growth redistributes via the cached hash: a well-distributed hasher
    /// spreads a former single chain across the doubled array.
    #[test]
    fn growth_with_chain_limit_one() {
        let mut m: ChainedMap<String, i32> = ChainedMap::with_chain_limit(1, 1);
        m.insert("A".to_string(), 1).unwrap();
        assert_eq!(m.bucket_count(), 1);
        m.insert("B".to_string(), 2).unwrap();
        // Second insert pushed the only chain past limit 1; exactly one
        // doubling, since growth never cascades mid-rebuild.
        assert_eq!(m.bucket_count(), 2);
        m.insert("C".to_string(), 3).unwrap();

        assert_eq!(m.len(), 3);
        for (k, v) in [("A", 1), ("B", 2), ("C", 3)] {
            assert_eq!(m.lookup(k), Ok(&v));
        }
        m.check_invariants();
    }

    /// upsert inserts absent keys and updates present ones, never erroring.
    #[test]
    fn upsert_inserts_then_updates() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        m.upsert("k".to_string(), 1);
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup("k"), Ok(&1));

        m.upsert("k".to_string(), 2);
        assert_eq!(m.len(), 1);
        assert_eq!(m.lookup("k"), Ok(&2));
        m.check_invariants();
    }

    /// clear empties counts and buckets but keeps capacity.
    #[test]
    fn clear_keeps_capacity() {
        let mut m: ChainedMap<String, i32> = ChainedMap::with_capacity(7);
        for i in 0..5 {
            m.insert(format!("k{i}"), i).unwrap();
        }
        let cap = m.bucket_count();
        m.clear();
        assert_eq!(m.len(), 0);
        assert_eq!(m.used_bucket_count(), 0);
        assert_eq!(m.bucket_count(), cap);
        for i in 0..5 {
            assert!(!m.contains_key(&format!("k{i}")));
        }
        m.check_invariants();

        // The cleared map is fully usable again.
        m.insert("again".to_string(), 42).unwrap();
        assert_eq!(m.lookup("again"), Ok(&42));
    }

    /// iter yields each entry exactly once, matching lookups.
    #[test]
    fn iteration_is_complete_and_duplicate_free() {
        let mut m: ChainedMap<String, i32> = ChainedMap::new();
        for i in 0..30 {
            m.insert(format!("k{i}"), i).unwrap();
        }
        let mut seen = BTreeSet::new();
        for (k, v) in m.iter() {
            assert_eq!(m.lookup(k), Ok(v));
            assert!(seen.insert(k.clone()), "no key is yielded twice");
        }
        assert_eq!(seen.len(), 30);
    }

    #[test]
    #[should_panic(expected = "capacity must be positive")]
    fn zero_capacity_is_rejected() {
        let _ = ChainedMap::<String, i32>::with_capacity(0);
    }
}
