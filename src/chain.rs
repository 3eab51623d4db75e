//! Bucket chains: owned, ordered entry sequences with unique keys.
//!
//! A chain is backed by a `Vec` of entries rather than linked nodes; chains
//! stay short (growth triggers before they pass the chain limit), so an
//! array scan is both simpler and cache-friendlier than pointer chasing.

use core::borrow::Borrow;

/// One owned key/value pair plus its cached hash code.
///
/// The hash is computed once at insertion and reused for every later
/// redistribution, so `K: Hash` is never re-invoked after an entry exists.
#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
}

/// Error raised when inserting a key that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertError {
    DuplicateKey,
}

impl core::fmt::Display for InsertError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InsertError::DuplicateKey => f.write_str("key already present"),
        }
    }
}

impl std::error::Error for InsertError {}

/// An ordered, append-at-tail sequence of entries sharing one bucket.
///
/// Entry order is insertion order, except that a replacement via
/// [`Chain::replace_at`] moves the entry to the tail (remove-then-append).
#[derive(Debug)]
pub(crate) struct Chain<K, V> {
    entries: Vec<Entry<K, V>>,
}

impl<K, V> Chain<K, V> {
    /// A chain springs into existence with its first entry; the map never
    /// allocates an empty chain (an empty bucket is `None`).
    pub(crate) fn with_entry(entry: Entry<K, V>) -> Self {
        Self {
            entries: vec![entry],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the entry whose key equals `q`, if any.
    pub(crate) fn find<Q>(&self, q: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.entries.iter().position(|e| e.key.borrow() == q)
    }

    /// Entry at `pos`, for cursor traversal.
    pub(crate) fn get(&self, pos: usize) -> Option<(&K, &V)> {
        self.entries.get(pos).map(|e| (&e.key, &e.value))
    }

    /// Append `entry` unless its key is already present.
    ///
    /// Scans the whole chain before appending; on a duplicate the chain is
    /// left unmodified and the new entry is discarded with the error.
    pub(crate) fn insert_unique(&mut self, entry: Entry<K, V>) -> Result<(), InsertError>
    where
        K: Eq,
    {
        if self.find(&entry.key).is_some() {
            return Err(InsertError::DuplicateKey);
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace the entry at `pos` with `entry`, moving it to the tail.
    ///
    /// Implemented as remove-then-append, so the key's position in the
    /// chain's order changes. The caller must have located `pos` via
    /// [`Chain::find`]; no re-scan happens here.
    pub(crate) fn replace_at(&mut self, pos: usize, entry: Entry<K, V>) {
        self.entries.remove(pos);
        self.entries.push(entry);
    }

    /// Remove and return the entry at `pos` (located via [`Chain::find`]).
    pub(crate) fn remove_at(&mut self, pos: usize) -> Entry<K, V> {
        self.entries.remove(pos)
    }

    /// Consume the chain, yielding its entries in order. Used by growth to
    /// redistribute entries into a larger bucket array.
    pub(crate) fn into_entries(self) -> impl Iterator<Item = Entry<K, V>> {
        self.entries.into_iter()
    }
}
