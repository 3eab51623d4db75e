//! Stateful traversal cursor over a map's bucket array.
//!
//! The cursor walks buckets in ascending index order and each chain in its
//! stored order, presenting all entries as one logical sequence. It borrows
//! the bucket array for its whole lifetime, so the map cannot be mutated
//! while any cursor over it exists.

use crate::chain::Chain;

/// Error raised by [`Cursor::current`] outside the valid window: before the
/// first successful [`Cursor::advance`], or after exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorError {
    InvalidState,
}

impl core::fmt::Display for CursorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CursorError::InvalidState => f.write_str("cursor has no current entry"),
        }
    }
}

impl std::error::Error for CursorError {}

#[derive(Debug, Clone, Copy)]
enum State {
    /// No bucket selected yet; the next forward scan starts at `next`.
    Seeking { next: usize },
    /// Positioned on entry `pos` of the chain in bucket `bucket`.
    At { bucket: usize, pos: usize },
    /// Past the last entry. Permanent.
    Done,
}

/// A lazy, finite, single-pass enumerator over every entry of a map.
///
/// Call [`Cursor::advance`] to step; while it returns `true`,
/// [`Cursor::current`] yields the entry under the cursor. Once `advance`
/// returns `false` the cursor is exhausted for good; a fresh traversal
/// requires a fresh cursor.
pub struct Cursor<'a, K, V> {
    buckets: &'a [Option<Chain<K, V>>],
    state: State,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub(crate) fn new(buckets: &'a [Option<Chain<K, V>>]) -> Self {
        Self {
            buckets,
            state: State::Seeking { next: 0 },
        }
    }

    /// Step to the next entry. Returns `false` exactly when the sequence is
    /// exhausted, and keeps returning `false` from then on.
    ///
    /// With no bucket selected, scans forward for the first non-absent
    /// bucket and selects its first entry. At the end of a chain, hops to
    /// the next non-absent bucket. Otherwise steps within the chain.
    pub fn advance(&mut self) -> bool {
        match self.state {
            State::Done => false,
            State::Seeking { next } => self.seek(next),
            State::At { bucket, pos } => {
                // The borrow guarantees the bucket is still non-absent;
                // map_or(0) only hedges the impossible.
                let len = self.buckets[bucket].as_ref().map_or(0, Chain::len);
                if pos + 1 < len {
                    self.state = State::At {
                        bucket,
                        pos: pos + 1,
                    };
                    true
                } else {
                    self.seek(bucket + 1)
                }
            }
        }
    }

    fn seek(&mut self, from: usize) -> bool {
        for b in from..self.buckets.len() {
            if self.buckets[b].is_some() {
                self.state = State::At { bucket: b, pos: 0 };
                return true;
            }
        }
        self.state = State::Done;
        false
    }

    /// The entry under the cursor.
    ///
    /// Valid only after a `true`-returning [`Cursor::advance`]; before the
    /// first advance or after exhaustion this fails with
    /// [`CursorError::InvalidState`].
    pub fn current(&self) -> Result<(&'a K, &'a V), CursorError> {
        match self.state {
            State::At { bucket, pos } => self
                .buckets
                .get(bucket)
                .and_then(Option::as_ref)
                .and_then(|chain| chain.get(pos))
                .ok_or(CursorError::InvalidState),
            State::Seeking { .. } | State::Done => Err(CursorError::InvalidState),
        }
    }
}

/// `Iterator` adapter over a [`Cursor`], so traversal composes with `for`
/// loops and iterator combinators.
pub struct Entries<'a, K, V> {
    cursor: Cursor<'a, K, V>,
}

impl<'a, K, V> Entries<'a, K, V> {
    pub(crate) fn new(cursor: Cursor<'a, K, V>) -> Self {
        Self { cursor }
    }
}

impl<'a, K, V> Iterator for Entries<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.advance() {
            self.cursor.current().ok()
        } else {
            None
        }
    }
}
