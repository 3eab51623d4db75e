//! Debug-only reentry check.
//!
//! `K: Eq`/`K: Hash` is user code and runs while a chain scan may be
//! mid-mutation. In debug builds, entering a guarded section twice without
//! dropping the first guard panics; release builds compile this to nothing.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map reentry tracker. Guard public entry points with
/// `let _g = self.reentry.enter();`.
#[derive(Debug, Default)]
pub(crate) struct ReentryCheck {
    #[cfg(debug_assertions)]
    armed: Cell<bool>,
    // Keep !Send + !Sync in line with the single-threaded design.
    _nosend: PhantomData<*mut ()>,
}

impl ReentryCheck {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            armed: Cell::new(false),
            _nosend: PhantomData,
        }
    }

    /// Enter a guarded section. Panics in debug builds if already entered.
    #[inline]
    pub(crate) fn enter(&self) -> EntryGuard<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.armed.replace(true),
                "reentry detected: nested call into the map from Eq/Hash"
            );
            return EntryGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            return EntryGuard { _z: PhantomData };
        }
    }
}

/// RAII guard returned by [`ReentryCheck::enter`].
pub(crate) struct EntryGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a ReentryCheck,
    #[cfg(not(debug_assertions))]
    _z: PhantomData<&'a ()>,
}

impl<'a> Drop for EntryGuard<'a> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.armed.set(false);
    }
}
