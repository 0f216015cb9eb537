//! Thread-shareable wrapper around a [`DtCache`].
//!
//! The cache itself does no locking. Hosts that drive several synthesis
//! workers against one cache wrap it here; everyone else should own the
//! `DtCache` directly.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{CacheStats, DtCache, DESKTOP_CAPACITY};
use crate::error::Result;

/// Reference-counted, mutex-guarded cache. The lock does not poison.
pub struct SharedDtCache<const N: usize = DESKTOP_CAPACITY>(Arc<Mutex<DtCache<N>>>);

impl<const N: usize> SharedDtCache<N> {
    pub fn new(cache: DtCache<N>) -> Self {
        Self(Arc::new(Mutex::new(cache)))
    }

    pub fn initialize() -> Result<Self> {
        DtCache::initialize().map(Self::new)
    }

    pub fn lookup(&self, fingerprint: u32, tree_id: u16) -> Option<u16> {
        self.0.lock().lookup(fingerprint, tree_id)
    }

    pub fn insert(&self, fingerprint: u32, tree_id: u16, result: u16) {
        self.0.lock().insert(fingerprint, tree_id, result);
    }

    pub fn stats(&self) -> CacheStats {
        self.0.lock().stats()
    }

    /// Run `f` with exclusive access, e.g. for `get_or_insert_with` or `clear`.
    pub fn with<R>(&self, f: impl FnOnce(&mut DtCache<N>) -> R) -> R {
        f(&mut *self.0.lock())
    }
}

impl<const N: usize> Clone for SharedDtCache<N> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<const N: usize> std::fmt::Debug for SharedDtCache<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedDtCache")
            .field("capacity", &N)
            .finish_non_exhaustive()
    }
}
