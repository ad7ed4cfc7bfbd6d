//! Feature-selected primitives shared by the registry and the instance caches.

#[cfg(feature = "parking-lot")]
pub(crate) use parking_lot::{Mutex, MutexGuard};

#[cfg(not(feature = "parking-lot"))]
pub(crate) use std::sync::{Mutex, MutexGuard};

/// Hash map used for registry slots and cache indices.
#[cfg(feature = "ahash")]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

#[cfg(not(feature = "ahash"))]
pub(crate) type FastMap<K, V> = std::collections::HashMap<K, V>;

/// Declared dependency keys of one descriptor. Most services declare only a few.
#[cfg(feature = "smallvec")]
pub(crate) type DependencyList = smallvec::SmallVec<[crate::Key; 4]>;

#[cfg(not(feature = "smallvec"))]
pub(crate) type DependencyList = Vec<crate::Key>;

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// A panicking loader never leaves a half-written cache entry behind, so
/// poisoning carries no broken invariant here.
#[cfg(feature = "parking-lot")]
#[inline(always)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock()
}

#[cfg(not(feature = "parking-lot"))]
#[inline(always)]
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
