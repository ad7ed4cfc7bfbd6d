//! Append-only cache of constructed instances.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::cell::DynamicCell;
use crate::error::{DiError, DiResult};
use crate::internal::{lock, FastMap, Mutex};
use crate::registration::RegistrationId;

#[derive(Default)]
struct Entries {
    index: FastMap<RegistrationId, usize>,
    cells: Vec<(RegistrationId, DynamicCell)>,
    building: FastMap<RegistrationId, Arc<BuildGate>>,
}

/// Serializes construction of one entry.
#[derive(Default)]
struct BuildGate {
    turn: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

/// Clears the gate owner when construction ends, including by unwinding.
struct OwnerGuard<'g>(&'g BuildGate);

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        *lock(&self.0.owner) = None;
    }
}

/// Memoized instances keyed by registration identity.
///
/// Entries are never replaced once inserted and are dropped together with the
/// cache, newest first, so an instance always outlives the instances that were
/// built from it. The ordering covers the references the cache holds. The
/// resolver stores instances as `Arc<T>`, so a handle a caller keeps past the
/// cache keeps its instance alive after teardown.
///
/// The internal lock is only held for lookups and inserts; loaders run outside
/// of it. [`get_or_try_insert`](Self::get_or_try_insert) additionally admits a
/// single builder per entry, so concurrent misses on a cold entry run its
/// loader once.
#[derive(Default)]
pub struct InstanceCache {
    entries: Mutex<Entries>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the entry for `id` and maps it with `read`.
    pub fn find<R>(&self, id: RegistrationId, read: impl FnOnce(&DynamicCell) -> R) -> Option<R> {
        let entries = lock(&self.entries);
        let slot = *entries.index.get(&id)?;
        Some(read(&entries.cells[slot].1))
    }

    /// Inserts `cell` under `id` unless an entry already exists, then maps the
    /// stored entry with `read`.
    ///
    /// When an entry exists, `cell` is discarded and `read` sees the existing one.
    pub fn emplace<R>(
        &self,
        id: RegistrationId,
        cell: DynamicCell,
        read: impl FnOnce(&DynamicCell) -> R,
    ) -> R {
        let mut entries = lock(&self.entries);
        let (result, rejected) = match entries.index.get(&id).copied() {
            Some(slot) => (read(&entries.cells[slot].1), Some(cell)),
            None => {
                let slot = entries.cells.len();
                entries.index.insert(id, slot);
                entries.cells.push((id, cell));
                entries.building.remove(&id);
                (read(&entries.cells[slot].1), None)
            }
        };
        drop(entries);

        if rejected.is_some() {
            tracing::trace!(id = id.get(), "instance already cached, dropping duplicate");
        }
        result
    }

    /// Returns the entry for `id`, building it with `init` on a miss.
    ///
    /// Threads missing on the same entry wait for one builder and then read
    /// its result. A failed build caches nothing and lets the next caller
    /// retry. Re-entering the build of an entry from its own loader fails with
    /// [`DiError::Circular`] naming `service`.
    pub fn get_or_try_insert<R>(
        &self,
        id: RegistrationId,
        service: &'static str,
        init: impl FnOnce() -> DiResult<DynamicCell>,
        read: impl Fn(&DynamicCell) -> DiResult<R>,
    ) -> DiResult<R> {
        let gate = {
            let mut entries = lock(&self.entries);
            if let Some(&slot) = entries.index.get(&id) {
                return read(&entries.cells[slot].1);
            }
            Arc::clone(entries.building.entry(id).or_default())
        };

        let me = thread::current().id();
        if *lock(&gate.owner) == Some(me) {
            return Err(DiError::Circular(vec![service, service]));
        }

        let _turn = lock(&gate.turn);
        if let Some(hit) = self.find(id, &read) {
            tracing::trace!(service, id = id.get(), "built by another thread");
            return hit;
        }

        *lock(&gate.owner) = Some(me);
        let owner = OwnerGuard(&gate);
        let cell = init();
        drop(owner);

        self.emplace(id, cell?, &read)
    }

    pub fn contains(&self, id: RegistrationId) -> bool {
        lock(&self.entries).index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for InstanceCache {
    fn drop(&mut self) {
        let mut cells = {
            let mut entries = lock(&self.entries);
            entries.index.clear();
            std::mem::take(&mut entries.cells)
        };
        if !cells.is_empty() {
            tracing::trace!(count = cells.len(), "dropping cached instances");
        }
        while let Some((_, cell)) = cells.pop() {
            drop(cell);
        }
    }
}

impl fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = lock(&self.entries);
        f.debug_map()
            .entries(entries.cells.iter().map(|(id, cell)| (id, cell.type_name())))
            .finish()
    }
}
