//! Resolver context and the resolution algorithm.

use std::any::type_name;
use std::sync::Arc;
use std::time::Instant;

use crate::cell::DynamicCell;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::injected::Injected;
use crate::instance_cache::InstanceCache;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::{Registration, Registry};
use crate::traits::ResolverCore;

use super::ProviderCore;

/// The resolution view passed to loaders.
///
/// A context pairs the provider's shared state (registry and singleton cache)
/// with the scoped cache of the scope that started the resolution. Loaders use
/// it through [`Resolver`](crate::Resolver) to fetch their dependencies; a
/// scoped dependency resolved that way lands in the same scope as the service
/// being built.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Injected, Resolver, ServiceCollection};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory(|_| Ok(Database { url: "postgres://localhost".to_string() }));
/// services.add_transient_factory(|resolver| {
///     Ok(UserService { db: resolver.get::<Database>()?.into_shared() })
/// });
///
/// let provider = services.build();
/// let users = provider.get_required::<UserService>();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Clone, Copy)]
pub struct ResolverContext<'a> {
    core: &'a ProviderCore,
    scoped: &'a InstanceCache,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(core: &'a ProviderCore, scoped: &'a InstanceCache) -> Self {
        Self { core, scoped }
    }

    /// Registry the context resolves against.
    pub fn registry(&self) -> &'a Registry {
        &self.core.registry
    }

    /// Resolves the most recently added descriptor for `key`.
    pub(crate) fn resolve<T: Send + Sync + 'static>(&self, key: &Key) -> DiResult<Injected<T>> {
        self.observe(key, || {
            let registration = self
                .registry()
                .slot(key)
                .and_then(<[Registration]>::last)
                .ok_or(DiError::NotFound(key.display_name()))?;
            self.produce::<T>(registration)
        })
    }

    /// Resolves every descriptor for `key`, in insertion order.
    ///
    /// Each entry carries its own result, so one failing descriptor does not
    /// hide the others. An unknown key yields an empty list.
    pub(crate) fn resolve_all<T: Send + Sync + 'static>(
        &self,
        key: &Key,
    ) -> Vec<DiResult<Injected<T>>> {
        let slot = self.registry().slot(key).unwrap_or_default();
        slot.iter()
            .map(|registration| self.observe(key, || self.produce::<T>(registration)))
            .collect()
    }

    /// Calls `visit` with the result for each descriptor of `key`, in
    /// insertion order.
    pub(crate) fn visit_all<T, F>(&self, key: &Key, mut visit: F)
    where
        T: Send + Sync + 'static,
        F: FnMut(DiResult<&T>),
    {
        let slot = self.registry().slot(key).unwrap_or_default();
        for registration in slot {
            match self.observe(key, || self.produce::<T>(registration)) {
                Ok(instance) => visit(Ok(&*instance)),
                Err(error) => visit(Err(error)),
            }
        }
    }

    fn observe<T>(&self, key: &Key, resolve: impl FnOnce() -> DiResult<T>) -> DiResult<T> {
        let observers = &self.core.observers;
        let started = observers.has_observers().then(|| {
            observers.resolving(key);
            Instant::now()
        });

        let result = resolve();
        match (&result, started) {
            (Ok(_), Some(started)) => observers.resolved(key, started.elapsed()),
            (Ok(_), None) => {}
            (Err(error), _) => {
                tracing::debug!(service = key.display_name(), %error, "resolution failed");
                observers.failed(key, error);
            }
        }
        result
    }

    /// Applies the lifetime policy of one registration.
    fn produce<T: Send + Sync + 'static>(
        &self,
        registration: &Registration,
    ) -> DiResult<Injected<T>> {
        let descriptor = registration
            .descriptor::<T>()
            .ok_or(DiError::IncompatibleDescriptor(type_name::<T>()))?;

        match descriptor.lifetime() {
            Lifetime::Singleton => self.cached(&self.core.singletons, registration, descriptor),
            Lifetime::Scoped => self.cached(self.scoped, registration, descriptor),
            Lifetime::Transient => self.build(descriptor).map(Injected::Owned),
        }
    }

    fn cached<T: Send + Sync + 'static>(
        &self,
        cache: &InstanceCache,
        registration: &Registration,
        descriptor: &ServiceDescriptor<T>,
    ) -> DiResult<Injected<T>> {
        let id = registration.id();
        let read = |cell: &DynamicCell| {
            cell.cast::<Arc<T>>()
                .cloned()
                .ok_or(DiError::MismatchedType(type_name::<T>()))
        };

        if let Some(hit) = cache.find(id, read) {
            tracing::trace!(service = type_name::<T>(), id = id.get(), "cache hit");
            return hit.map(Injected::Shared);
        }

        tracing::trace!(service = type_name::<T>(), id = id.get(), "cache miss");
        // The loader runs without the cache lock held; it may resolve
        // further services into this same cache.
        cache
            .get_or_try_insert(
                id,
                type_name::<T>(),
                || Ok(DynamicCell::new(Arc::new(self.build(descriptor)?))),
                read,
            )
            .map(Injected::Shared)
    }

    fn build<T: Send + Sync + 'static>(&self, descriptor: &ServiceDescriptor<T>) -> DiResult<T> {
        descriptor
            .load(self)?
            .into_inner::<T>()
            .map_err(|_| DiError::MismatchedType(type_name::<T>()))
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn context(&self) -> ResolverContext<'_> {
        *self
    }
}
