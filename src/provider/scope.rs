//! Scoped service resolution.

use std::fmt;

use crate::instance_cache::InstanceCache;
use crate::traits::ResolverCore;

use super::{ProviderCore, ResolverContext};

/// A resolution context with its own scoped-lifetime cache.
///
/// A scope borrows the provider it was created from, so it cannot outlive it.
/// Singletons resolved through a scope are shared with the provider and every
/// other scope; scoped services are cached in this scope only and are dropped,
/// newest first, when the scope is dropped. Moving a scope moves its cache
/// along with every instance already in it.
///
/// Dropping the scope releases the scope's own references. An
/// [`Injected::Shared`](crate::Injected::Shared) handle kept by the caller
/// keeps its instance alive past the scope.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Injected, Resolver, ServiceCollection};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// struct RequestId(u32);
///
/// let counter = Arc::new(AtomicU32::new(0));
/// let next = counter.clone();
///
/// let mut services = ServiceCollection::new();
/// services.add_scoped_factory(move |_| Ok(RequestId(next.fetch_add(1, Ordering::SeqCst))));
/// let provider = services.build();
///
/// let scope1 = provider.create_scope();
/// let scope2 = provider.create_scope();
///
/// let a = scope1.get_required::<RequestId>();
/// let b = scope1.get_required::<RequestId>();
/// let c = scope2.get_required::<RequestId>();
///
/// assert!(Injected::ptr_eq(&a, &b));
/// assert!(!Injected::ptr_eq(&a, &c));
/// assert_eq!(counter.load(Ordering::SeqCst), 2);
/// ```
pub struct Scope<'p> {
    core: &'p ProviderCore,
    scoped: InstanceCache,
}

impl<'p> Scope<'p> {
    pub(crate) fn new(core: &'p ProviderCore) -> Self {
        tracing::trace!("creating scope");
        Self {
            core,
            scoped: InstanceCache::new(),
        }
    }

    /// Creates a sibling scope: same provider, fresh scoped cache.
    pub fn create_scope(&self) -> Scope<'p> {
        Scope::new(self.core)
    }

    /// Number of scoped instances cached in this scope.
    pub fn cached_count(&self) -> usize {
        self.scoped.len()
    }
}

impl ResolverCore for Scope<'_> {
    fn context(&self) -> ResolverContext<'_> {
        ResolverContext::new(self.core, &self.scoped)
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        tracing::trace!(cached = self.scoped.len(), "dropping scope");
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("scoped", &self.scoped)
            .finish_non_exhaustive()
    }
}
