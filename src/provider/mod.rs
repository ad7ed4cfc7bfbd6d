//! Service provider module for dependency injection.
//!
//! This module contains the ServiceProvider type, the scopes derived from it
//! and the context loaders resolve their dependencies through.

use std::fmt;

use crate::config::BuildOptions;
use crate::error::DiResult;
use crate::instance_cache::InstanceCache;
use crate::observer::Observers;
use crate::registration::Registry;
use crate::traits::ResolverCore;
use crate::validation::validate;

pub mod context;
pub mod scope;
pub use context::ResolverContext;
pub use scope::Scope;

/// State shared by a provider and every scope created from it.
///
/// Fields drop in declaration order: cached singletons go before the
/// registry holding their descriptors.
pub(crate) struct ProviderCore {
    pub(crate) singletons: InstanceCache,
    pub(crate) registry: Registry,
    pub(crate) observers: Observers,
}

/// Top-level owner of the registry and the singleton cache.
///
/// A provider is built once from a finished [`Registry`] (usually through
/// [`ServiceCollection::build`](crate::ServiceCollection::build)) and resolves
/// services through its own root scope. Scoped services resolved directly on
/// the provider are cached in that root scope and live as long as the
/// provider.
///
/// Teardown order is fixed: root-scope instances first, then singletons in
/// reverse construction order, then the registry.
///
/// The provider is `Send + Sync`; resolution from several threads is
/// supported. Threads missing on the same singleton wait for a single run of
/// its loader.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Injected, Key, Registry, Resolver, ServiceDescriptor, ServiceProvider};
///
/// struct Config { name: &'static str }
///
/// let mut registry = Registry::new();
/// registry.add(Key::of::<Config>(), ServiceDescriptor::singleton(|_| Ok(Config { name: "app" })));
///
/// let provider = ServiceProvider::new(registry);
/// let a = provider.get_required::<Config>();
/// let b = provider.create_scope().get_required::<Config>();
/// assert!(Injected::ptr_eq(&a, &b));
/// assert_eq!(a.name, "app");
/// ```
pub struct ServiceProvider {
    root: InstanceCache,
    core: ProviderCore,
}

impl ServiceProvider {
    /// Builds a provider with default [`BuildOptions`].
    ///
    /// # Panics
    ///
    /// Panics if declared dependencies form a cycle. Use
    /// [`try_new`](Self::try_new) to handle that as an error.
    pub fn new(registry: Registry) -> Self {
        Self::try_new(registry).unwrap_or_else(|e| panic!("Failed to build provider: {}", e))
    }

    /// Builds a provider with default [`BuildOptions`].
    pub fn try_new(registry: Registry) -> DiResult<Self> {
        Self::with_options(registry, BuildOptions::default())
    }

    /// Builds a provider, running the checks enabled in `options`.
    pub fn with_options(registry: Registry, options: BuildOptions) -> DiResult<Self> {
        Self::from_parts(registry, Observers::new(), options)
    }

    pub(crate) fn from_parts(
        registry: Registry,
        observers: Observers,
        options: BuildOptions,
    ) -> DiResult<Self> {
        if options.validate_dependencies || options.warn_missing_dependencies {
            let report = validate(&registry);
            if options.validate_dependencies {
                report.check()?;
            }
            if options.warn_missing_dependencies {
                report.log_warnings();
            }
        }

        tracing::debug!(
            registrations = registry.len(),
            observers = observers.len(),
            "built service provider"
        );

        Ok(Self {
            root: InstanceCache::new(),
            core: ProviderCore {
                singletons: InstanceCache::new(),
                registry,
                observers,
            },
        })
    }

    /// Creates a new scope with an empty scoped cache.
    ///
    /// The scope shares this provider's registry and singletons.
    pub fn create_scope(&self) -> Scope<'_> {
        Scope::new(&self.core)
    }

    pub fn registry(&self) -> &Registry {
        &self.core.registry
    }

    /// Number of singleton instances built so far.
    pub fn singleton_count(&self) -> usize {
        self.core.singletons.len()
    }

    /// Number of scoped instances cached in the root scope.
    pub fn cached_count(&self) -> usize {
        self.root.len()
    }
}

impl ResolverCore for ServiceProvider {
    fn context(&self) -> ResolverContext<'_> {
        ResolverContext::new(&self.core, &self.root)
    }
}

impl Drop for ServiceProvider {
    fn drop(&mut self) {
        tracing::debug!(
            scoped = self.root.len(),
            singletons = self.core.singletons.len(),
            "dropping service provider"
        );
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registry", &self.core.registry)
            .field("singletons", &self.core.singletons)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
