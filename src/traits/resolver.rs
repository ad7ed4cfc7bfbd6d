//! Resolver traits for service resolution.

use crate::error::DiResult;
use crate::injected::Injected;
use crate::key::{Key, ServiceKey};
use crate::provider::ResolverContext;

/// Object-safe access to a resolution context.
///
/// Implemented by [`ServiceProvider`](crate::ServiceProvider),
/// [`Scope`](crate::Scope) and [`ResolverContext`]. Wrappers that forward to
/// one of these can implement it and get [`Resolver`] for free.
pub trait ResolverCore {
    /// The registry, singleton cache and scoped cache resolutions go through.
    fn context(&self) -> ResolverContext<'_>;
}

/// Typed resolution API, available on every [`ResolverCore`].
///
/// Singular reads (`get*`) use the most recently added descriptor of a slot.
/// Plural reads (`get_all*`, `for_each*`) walk the whole slot in insertion
/// order and report one result per descriptor; every descriptor gets its own
/// cached instance. Queries (`has*`, `count*`) never fail.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Resolver, ServiceCollection};
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory(|_| Ok(String::from("first")));
/// services.add_singleton_factory(|_| Ok(String::from("second")));
///
/// let provider = services.build();
/// assert_eq!(provider.count::<String>(), 2);
/// assert_eq!(*provider.get_required::<String>(), "second");
///
/// let all: Vec<String> = provider
///     .get_all::<String>()
///     .into_iter()
///     .map(|s| s.unwrap().to_string())
///     .collect();
/// assert_eq!(all, ["first", "second"]);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the unkeyed registration of `T`.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Injected<T>> {
        self.context().resolve::<T>(&Key::of::<T>())
    }

    /// Resolves `T` registered under `service_key`.
    fn get_keyed<T: Send + Sync + 'static>(&self, service_key: ServiceKey) -> DiResult<Injected<T>> {
        self.context().resolve::<T>(&Key::keyed::<T>(service_key))
    }

    /// Resolves `T`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the error message when resolution fails.
    fn get_required<T: Send + Sync + 'static>(&self) -> Injected<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Resolves keyed `T`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics with the error message when resolution fails.
    fn get_keyed_required<T: Send + Sync + 'static>(&self, service_key: ServiceKey) -> Injected<T> {
        self.get_keyed::<T>(service_key)
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    fn has<T: ?Sized + 'static>(&self) -> bool {
        self.context().registry().has(&Key::of::<T>())
    }

    fn has_keyed<T: ?Sized + 'static>(&self, service_key: ServiceKey) -> bool {
        self.context().registry().has(&Key::keyed::<T>(service_key))
    }

    /// Number of unkeyed registrations of `T`.
    fn count<T: ?Sized + 'static>(&self) -> usize {
        self.context().registry().count(&Key::of::<T>())
    }

    fn count_keyed<T: ?Sized + 'static>(&self, service_key: ServiceKey) -> usize {
        self.context().registry().count(&Key::keyed::<T>(service_key))
    }

    /// Number of registrations of `T` under any key.
    fn count_all<T: ?Sized + 'static>(&self) -> usize {
        self.context().registry().count_all(std::any::TypeId::of::<T>())
    }

    /// Resolves every unkeyed registration of `T`, one result per registration.
    fn get_all<T: Send + Sync + 'static>(&self) -> Vec<DiResult<Injected<T>>> {
        self.context().resolve_all::<T>(&Key::of::<T>())
    }

    fn get_all_keyed<T: Send + Sync + 'static>(
        &self,
        service_key: ServiceKey,
    ) -> Vec<DiResult<Injected<T>>> {
        self.context().resolve_all::<T>(&Key::keyed::<T>(service_key))
    }

    /// Calls `f` with the result for every unkeyed registration of `T`.
    ///
    /// A registration that fails to resolve is reported as `Err` and the walk
    /// continues with the next one.
    fn for_each<T, F>(&self, f: F)
    where
        T: Send + Sync + 'static,
        F: FnMut(DiResult<&T>),
    {
        self.context().visit_all::<T, F>(&Key::of::<T>(), f)
    }

    fn for_each_keyed<T, F>(&self, service_key: ServiceKey, f: F)
    where
        T: Send + Sync + 'static,
        F: FnMut(DiResult<&T>),
    {
        self.context().visit_all::<T, F>(&Key::keyed::<T>(service_key), f)
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
