//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type used to register services
//! and build a [`ServiceProvider`] from them.

use std::any::TypeId;
use std::sync::Arc;

use crate::config::BuildOptions;
use crate::descriptors::{DescriptorInfo, ServiceDescriptor};
use crate::error::DiResult;
use crate::key::{Key, ServiceKey};
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::{ResolverContext, ServiceProvider};
use crate::registration::Registry;

/// Registration side of the container.
///
/// Every `add*` call appends a descriptor to the slot of its key, so a type can
/// be registered several times: the last registration answers singular reads
/// and all of them answer plural reads. `emplace*` only registers into an
/// unused slot.
///
/// Factories return [`DiResult`] so a missing dependency short-circuits the
/// factory with `?`.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{key, Resolver, ServiceCollection};
///
/// struct UserRepository { url: String }
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_singleton(String::from("postgres://primary"))
///     .add_keyed_singleton_factory(key("replica"), |_| Ok(String::from("postgres://replica")))
///     .add_scoped_factory(|r| Ok(UserRepository { url: r.get::<String>()?.clone() }));
///
/// let provider = services.build();
/// let scope = provider.create_scope();
/// assert_eq!(scope.get_required::<UserRepository>().url, "postgres://primary");
/// assert_eq!(*scope.get_keyed_required::<String>(key("replica")), "postgres://replica");
/// assert_eq!(provider.count_all::<String>(), 2);
/// ```
pub struct ServiceCollection {
    registry: Registry,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            observers: Observers::new(),
        }
    }

    /// Wraps an existing registry.
    pub fn from_registry(registry: Registry) -> Self {
        Self {
            registry,
            observers: Observers::new(),
        }
    }

    // ----- Descriptor registrations -----

    /// Appends `descriptor` under the unkeyed slot of `T`.
    pub fn add<T: Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor<T>) -> &mut Self {
        self.registry.add(Key::of::<T>(), descriptor);
        self
    }

    /// Appends `descriptor` under `service_key`.
    pub fn add_keyed<T: Send + Sync + 'static>(
        &mut self,
        service_key: ServiceKey,
        descriptor: ServiceDescriptor<T>,
    ) -> &mut Self {
        self.registry.add(Key::keyed::<T>(service_key), descriptor);
        self
    }

    /// Registers `descriptor` unless `T` is already registered.
    ///
    /// Returns `true` if the descriptor was added.
    ///
    /// ```rust
    /// use cellar_di::{Resolver, ServiceCollection, ServiceDescriptor};
    ///
    /// let mut services = ServiceCollection::new();
    /// assert!(services.emplace(ServiceDescriptor::singleton(|_| Ok(1u8))));
    /// assert!(!services.emplace(ServiceDescriptor::singleton(|_| Ok(2u8))));
    ///
    /// assert_eq!(*services.build().get_required::<u8>(), 1);
    /// ```
    pub fn emplace<T: Send + Sync + 'static>(&mut self, descriptor: ServiceDescriptor<T>) -> bool {
        self.registry.emplace(Key::of::<T>(), descriptor)
    }

    pub fn emplace_keyed<T: Send + Sync + 'static>(
        &mut self,
        service_key: ServiceKey,
        descriptor: ServiceDescriptor<T>,
    ) -> bool {
        self.registry.emplace(Key::keyed::<T>(service_key), descriptor)
    }

    /// Registers `T` implemented by `I`: the factory builds an `I` that is
    /// converted into `T`.
    ///
    /// ```rust
    /// use cellar_di::{Lifetime, Resolver, ServiceCollection};
    ///
    /// trait Greeter: Send + Sync { fn greet(&self) -> String; }
    /// struct English;
    /// impl Greeter for English { fn greet(&self) -> String { "hello".into() } }
    /// impl From<English> for Box<dyn Greeter> {
    ///     fn from(greeter: English) -> Self { Box::new(greeter) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add_impl::<Box<dyn Greeter>, _, _>(Lifetime::Singleton, |_| Ok(English));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Box<dyn Greeter>>().greet(), "hello");
    /// ```
    pub fn add_impl<T, I, F>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        I: Into<T>,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<I> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::<T>::implemented_by(lifetime, factory))
    }

    pub fn add_impl_keyed<T, I, F>(
        &mut self,
        service_key: ServiceKey,
        lifetime: Lifetime,
        factory: F,
    ) -> &mut Self
    where
        T: Send + Sync + 'static,
        I: Into<T>,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<I> + Send + Sync + 'static,
    {
        self.add_keyed(service_key, ServiceDescriptor::<T>::implemented_by(lifetime, factory))
    }

    // ----- Factory registrations -----

    /// Registers a singleton built from a clone of `value` on first use.
    pub fn add_singleton<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add(ServiceDescriptor::singleton(move |_| Ok(value.clone())))
    }

    /// Registers a singleton factory, called at most once per provider.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::singleton(factory))
    }

    /// Registers a scoped factory, called at most once per scope.
    pub fn add_scoped_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::scoped(factory))
    }

    /// Registers a transient factory, called on every resolution.
    pub fn add_transient_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::transient(factory))
    }

    pub fn add_keyed_singleton_factory<T, F>(&mut self, service_key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_keyed(service_key, ServiceDescriptor::singleton(factory))
    }

    pub fn add_keyed_scoped_factory<T, F>(&mut self, service_key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_keyed(service_key, ServiceDescriptor::scoped(factory))
    }

    pub fn add_keyed_transient_factory<T, F>(&mut self, service_key: ServiceKey, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        self.add_keyed(service_key, ServiceDescriptor::transient(factory))
    }

    // ----- Queries and removal -----

    pub fn has<T: ?Sized + 'static>(&self) -> bool {
        self.registry.has(&Key::of::<T>())
    }

    pub fn has_keyed<T: ?Sized + 'static>(&self, service_key: ServiceKey) -> bool {
        self.registry.has(&Key::keyed::<T>(service_key))
    }

    pub fn count<T: ?Sized + 'static>(&self) -> usize {
        self.registry.count(&Key::of::<T>())
    }

    pub fn count_keyed<T: ?Sized + 'static>(&self, service_key: ServiceKey) -> usize {
        self.registry.count(&Key::keyed::<T>(service_key))
    }

    /// Registrations of `T` under any key.
    pub fn count_all<T: ?Sized + 'static>(&self) -> usize {
        self.registry.count_all(TypeId::of::<T>())
    }

    /// Removes the unkeyed registrations of `T`.
    pub fn clear<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.registry.clear(&Key::of::<T>());
        self
    }

    pub fn clear_keyed<T: ?Sized + 'static>(&mut self, service_key: ServiceKey) -> &mut Self {
        self.registry.clear(&Key::keyed::<T>(service_key));
        self
    }

    /// Removes every registration of `T`, keyed or not.
    pub fn clear_all<T: ?Sized + 'static>(&mut self) -> &mut Self {
        self.registry.clear_all(TypeId::of::<T>());
        self
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Introspection view of every registration, slot by slot.
    pub fn get_service_descriptors(&self) -> Vec<DescriptorInfo> {
        self.registry.descriptors()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Consumes the collection, keeping only its registry.
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    // ----- Observation -----

    /// Attaches an observer to the provider built from this collection.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    // ----- Building -----

    /// Builds the provider with default [`BuildOptions`].
    ///
    /// # Panics
    ///
    /// Panics if declared dependencies form a cycle.
    ///
    /// ```rust,should_panic
    /// use cellar_di::{ServiceCollection, ServiceDescriptor};
    ///
    /// struct A;
    /// struct B;
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add(ServiceDescriptor::singleton(|_| Ok(A)).depends_on::<B>());
    /// services.add(ServiceDescriptor::singleton(|_| Ok(B)).depends_on::<A>());
    /// services.build();
    /// ```
    pub fn build(self) -> ServiceProvider {
        self.try_build()
            .unwrap_or_else(|e| panic!("Failed to build provider: {}", e))
    }

    /// Builds the provider with default [`BuildOptions`].
    pub fn try_build(self) -> DiResult<ServiceProvider> {
        self.try_build_with(BuildOptions::default())
    }

    /// Builds the provider with `options`.
    ///
    /// # Panics
    ///
    /// Panics if dependency validation is enabled and finds a cycle.
    pub fn build_with(self, options: BuildOptions) -> ServiceProvider {
        self.try_build_with(options)
            .unwrap_or_else(|e| panic!("Failed to build provider: {}", e))
    }

    pub fn try_build_with(self, options: BuildOptions) -> DiResult<ServiceProvider> {
        ServiceProvider::from_parts(self.registry, self.observers, options)
    }
}

impl Default for ServiceCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Registry> for ServiceCollection {
    fn from(registry: Registry) -> Self {
        Self::from_registry(registry)
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registry", &self.registry)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key;

    #[test]
    fn counts_track_registrations() {
        let mut services = ServiceCollection::new();
        services
            .add_singleton_factory(|_| Ok(1u32))
            .add_transient_factory(|_| Ok(2u32))
            .add_keyed_scoped_factory(key("k"), |_| Ok(3u32));

        assert!(services.has::<u32>());
        assert!(services.has_keyed::<u32>(key("k")));
        assert_eq!(services.count::<u32>(), 2);
        assert_eq!(services.count_keyed::<u32>(key("k")), 1);
        assert_eq!(services.count_all::<u32>(), 3);
        assert_eq!(services.len(), 3);
    }

    #[test]
    fn clear_variants_remove_expected_slots() {
        let mut services = ServiceCollection::new();
        services
            .add_singleton_factory(|_| Ok(1u32))
            .add_keyed_singleton_factory(key("a"), |_| Ok(2u32))
            .add_keyed_singleton_factory(key("b"), |_| Ok(3u32));

        services.clear::<u32>();
        assert!(!services.has::<u32>());
        assert_eq!(services.count_all::<u32>(), 2);

        services.clear_keyed::<u32>(key("a"));
        assert_eq!(services.count_all::<u32>(), 1);

        services.clear_all::<u32>();
        assert!(services.is_empty());
    }

    #[test]
    fn descriptors_are_listed_in_registration_order() {
        let mut services = ServiceCollection::new();
        services
            .add_singleton_factory(|_| Ok(1u8))
            .add_scoped_factory(|_| Ok(1u16))
            .add_transient_factory(|_| Ok(1u32));

        let lifetimes: Vec<_> = services
            .get_service_descriptors()
            .iter()
            .map(|d| d.lifetime)
            .collect();
        assert_eq!(
            lifetimes,
            vec![Lifetime::Singleton, Lifetime::Scoped, Lifetime::Transient]
        );
    }

    #[test]
    fn into_registry_keeps_registrations() {
        let mut services = ServiceCollection::new();
        services.add_singleton(5u64);
        let registry = services.into_registry();
        assert_eq!(registry.count(&Key::of::<u64>()), 1);
    }
}
