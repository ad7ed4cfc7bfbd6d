//! Service descriptors: recipes for producing service instances.

use std::fmt;
use std::marker::PhantomData;

use crate::cell::DynamicCell;
use crate::error::DiResult;
use crate::internal::DependencyList;
use crate::key::{Key, ServiceKey};
use crate::lifetime::Lifetime;
use crate::provider::ResolverContext;
use crate::registration::RegistrationId;

/// Type-erased loader: builds one instance into a [`DynamicCell`].
pub(crate) type Loader =
    Box<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<DynamicCell> + Send + Sync>;

/// Recipe for producing instances of `T`.
///
/// A descriptor carries the lifetime, the keys it declares as dependencies and
/// the loader that builds the value. Loaders receive the resolving
/// [`ResolverContext`] and may resolve their own dependencies through it.
///
/// Declared dependencies are what the provider checks for cycles when it is
/// built; a loader that resolves keys it did not declare is not checked.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Lifetime, Resolver, ServiceCollection, ServiceDescriptor};
///
/// struct Config { port: u16 }
/// struct Server { port: u16 }
///
/// let mut services = ServiceCollection::new();
/// services.add(ServiceDescriptor::singleton(|_| Ok(Config { port: 8080 })));
/// services.add(
///     ServiceDescriptor::transient(|r| Ok(Server { port: r.get::<Config>()?.port }))
///         .depends_on::<Config>(),
/// );
///
/// let provider = services.build();
/// assert_eq!(provider.get_required::<Server>().port, 8080);
/// ```
pub struct ServiceDescriptor<T> {
    lifetime: Lifetime,
    dependencies: DependencyList,
    loader: Loader,
    _value: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ServiceDescriptor<T> {
    /// Creates a descriptor from a typed factory.
    pub fn new<F>(lifetime: Lifetime, factory: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::from_loader(lifetime, move |ctx| factory(ctx).map(DynamicCell::new))
    }

    /// Singleton descriptor from a typed factory.
    pub fn singleton<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Singleton, factory)
    }

    /// Scoped descriptor from a typed factory.
    pub fn scoped<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Scoped, factory)
    }

    /// Transient descriptor from a typed factory.
    pub fn transient<F>(factory: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Self::new(Lifetime::Transient, factory)
    }

    /// Descriptor whose factory builds an implementation `I` converted into `T`.
    ///
    /// ```rust
    /// use cellar_di::{Lifetime, Resolver, ServiceCollection, ServiceDescriptor};
    ///
    /// trait Camera: Send + Sync { fn projection(&self) -> i32; }
    /// struct Perspective;
    /// impl Camera for Perspective { fn projection(&self) -> i32 { 1 } }
    /// impl From<Perspective> for Box<dyn Camera> {
    ///     fn from(camera: Perspective) -> Self { Box::new(camera) }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.add(ServiceDescriptor::<Box<dyn Camera>>::implemented_by(
    ///     Lifetime::Transient,
    ///     |_| Ok(Perspective),
    /// ));
    ///
    /// let provider = services.build();
    /// assert_eq!(provider.get_required::<Box<dyn Camera>>().projection(), 1);
    /// ```
    pub fn implemented_by<I, F>(lifetime: Lifetime, factory: F) -> Self
    where
        I: Into<T>,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<I> + Send + Sync + 'static,
    {
        Self::new(lifetime, move |ctx| factory(ctx).map(Into::into))
    }

    /// Creates a descriptor from a raw loader that produces a [`DynamicCell`].
    ///
    /// The cell must hold a `T`; anything else is reported as
    /// [`DiError::MismatchedType`](crate::DiError::MismatchedType) when resolved.
    pub fn from_loader<F>(lifetime: Lifetime, loader: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<DynamicCell> + Send + Sync + 'static,
    {
        Self {
            lifetime,
            dependencies: DependencyList::new(),
            loader: Box::new(loader),
            _value: PhantomData,
        }
    }
}

impl<T> ServiceDescriptor<T> {
    /// Declares a dependency on the unkeyed registration of `U`.
    pub fn depends_on<U: ?Sized + 'static>(self) -> Self {
        self.with_dependency(Key::of::<U>())
    }

    /// Declares a dependency on `U` registered under `service_key`.
    pub fn depends_on_keyed<U: ?Sized + 'static>(self, service_key: ServiceKey) -> Self {
        self.with_dependency(Key::keyed::<U>(service_key))
    }

    /// Declares a dependency on an arbitrary key.
    pub fn with_dependency(mut self, key: Key) -> Self {
        self.dependencies.push(key);
        self
    }

    /// Lifetime policy of produced instances.
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Declared dependency keys, in declaration order.
    pub fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }

    /// Name of the value type this descriptor produces.
    pub fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    /// Runs the loader.
    pub fn load(&self, ctx: &ResolverContext<'_>) -> DiResult<DynamicCell> {
        (self.loader)(ctx)
    }

    pub(crate) fn declared_dependencies(&self) -> DependencyList {
        self.dependencies.clone()
    }
}

impl<T> fmt::Debug for ServiceDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("value_type", &self.value_type_name())
            .field("lifetime", &self.lifetime)
            .field("dependencies", &self.dependencies())
            .finish_non_exhaustive()
    }
}

/// Read-only view of a registration, for introspection and diagnostics.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{key, Lifetime, ServiceCollection};
///
/// struct Database;
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory(|_| Ok(Database));
/// services.add_keyed_transient_factory(key("port"), |_| Ok(8080u16));
///
/// let descriptors = services.get_service_descriptors();
/// let db = descriptors.iter().find(|d| d.type_name().contains("Database")).unwrap();
/// assert_eq!(db.lifetime, Lifetime::Singleton);
/// assert!(!db.is_keyed());
///
/// let port = descriptors.iter().find(|d| d.is_keyed()).unwrap();
/// assert_eq!(port.type_name(), "u16");
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorInfo {
    /// Registration slot key
    pub key: Key,
    /// Registration identity within the registry
    pub id: RegistrationId,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Value type produced by the loader
    pub value_type_name: &'static str,
    /// Declared dependency keys
    pub dependencies: Vec<Key>,
}

impl DescriptorInfo {
    /// Declared type name of the slot.
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Returns `true` when registered under a non-default [`ServiceKey`].
    pub fn is_keyed(&self) -> bool {
        !self.key.service_key().is_default()
    }
}
