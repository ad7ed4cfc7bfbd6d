//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior
///
/// # Lifetime Characteristics
///
/// - **Singleton**: cached in the provider, shared by every scope
/// - **Scoped**: cached in the scope that first resolved it
/// - **Transient**: never cached, ownership goes to the caller
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Injected, Lifetime, Resolver, ServiceCollection};
///
/// struct Database { url: String }
/// struct Repository { db_url: String }
/// struct RequestModel { id: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory(|_| Ok(Database { url: "postgres://localhost".to_string() }));
/// services.add_scoped_factory(|r| {
///     let db = r.get::<Database>()?;
///     Ok(Repository { db_url: db.url.clone() })
/// });
/// services.add_transient_factory(|_| Ok(RequestModel { id: 12345 }));
///
/// let provider = services.build();
///
/// // Singleton: same instance across scopes
/// let db1 = provider.get_required::<Database>();
/// let scope1 = provider.create_scope();
/// let db2 = scope1.get_required::<Database>();
/// assert!(Injected::ptr_eq(&db1, &db2));
///
/// // Scoped: same within a scope, different across scopes
/// let repo1a = scope1.get_required::<Repository>();
/// let repo1b = scope1.get_required::<Repository>();
/// assert!(Injected::ptr_eq(&repo1a, &repo1b));
///
/// let scope2 = provider.create_scope();
/// let repo2 = scope2.get_required::<Repository>();
/// assert!(!Injected::ptr_eq(&repo1a, &repo2));
///
/// // Transient: owned by the caller
/// let model = scope1.get_required::<RequestModel>();
/// assert!(!model.is_shared());
/// assert_eq!(model.id, 12345);
/// assert_eq!(Lifetime::Scoped.as_str(), "scoped");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// Single instance per provider, cached until the provider is dropped
    Singleton,
    /// Single instance per scope, cached until the scope is dropped
    Scoped,
    /// New instance per resolution, never cached
    Transient,
}

impl Lifetime {
    /// Lower-case name of the lifetime.
    pub const fn as_str(self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Scoped => "scoped",
            Lifetime::Transient => "transient",
        }
    }

    /// Returns `true` for lifetimes whose instances live in an instance cache.
    pub const fn is_cached(self) -> bool {
        !matches!(self, Lifetime::Transient)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
