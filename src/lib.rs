//! # cellar-di
//!
//! Lifetime-scoped dependency injection built on a move-only, type-erased value cell.
//!
//! ## Features
//!
//! - **Lifetimes**: Singleton, Scoped, and Transient services
//! - **Multi-registration**: several descriptors per key; singular reads use the
//!   last one, plural reads see all of them
//! - **Keyed services**: several independent slots per type, selected by [`ServiceKey`]
//! - **Ordered teardown**: cached instances are dropped newest first
//! - **Build-time cycle detection** over declared dependencies
//! - **Small-value storage**: [`DynamicCell`] keeps small payloads inline
//!
//! ## Quick Start
//!
//! ```rust
//! use cellar_di::{Resolver, ServiceCollection};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_factory(|_| {
//!     Ok(Database { connection_string: "postgres://localhost".to_string() })
//! });
//! services.add_transient_factory(|resolver| {
//!     Ok(UserService { db: resolver.get::<Database>()?.into_shared() })
//! });
//!
//! let provider = services.build();
//! let user_service = provider.get_required::<UserService>();
//! assert_eq!(user_service.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Service Lifetimes
//!
//! - **Singleton**: created once per provider and shared by every scope
//! - **Scoped**: created once per scope; the provider itself acts as a root scope
//! - **Transient**: created on every resolution and handed to the caller as an owned value
//!
//! ## Multiple Registrations
//!
//! ```rust
//! use cellar_di::{Injected, Resolver, ServiceCollection};
//!
//! struct Camera { projection: u8 }
//!
//! let mut services = ServiceCollection::new();
//! services.add_singleton_factory(|_| Ok(Camera { projection: 1 }));
//! services.add_singleton_factory(|_| Ok(Camera { projection: 2 }));
//!
//! let provider = services.build();
//! assert_eq!(provider.count::<Camera>(), 2);
//! assert_eq!(provider.get_required::<Camera>().projection, 2);
//!
//! let mut projections = Vec::new();
//! provider.for_each::<Camera, _>(|camera| projections.push(camera.unwrap().projection));
//! assert_eq!(projections, [1, 2]);
//! ```
//!
//! ## Error Handling
//!
//! Resolution returns [`DiResult`]. Factories propagate dependency failures
//! with `?`, so the first failure along a dependency chain reaches the caller
//! and nothing is cached for the services that failed.
//!
//! ```rust
//! use cellar_di::{DiError, Resolver, ServiceCollection, ServiceDescriptor};
//!
//! struct Missing;
//! struct Service;
//!
//! let mut services = ServiceCollection::new();
//! services.add(
//!     ServiceDescriptor::singleton(|r| {
//!         r.get::<Missing>()?;
//!         Ok(Service)
//!     })
//!     .depends_on::<Missing>(),
//! );
//!
//! let provider = services.build();
//! assert!(provider.has::<Service>());
//! assert!(matches!(provider.get::<Service>(), Err(DiError::NotFound(_))));
//! assert_eq!(provider.singleton_count(), 0);
//! ```

pub mod cell;
pub mod collection;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod injected;
pub mod instance_cache;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod registration;
pub mod traits;
pub mod validation;

mod internal;

pub use cell::{CellStrategy, DynamicCell, INLINE_ALIGN, INLINE_CAPACITY};
pub use collection::ServiceCollection;
pub use config::BuildOptions;
pub use descriptors::{DescriptorInfo, ServiceDescriptor};
pub use error::{DiError, DiResult};
pub use injected::Injected;
pub use instance_cache::InstanceCache;
pub use key::{key, key_of_type, Key, ServiceKey};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, TracingObserver};
pub use provider::{ResolverContext, Scope, ServiceProvider};
pub use registration::{Registration, RegistrationId, Registry};
pub use traits::{Resolver, ResolverCore};
pub use validation::{validate, ValidationReport};
