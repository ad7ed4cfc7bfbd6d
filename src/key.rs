//! Service key types for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Hash of an instance key, distinguishing several registrations of one type.
///
/// The default (unkeyed) registration uses [`ServiceKey::DEFAULT`]. String keys
/// are hashed with a `const fn`, so keys can be declared as constants next to
/// the services they name.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{key, ServiceKey};
///
/// const PRIMARY: ServiceKey = ServiceKey::new("primary");
///
/// assert_eq!(PRIMARY, key("primary"));
/// assert_ne!(PRIMARY, key("secondary"));
/// assert_eq!(ServiceKey::new(""), ServiceKey::DEFAULT);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ServiceKey(u64);

impl ServiceKey {
    /// Key used by unkeyed registrations.
    pub const DEFAULT: ServiceKey = ServiceKey(0);

    /// Hashes a string key with the `h * 31 + byte` polynomial.
    ///
    /// The hash is not collision free: `"Aa"` and `"BB"` map to the same key,
    /// and any string made only of NUL bytes equals [`ServiceKey::DEFAULT`].
    pub const fn new(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0;
        let mut i = 0;
        while i < bytes.len() {
            hash = hash.wrapping_mul(31).wrapping_add(bytes[i] as u64);
            i += 1;
        }
        ServiceKey(hash)
    }

    /// Wraps a precomputed hash.
    pub const fn from_raw(hash: u64) -> Self {
        ServiceKey(hash)
    }

    /// Raw hash value.
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` for the unkeyed default.
    pub const fn is_default(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for ServiceKey {
    fn from(name: &str) -> Self {
        ServiceKey::new(name)
    }
}

/// Shorthand for [`ServiceKey::new`].
pub const fn key(name: &str) -> ServiceKey {
    ServiceKey::new(name)
}

/// Identifies a registration slot: the declared type plus an instance key.
///
/// Equality and hashing only consider the [`TypeId`] and the [`ServiceKey`];
/// the type name is carried for diagnostics.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{key, Key};
///
/// let plain = Key::of::<u32>();
/// let keyed = Key::keyed::<u32>(key("port"));
///
/// assert_eq!(plain.display_name(), "u32");
/// assert!(plain.service_key().is_default());
/// assert_ne!(plain, keyed);
/// assert_eq!(plain.type_id(), keyed.type_id());
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    type_id: TypeId,
    type_name: &'static str,
    service_key: ServiceKey,
}

impl Key {
    /// Key of the unkeyed registration slot for `T`.
    #[inline(always)]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::keyed::<T>(ServiceKey::DEFAULT)
    }

    /// Key of the slot for `T` under `service_key`.
    #[inline(always)]
    pub fn keyed<T: ?Sized + 'static>(service_key: ServiceKey) -> Self {
        Key {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            service_key,
        }
    }

    /// Declared type identity.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Human-readable declared type name.
    #[inline]
    pub fn display_name(&self) -> &'static str {
        self.type_name
    }

    /// Instance key hash.
    #[inline]
    pub fn service_key(&self) -> ServiceKey {
        self.service_key
    }
}

// Hot path: only identity fields take part in comparisons
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.service_key == other.service_key
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.service_key.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.service_key.is_default() {
            write!(f, "Key({})", self.type_name)
        } else {
            write!(f, "Key({} #{:x})", self.type_name, self.service_key.raw())
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Helper for creating unkeyed type keys.
#[inline(always)]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
