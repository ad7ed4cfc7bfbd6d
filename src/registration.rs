//! Service registration types.

use std::any::TypeId;
use std::fmt;

use crate::cell::DynamicCell;
use crate::descriptors::{DescriptorInfo, ServiceDescriptor};
use crate::internal::{DependencyList, FastMap};
use crate::key::Key;
use crate::lifetime::Lifetime;

/// Identity of one registration within its registry.
///
/// Ids are handed out in increasing order and never reused, so instance
/// caches can key entries by registration rather than by [`Key`]: every
/// descriptor in a multi-registration slot gets its own cached instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl RegistrationId {
    /// Raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One descriptor stored in a registration slot.
///
/// The typed [`ServiceDescriptor`] is kept type-erased in a [`DynamicCell`];
/// the lifetime and dependency list are copied out at registration so that
/// validation and diagnostics never need the value type.
pub struct Registration {
    id: RegistrationId,
    lifetime: Lifetime,
    dependencies: DependencyList,
    value_type_name: &'static str,
    descriptor: DynamicCell,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn dependencies(&self) -> &[Key] {
        &self.dependencies
    }

    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Reinterprets the stored descriptor as producing `T`.
    ///
    /// Returns `None` when the registration was added with a different value type.
    pub fn descriptor<T: 'static>(&self) -> Option<&ServiceDescriptor<T>> {
        self.descriptor.cast::<ServiceDescriptor<T>>()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("lifetime", &self.lifetime)
            .field("value_type", &self.value_type_name)
            .field("dependencies", &self.dependencies())
            .finish()
    }
}

/// Service registry: registration slots keyed by [`Key`].
///
/// A slot keeps its descriptors in insertion order. Singular resolution uses
/// the most recently added descriptor, plural resolution walks the whole slot.
/// Queries never fail; unknown keys report absence or zero.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Key, Registry, ServiceDescriptor};
///
/// let mut registry = Registry::new();
/// registry.add(Key::of::<u32>(), ServiceDescriptor::singleton(|_| Ok(1u32)));
/// registry.add(Key::of::<u32>(), ServiceDescriptor::singleton(|_| Ok(2u32)));
/// assert!(!registry.emplace(Key::of::<u32>(), ServiceDescriptor::singleton(|_| Ok(3u32))));
///
/// assert_eq!(registry.count(&Key::of::<u32>()), 2);
/// assert_eq!(registry.count(&Key::of::<u64>()), 0);
/// ```
#[derive(Default)]
pub struct Registry {
    slots: FastMap<Key, Vec<Registration>>,
    /// Slot keys in first-registration order
    order: Vec<Key>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `descriptor` to the slot for `key`.
    ///
    /// The descriptor is stored as given. A descriptor whose value type differs
    /// from the key's declared type is accepted here and reported as
    /// [`DiError::IncompatibleDescriptor`](crate::DiError::IncompatibleDescriptor)
    /// when the key is resolved.
    pub fn add<T: Send + Sync + 'static>(
        &mut self,
        key: Key,
        descriptor: ServiceDescriptor<T>,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_id);
        self.next_id += 1;

        tracing::debug!(
            key = ?key,
            id = id.get(),
            lifetime = descriptor.lifetime().as_str(),
            "registering service"
        );

        let registration = Registration {
            id,
            lifetime: descriptor.lifetime(),
            dependencies: descriptor.declared_dependencies(),
            value_type_name: descriptor.value_type_name(),
            descriptor: DynamicCell::new(descriptor),
        };

        match self.slots.get_mut(&key) {
            Some(slot) => slot.push(registration),
            None => {
                self.order.push(key);
                self.slots.insert(key, vec![registration]);
            }
        }
        id
    }

    /// Adds `descriptor` only if no slot exists for `key`.
    ///
    /// Returns whether the descriptor was inserted.
    pub fn emplace<T: Send + Sync + 'static>(
        &mut self,
        key: Key,
        descriptor: ServiceDescriptor<T>,
    ) -> bool {
        if self.has(&key) {
            tracing::debug!(key = ?key, "slot already registered, keeping existing descriptor");
            return false;
        }
        self.add(key, descriptor);
        true
    }

    #[inline]
    pub fn has(&self, key: &Key) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of descriptors in the slot for `key`.
    #[inline]
    pub fn count(&self, key: &Key) -> usize {
        self.slots.get(key).map_or(0, Vec::len)
    }

    /// Number of descriptors across every key sharing the declared type.
    pub fn count_all(&self, type_id: TypeId) -> usize {
        self.slots
            .iter()
            .filter(|(key, _)| key.type_id() == type_id)
            .map(|(_, slot)| slot.len())
            .sum()
    }

    /// Removes the slot for `key`, returning the number of descriptors dropped.
    pub fn clear(&mut self, key: &Key) -> usize {
        let removed = self.slots.remove(key).map_or(0, |slot| slot.len());
        if removed > 0 {
            self.order.retain(|k| k != key);
            tracing::debug!(key = ?key, removed, "cleared registration slot");
        }
        removed
    }

    /// Removes every slot whose declared type is `type_id`.
    pub fn clear_all(&mut self, type_id: TypeId) -> usize {
        let mut removed = 0;
        self.slots.retain(|key, slot| {
            if key.type_id() == type_id {
                removed += slot.len();
                false
            } else {
                true
            }
        });
        self.order.retain(|key| key.type_id() != type_id);
        if removed > 0 {
            tracing::debug!(removed, "cleared registration slots for type");
        }
        removed
    }

    /// Registrations in the slot for `key`, in insertion order.
    #[inline]
    pub fn slot(&self, key: &Key) -> Option<&[Registration]> {
        self.slots.get(key).map(Vec::as_slice)
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        self.slots.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot keys in first-registration order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.order.iter()
    }

    /// Introspection view of every registration, slot by slot.
    pub fn descriptors(&self) -> Vec<DescriptorInfo> {
        self.iter()
            .map(|(key, registration)| DescriptorInfo {
                key: *key,
                id: registration.id,
                lifetime: registration.lifetime,
                value_type_name: registration.value_type_name,
                dependencies: registration.dependencies.to_vec(),
            })
            .collect()
    }

    /// Every `(key, registration)` pair, slot by slot in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> + '_ {
        self.order.iter().flat_map(move |key| {
            self.slots
                .get(key)
                .into_iter()
                .flatten()
                .map(move |registration| (key, registration))
        })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
