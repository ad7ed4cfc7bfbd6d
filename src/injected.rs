//! Typed product of a resolution.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A resolved service instance.
///
/// Singleton and scoped services come back as [`Injected::Shared`]: a handle to
/// the instance held by the owning cache. Transient services come back as
/// [`Injected::Owned`] and belong to the caller outright.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{Injected, Resolver, ServiceCollection};
///
/// struct Clock;
/// struct Token(u32);
///
/// let mut services = ServiceCollection::new();
/// services.add_singleton_factory(|_| Ok(Clock));
/// services.add_transient_factory(|_| Ok(Token(7)));
/// let provider = services.build();
///
/// let clock = provider.get_required::<Clock>();
/// assert!(clock.is_shared());
/// assert!(Injected::ptr_eq(&clock, &provider.get_required::<Clock>()));
///
/// let token = provider.get_required::<Token>().into_owned().ok().unwrap();
/// assert_eq!(token.0, 7);
/// ```
pub enum Injected<T> {
    /// Instance owned by a singleton or scoped cache
    Shared(Arc<T>),
    /// Fresh transient instance
    Owned(T),
}

impl<T> Injected<T> {
    /// Returns `true` for cached instances.
    pub fn is_shared(&self) -> bool {
        matches!(self, Injected::Shared(_))
    }

    /// Converts into an `Arc`, wrapping owned values.
    pub fn into_shared(self) -> Arc<T> {
        match self {
            Injected::Shared(shared) => shared,
            Injected::Owned(value) => Arc::new(value),
        }
    }

    /// Takes the owned value; cached instances are returned as `Err`.
    pub fn into_owned(self) -> Result<T, Arc<T>> {
        match self {
            Injected::Owned(value) => Ok(value),
            Injected::Shared(shared) => Err(shared),
        }
    }

    /// Returns `true` when both refer to the same instance.
    ///
    /// Owned values never share an instance with anything else.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        std::ptr::eq(this.deref(), other.deref())
    }
}

impl<T> Deref for Injected<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self {
            Injected::Shared(shared) => shared,
            Injected::Owned(value) => value,
        }
    }
}

impl<T> AsRef<T> for Injected<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> From<Injected<T>> for Arc<T> {
    fn from(injected: Injected<T>) -> Self {
        injected.into_shared()
    }
}

impl<T: fmt::Debug> fmt::Debug for Injected<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Injected::Shared(shared) => f.debug_tuple("Shared").field(&**shared).finish(),
            Injected::Owned(value) => f.debug_tuple("Owned").field(value).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_handles_compare_by_pointer() {
        let arc = Arc::new(5u8);
        let a = Injected::Shared(arc.clone());
        let b = Injected::Shared(arc);
        assert!(Injected::ptr_eq(&a, &b));
        assert!(a.is_shared());
    }

    #[test]
    fn owned_values_never_compare_equal_by_pointer() {
        let a = Injected::Owned(5u8);
        let b = Injected::Owned(5u8);
        assert!(!Injected::ptr_eq(&a, &b));
        assert_eq!(*a, *b);
    }

    #[test]
    fn into_owned_refuses_shared() {
        let shared = Injected::Shared(Arc::new(String::from("x")));
        assert_eq!(*shared.into_owned().unwrap_err(), "x");

        let owned = Injected::Owned(String::from("y"));
        assert_eq!(owned.into_owned().unwrap(), "y");
    }

    #[test]
    fn into_shared_wraps_owned() {
        let arc: Arc<u32> = Injected::Owned(3u32).into();
        assert_eq!(*arc, 3);
    }
}
