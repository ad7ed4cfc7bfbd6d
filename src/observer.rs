//! Diagnostic observers for resolution events.
//!
//! Observers are attached to a [`ServiceCollection`](crate::ServiceCollection)
//! before it is built and are called synchronously for every resolution,
//! including the nested resolutions a loader performs for its dependencies.
//! With no observers attached, resolution skips timing entirely.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::Key;

/// Observer trait for resolution events.
///
/// Calls are made on the resolving thread, in resolution order. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{DiError, DiObserver, Key, Resolver, ServiceCollection};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Journal(Mutex<Vec<String>>);
///
/// impl DiObserver for Journal {
///     fn resolving(&self, key: &Key) {
///         self.0.lock().unwrap().push(format!("resolving {}", key.display_name()));
///     }
///
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.0.lock().unwrap().push(format!("resolved {}", key.display_name()));
///     }
///
///     fn failed(&self, key: &Key, error: &DiError) {
///         self.0.lock().unwrap().push(format!("failed {}: {}", key.display_name(), error));
///     }
/// }
///
/// let journal = Arc::new(Journal::default());
/// let mut services = ServiceCollection::new();
/// services.add_observer(journal.clone());
/// services.add_transient_factory(|_| Ok(5u8));
///
/// let provider = services.build();
/// provider.get::<u8>().unwrap();
///
/// assert_eq!(*journal.0.lock().unwrap(), vec!["resolving u8", "resolved u8"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before the registration for `key` is looked at.
    fn resolving(&self, key: &Key);

    /// Called after a successful resolution of `key`.
    ///
    /// `duration` covers the cache lookup and, on a miss, the loader call.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolving `key` fails. Nothing is cached for a failed resolution.
    fn failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }
}

/// Observer that forwards resolution events to [`tracing`].
///
/// Successful resolutions are emitted at `TRACE`, failures at `DEBUG`, both
/// with a `service` field holding the declared type name.
///
/// ```rust
/// use cellar_di::{ServiceCollection, TracingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(TracingObserver::new()));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver {
    _private: (),
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(service = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(
            service = key.display_name(),
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, key: &Key, error: &DiError) {
        tracing::debug!(service = key.display_name(), %error, "resolution failed");
    }
}
