//! Build-time validation of declared dependencies.
//!
//! Resolution itself performs no cycle detection: a loader that resolves its
//! own key recursively would never return. Cycles among *declared*
//! dependencies are therefore rejected once, when a registry is frozen into a
//! provider. Missing dependencies are only reported; resolving a service whose
//! dependency is absent fails with [`DiError::NotFound`] at that point.

use std::collections::HashSet;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Registry;

/// Findings of [`validate`].
///
/// # Examples
///
/// ```rust
/// use cellar_di::{validate, DiError, Key, Registry, ServiceDescriptor};
///
/// struct A;
/// struct B;
///
/// let mut registry = Registry::new();
/// registry.add(Key::of::<A>(), ServiceDescriptor::transient(|_| Ok(A)).depends_on::<B>());
///
/// let report = validate(&registry);
/// assert_eq!(report.missing, vec![(Key::of::<A>(), Key::of::<B>())]);
/// assert!(report.check().is_ok());
///
/// registry.add(Key::of::<B>(), ServiceDescriptor::transient(|_| Ok(B)).depends_on::<A>());
/// assert!(matches!(validate(&registry).check(), Err(DiError::Circular(_))));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Dependency cycles; each path starts and ends with the same service
    pub cycles: Vec<Vec<&'static str>>,
    /// `(service, dependency)` pairs where the dependency has no registration
    pub missing: Vec<(Key, Key)>,
    /// `(singleton, scoped)` pairs where a singleton declares a scoped dependency
    pub captive: Vec<(Key, Key)>,
}

impl ValidationReport {
    /// Returns `true` when no cycle was found.
    pub fn is_acyclic(&self) -> bool {
        self.cycles.is_empty()
    }

    /// Fails with the first cycle found.
    pub fn check(&self) -> DiResult<()> {
        match self.cycles.first() {
            Some(cycle) => Err(DiError::Circular(cycle.clone())),
            None => Ok(()),
        }
    }

    /// Logs missing and captive dependencies at `WARN`.
    pub fn log_warnings(&self) {
        for (service, dependency) in &self.missing {
            tracing::warn!(
                service = service.display_name(),
                dependency = dependency.display_name(),
                "declared dependency is not registered"
            );
        }
        for (singleton, scoped) in &self.captive {
            tracing::warn!(
                service = singleton.display_name(),
                dependency = scoped.display_name(),
                "singleton depends on a scoped service"
            );
        }
    }
}

/// Checks the declared dependency graph of `registry`.
///
/// Every slot is a node; its edges are the union of the dependencies declared
/// by the descriptors in the slot.
pub fn validate(registry: &Registry) -> ValidationReport {
    let mut report = ValidationReport::default();

    for (key, registration) in registry.iter() {
        for dependency in registration.dependencies() {
            match registry.slot(dependency) {
                None => report.missing.push((*key, *dependency)),
                Some(slot) => {
                    let scoped = slot.iter().any(|r| r.lifetime() == Lifetime::Scoped);
                    if registration.lifetime() == Lifetime::Singleton && scoped {
                        report.captive.push((*key, *dependency));
                    }
                }
            }
        }
    }

    let mut visited = HashSet::new();
    let mut path = Vec::new();
    for key in registry.keys() {
        if !visited.contains(key) {
            find_cycles(registry, *key, &mut visited, &mut path, &mut report.cycles);
        }
    }

    report
}

fn find_cycles(
    registry: &Registry,
    current: Key,
    visited: &mut HashSet<Key>,
    path: &mut Vec<Key>,
    cycles: &mut Vec<Vec<&'static str>>,
) {
    if let Some(start) = path.iter().position(|key| *key == current) {
        let cycle = path[start..]
            .iter()
            .chain(std::iter::once(&current))
            .map(Key::display_name)
            .collect();
        cycles.push(cycle);
        return;
    }

    if !visited.insert(current) {
        return;
    }

    let Some(slot) = registry.slot(&current) else {
        return;
    };

    path.push(current);
    for registration in slot {
        for dependency in registration.dependencies() {
            find_cycles(registry, *dependency, visited, path, cycles);
        }
    }
    path.pop();
}
