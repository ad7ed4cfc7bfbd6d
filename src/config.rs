//! Build-time options for turning a registry into a provider.

/// Options applied when a [`Registry`](crate::Registry) is frozen into a
/// [`ServiceProvider`](crate::ServiceProvider).
///
/// Both checks are on by default.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{BuildOptions, ServiceCollection};
///
/// let options = BuildOptions::new()
///     .validate_dependencies(true)
///     .warn_missing_dependencies(false);
///
/// let provider = ServiceCollection::new().try_build_with(options).unwrap();
/// # drop(provider);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Reject registries whose declared dependencies form a cycle
    pub validate_dependencies: bool,
    /// Log declared dependencies that have no registration
    pub warn_missing_dependencies: bool,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skips every check; the registry is used as-is.
    pub fn unchecked() -> Self {
        Self {
            validate_dependencies: false,
            warn_missing_dependencies: false,
        }
    }

    pub fn validate_dependencies(mut self, enabled: bool) -> Self {
        self.validate_dependencies = enabled;
        self
    }

    pub fn warn_missing_dependencies(mut self, enabled: bool) -> Self {
        self.warn_missing_dependencies = enabled;
        self
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            validate_dependencies: true,
            warn_missing_dependencies: true,
        }
    }
}
