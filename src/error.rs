//! Error types for the dependency injection container.

/// Dependency injection errors
///
/// The first three variants are resolution failures. [`DiError::Circular`] is
/// produced when a registry is validated while building a provider, or when a
/// cached service's loader re-enters its own construction.
///
/// # Examples
///
/// ```rust
/// use cellar_di::{DiError, Resolver, ServiceCollection};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(DiError::NotFound(type_name)) => {
///         assert_eq!(type_name, "alloc::string::String");
///     }
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiError {
    /// No registration slot exists for the requested key
    #[error("Service not found: {0}")]
    NotFound(&'static str),
    /// The stored descriptor does not describe the requested type
    #[error("Incompatible service descriptor: {0}")]
    IncompatibleDescriptor(&'static str),
    /// The produced or cached instance is not the descriptor's value type
    #[error("Mismatched service type: {0}")]
    MismatchedType(&'static str),
    /// Dependencies form a cycle (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
}

impl DiError {
    /// Type name the error refers to; the first element of the path for cycles.
    pub fn type_name(&self) -> &'static str {
        match self {
            DiError::NotFound(name)
            | DiError::IncompatibleDescriptor(name)
            | DiError::MismatchedType(name) => name,
            DiError::Circular(path) => path.first().copied().unwrap_or(""),
        }
    }
}

/// Result type for DI operations
///
/// `Result` is `#[must_use]`, so an unexamined resolution failure is reported
/// by the compiler.
pub type DiResult<T> = Result<T, DiError>;
