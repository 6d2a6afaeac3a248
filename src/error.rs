//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors
///
/// Every resolution error propagates synchronously to the caller of
/// `resolve`; the container performs no recovery or retry.
///
/// # Examples
///
/// ```rust
/// use autowire::{Container, DiError};
///
/// struct Unregistered;
///
/// let container = Container::new();
/// match container.resolve::<Unregistered>() {
///     Err(DiError::NotFound(name)) => assert!(name.ends_with("Unregistered")),
///     _ => unreachable!(),
/// }
///
/// let circular = DiError::Circular(vec!["A", "B", "A"]);
/// assert_eq!(circular.to_string(), "Circular dependency: A -> B -> A");
/// ```
#[derive(Debug, Clone, thiserror::Error)]
pub enum DiError {
    /// No binding exists for the requested identity
    #[error("Service not registered: {0}")]
    NotFound(&'static str),
    /// A constructor parameter has no declared service type
    #[error("Parameter `{parameter}` of {service} missing type annotation")]
    MissingTypeAnnotation {
        service: &'static str,
        parameter: &'static str,
    },
    /// An implementation asked for an argument it never declared
    #[error("No argument `{parameter}` was resolved for {service}")]
    MissingArgument {
        service: &'static str,
        parameter: String,
    },
    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),
    /// Circular dependency detected (includes path)
    #[error("Circular dependency: {}", .0.join(" -> "))]
    Circular(Vec<&'static str>),
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// An implementation failed to construct itself
    #[error("Failed to construct {service}: {message}")]
    Construction {
        service: &'static str,
        message: String,
    },
    /// One or more release operations failed during teardown
    #[error("{} release operation(s) failed: {}", .0.len(), join_failures(.0))]
    Dispose(Vec<DisposeFailure>),
    /// Invalid container configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DiError {
    /// Wraps an arbitrary construction failure for `service`.
    pub fn construction(service: &'static str, err: impl fmt::Display) -> Self {
        DiError::Construction {
            service,
            message: err.to_string(),
        }
    }
}

/// A release operation that failed or timed out during teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisposeFailure {
    /// Service identity whose instance failed to release
    pub service: &'static str,
    /// Failure description
    pub message: String,
}

impl fmt::Display for DisposeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.message)
    }
}

fn join_failures(failures: &[DisposeFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
