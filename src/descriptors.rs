//! Service descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::registration::Binding;

/// Service descriptor for introspection and diagnostics
///
/// A snapshot of one binding: which implementation satisfies an identity,
/// under which lifetime, and which constructor parameters it declares.
///
/// # Examples
///
/// ```rust
/// use autowire::{Arguments, Container, DiResult, Injectable, Lifetime};
///
/// struct Database;
/// impl Injectable for Database {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Database) }
/// }
///
/// let container = Container::new();
/// container.add_transient::<Database, Database>();
///
/// let descriptors = container.descriptors();
/// let db = descriptors.iter()
///     .find(|d| d.type_name().contains("Database"))
///     .unwrap();
/// assert_eq!(db.lifetime, Lifetime::Transient);
/// assert!(db.parameters.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// The service identity
    pub key: Key,
    /// Service lifetime
    pub lifetime: Lifetime,
    /// Implementation type name
    pub implementation: &'static str,
    /// Constructor parameter names, in declaration order
    pub parameters: Vec<&'static str>,
}

impl ServiceDescriptor {
    pub(crate) fn from_binding(binding: &Binding) -> Self {
        Self {
            key: binding.key,
            lifetime: binding.lifetime,
            implementation: binding.implementation,
            parameters: binding.dependencies.iter().map(|d| d.name()).collect(),
        }
    }

    /// Get the identity's type/trait name
    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    /// Whether the identity is bound to its own type.
    pub fn is_self_bound(&self) -> bool {
        self.key.display_name() == self.implementation
    }
}
