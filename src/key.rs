//! Service identity for the dependency injection container.

use std::any::TypeId;
use std::fmt;

/// Key identifying a service contract.
///
/// A key is built from a `TypeId`, so it works the same way for concrete
/// types (`Database`) and for trait objects (`dyn Logger`). Lookups are exact:
/// two keys are equal only when they were built from the same type.
///
/// # Examples
///
/// ```rust
/// use autowire::Key;
///
/// trait Logger: Send + Sync {}
///
/// let a = Key::of::<dyn Logger>();
/// let b = Key::of::<dyn Logger>();
/// assert_eq!(a, b);
/// assert_ne!(a, Key::of::<String>());
/// assert!(a.display_name().contains("Logger"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Key {
    id: TypeId,
    name: &'static str,
}

impl Key {
    /// Creates the key for the service contract `S`.
    #[inline(always)]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    /// Get the type or trait name for display
    ///
    /// This is the `std::any::type_name` of the contract and is only meant
    /// for error messages and logs.
    pub fn display_name(&self) -> &'static str {
        self.name
    }

    /// The underlying `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

// Hot path: TypeId-only comparison, the name is diagnostics only
impl PartialEq for Key {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Key {}

impl std::hash::Hash for Key {
    #[inline(always)]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Helper for creating service keys.
#[inline(always)]
pub fn key_of<S: ?Sized + 'static>() -> Key {
    Key::of::<S>()
}
