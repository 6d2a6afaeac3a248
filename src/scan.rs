//! Auto-registration of types marked injectable.
//!
//! Marking a type with [`injectable!`](crate::injectable) submits an
//! [`InjectableEntry`] to a link-time collection. The type itself is not
//! modified. A [`Namespace`] selects the entries defined in one module, and
//! [`Container::auto_register`] binds each of them to itself.
//!
//! ```
//! mod services {
//!     use autowire::{Arguments, DiResult, Injectable, Lifetime};
//!
//!     pub const PATH: &str = module_path!();
//!
//!     pub struct Clock;
//!     impl Injectable for Clock {
//!         fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Clock) }
//!     }
//!     autowire::injectable!(Clock);
//!
//!     pub struct RequestId;
//!     impl Injectable for RequestId {
//!         fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(RequestId) }
//!     }
//!     autowire::injectable!(RequestId, Lifetime::Transient);
//!
//!     // Not marked, never auto-registered
//!     pub struct Helper;
//! }
//!
//! let container = autowire::Container::new();
//! let count = container.auto_register_module(services::PATH);
//! assert_eq!(count, 2);
//! assert!(container.is_registered::<services::Clock>());
//! ```

use crate::container::Container;
use crate::lifetime::Lifetime;
use crate::traits::Injectable;

/// An injectable marker: a type, the module it was declared in and its lifetime.
#[derive(Clone, Copy)]
pub struct InjectableEntry {
    /// `module_path!()` at the marking site
    pub module_path: &'static str,
    /// Type name as written at the marking site
    pub type_name: &'static str,
    /// Lifetime the type is registered with
    pub lifetime: Lifetime,
    register: fn(&Container, Lifetime),
}

impl InjectableEntry {
    /// Builds an entry for `T`. Usually called through [`injectable!`](crate::injectable).
    pub const fn new<T: Injectable>(module_path: &'static str, type_name: &'static str, lifetime: Lifetime) -> Self {
        Self {
            module_path,
            type_name,
            lifetime,
            register: register_self::<T>,
        }
    }

    fn register(&self, container: &Container) {
        (self.register)(container, self.lifetime)
    }
}

impl std::fmt::Debug for InjectableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectableEntry")
            .field("module_path", &self.module_path)
            .field("type_name", &self.type_name)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

fn register_self<T: Injectable>(container: &Container, lifetime: Lifetime) {
    container.register_self::<T>(lifetime);
}

inventory::collect!(InjectableEntry);

/// The injectable types of one module.
#[derive(Debug, Clone)]
pub struct Namespace {
    path: String,
    entries: Vec<InjectableEntry>,
}

impl Namespace {
    /// Empty namespace named `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Collects every marked type declared directly in module `path`.
    ///
    /// Submodules are not included. An unknown path yields an empty namespace.
    pub fn discover(path: &str) -> Self {
        let mut namespace = Self::new(path);
        namespace.entries = inventory::iter::<InjectableEntry>
            .into_iter()
            .filter(|entry| entry.module_path == path)
            .copied()
            .collect();
        // Link order is unspecified
        namespace.entries.sort_by_key(|entry| entry.type_name);
        namespace
    }

    /// Adds `T` as a marked type with `lifetime`.
    pub fn with<T: Injectable>(mut self, lifetime: Lifetime) -> Self {
        let entry = InjectableEntry::new::<T>("", std::any::type_name::<T>(), lifetime);
        self.entries.push(entry);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn entries(&self) -> &[InjectableEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Container {
    /// Registers every marked type in `namespace` as its own implementation,
    /// with the lifetime it was marked with. Returns the number registered.
    pub fn auto_register(&self, namespace: &Namespace) -> usize {
        for entry in namespace.entries() {
            entry.register(self);
        }
        tracing::info!(
            namespace = namespace.path(),
            registered = namespace.len(),
            "auto-registered injectable types"
        );
        namespace.len()
    }

    /// [`Namespace::discover`] followed by [`auto_register`](Self::auto_register).
    pub fn auto_register_module(&self, path: &str) -> usize {
        self.auto_register(&Namespace::discover(path))
    }
}
