//! Service registration types.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::traits::{erase, Arguments, Dependency, Disposer, Implements};

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Output of a constructor: the erased instance and its release capability.
pub(crate) struct Constructed {
    pub(crate) value: AnyArc,
    pub(crate) disposer: Option<Disposer>,
}

pub(crate) type Ctor = Arc<dyn Fn(&mut Arguments) -> DiResult<Constructed> + Send + Sync>;

/// Association of a service identity with its implementation and lifetime.
///
/// Bindings are immutable once stored; re-registering an identity replaces
/// the whole binding.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) key: Key,
    pub(crate) implementation: &'static str,
    pub(crate) lifetime: Lifetime,
    pub(crate) dependencies: Arc<[Dependency]>,
    pub(crate) ctor: Ctor,
}

impl Binding {
    /// Binding constructed through `I`'s [`Injectable`](crate::Injectable) metadata.
    pub(crate) fn injectable<S, I>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        let ctor = |args: &mut Arguments| -> DiResult<Constructed> {
            let instance = Arc::new(I::construct(args)?);
            let disposer = I::disposer(&instance);
            Ok(Constructed {
                value: erase::<S>(I::upcast(instance)),
                disposer,
            })
        };
        Self {
            key: Key::of::<S>(),
            implementation: std::any::type_name::<I>(),
            lifetime,
            dependencies: I::dependencies().into(),
            ctor: Arc::new(ctor),
        }
    }

    /// Binding backed by an already built instance.
    pub(crate) fn instance<S>(value: Arc<S>) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let ctor = move |_: &mut Arguments| -> DiResult<Constructed> {
            Ok(Constructed {
                value: erase::<S>(value.clone()),
                disposer: None,
            })
        };
        Self {
            key: Key::of::<S>(),
            implementation: std::any::type_name::<S>(),
            lifetime: Lifetime::Singleton,
            dependencies: Arc::from(Vec::<Dependency>::new()),
            ctor: Arc::new(ctor),
        }
    }

    /// Binding built by an explicit factory listing its dependencies.
    pub(crate) fn factory<S, F>(lifetime: Lifetime, dependencies: Vec<Dependency>, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Arguments) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        Self::factory_with_disposer(lifetime, dependencies, factory, |_: &Arc<S>| None)
    }

    /// Factory binding whose instances may expose a release operation.
    pub(crate) fn factory_with_disposer<S, F, D>(
        lifetime: Lifetime,
        dependencies: Vec<Dependency>,
        factory: F,
        disposer: D,
    ) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Arguments) -> DiResult<Arc<S>> + Send + Sync + 'static,
        D: Fn(&Arc<S>) -> Option<Disposer> + Send + Sync + 'static,
    {
        let ctor = move |args: &mut Arguments| -> DiResult<Constructed> {
            let instance = factory(args)?;
            let release = disposer(&instance);
            Ok(Constructed {
                value: erase::<S>(instance),
                disposer: release,
            })
        };
        Self {
            key: Key::of::<S>(),
            implementation: std::any::type_name::<F>(),
            lifetime,
            dependencies: dependencies.into(),
            ctor: Arc::new(ctor),
        }
    }
}

/// Service registry holding all bindings
#[derive(Default)]
pub(crate) struct Registry {
    bindings: HashMap<Key, Binding>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores `binding`, returning the binding it replaced.
    pub(crate) fn insert(&mut self, binding: Binding) -> Option<Binding> {
        self.bindings.insert(binding.key, binding)
    }

    /// Exact-key lookup.
    pub(crate) fn lookup(&self, key: &Key) -> DiResult<&Binding> {
        self.bindings
            .get(key)
            .ok_or(DiError::NotFound(key.display_name()))
    }

    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }
}
