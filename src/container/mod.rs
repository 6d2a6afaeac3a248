//! The dependency injection container.
//!
//! This module contains the [`Container`] type: registration bookkeeping,
//! recursive constructor-dependency resolution and the singleton cache.
//! Disposal and scopes live in [`scope`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::config::ContainerConfig;
use crate::descriptors::ServiceDescriptor;
use crate::error::{DiError, DiResult};
use crate::internal::{DisposeBag, ResolutionPath};
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::registration::{AnyArc, Binding, Registry};
use crate::traits::{downcast, Arguments, Dependency, Disposer, Implements, Injectable};

pub mod scope;

/// Dependency injection container.
///
/// A `Container` owns the registry of bindings, the singleton cache and the
/// set of constructed instances that must be released at teardown. Cloning a
/// container is cheap and yields another handle to the same state.
///
/// # Concurrency
///
/// The container is `Send + Sync` and never holds a lock while constructing
/// an instance, so resolving from several threads is memory safe. It is
/// designed for one resolver at a time, though: when two threads resolve the
/// same singleton for the first time concurrently, both may construct it.
/// The first instance stored in the cache wins and is returned to both
/// callers; the extra instance is still tracked and released at teardown.
///
/// # Examples
///
/// ```
/// use autowire::{Arguments, Container, Dependency, DiResult, Injectable};
/// use std::sync::Arc;
///
/// trait Logger: Send + Sync {
///     fn log(&self, message: &str);
/// }
///
/// struct ConsoleLogger;
/// impl Logger for ConsoleLogger {
///     fn log(&self, message: &str) { println!("[LOG] {}", message); }
/// }
/// impl Injectable for ConsoleLogger {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(ConsoleLogger) }
/// }
/// autowire::interface!(dyn Logger = [ConsoleLogger]);
///
/// struct UserService { logger: Arc<dyn Logger> }
/// impl Injectable for UserService {
///     fn dependencies() -> Vec<Dependency> {
///         vec![Dependency::typed::<dyn Logger>("logger")]
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(UserService { logger: args.take("logger")? })
///     }
/// }
///
/// let container = Container::new();
/// container.add_singleton::<dyn Logger, ConsoleLogger>();
/// container.add_transient::<UserService, UserService>();
///
/// let service = container.resolve::<UserService>().unwrap();
/// service.logger.log("Hello, World!");
/// ```
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) config: ContainerConfig,
    pub(crate) registry: RwLock<Registry>,
    pub(crate) singletons: Mutex<HashMap<Key, AnyArc>>,
    pub(crate) disposables: Mutex<DisposeBag>,
    pub(crate) observers: RwLock<Observers>,
}

impl Container {
    /// Creates an empty container with default configuration.
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container with the given configuration.
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                config,
                registry: RwLock::new(Registry::new()),
                singletons: Mutex::new(HashMap::new()),
                disposables: Mutex::new(DisposeBag::default()),
                observers: RwLock::new(Observers::default()),
            }),
        }
    }

    /// Convenience accessor for the inner state
    #[inline]
    pub(crate) fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    /// The configuration this container was created with.
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Adds an observer notified of resolution and teardown events.
    pub fn add_observer(&self, observer: Arc<dyn DiObserver>) -> &Self {
        self.inner.observers.write().add(observer);
        self
    }

    // ----- Registration -----

    /// Binds the service identity `S` to the implementation `I`.
    ///
    /// Re-registering an identity overwrites its binding. An instance already
    /// cached for that identity stays cached until the container is disposed.
    pub fn register<S, I>(&self, lifetime: Lifetime) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        self.insert(Binding::injectable::<S, I>(lifetime))
    }

    /// Binds `S` to `I` as a singleton.
    pub fn add_singleton<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        self.register::<S, I>(Lifetime::Singleton)
    }

    /// Binds `S` to `I` as a transient service.
    pub fn add_transient<S, I>(&self) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        I: Implements<S>,
    {
        self.register::<S, I>(Lifetime::Transient)
    }

    /// Registers `T` as both its identity and its implementation.
    pub fn register_self<T: Injectable>(&self, lifetime: Lifetime) -> &Self {
        self.register::<T, T>(lifetime)
    }

    /// Registers an already built singleton.
    ///
    /// The container did not construct the instance, so it is never
    /// released at teardown.
    pub fn register_instance<S>(&self, instance: Arc<S>) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.insert(Binding::instance(instance))
    }

    /// Registers a factory together with the identities it depends on.
    ///
    /// The declared dependencies are resolved exactly like an
    /// [`Injectable`]'s constructor parameters and passed to `factory`.
    ///
    /// # Examples
    ///
    /// ```
    /// use autowire::{Container, Dependency, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Greeting(String);
    ///
    /// let container = Container::new();
    /// container.register_instance(Arc::new("world".to_string()));
    /// container.register_factory::<Greeting, _>(
    ///     Lifetime::Transient,
    ///     vec![Dependency::typed::<String>("name")],
    ///     |args| {
    ///         let name = args.take::<String>("name")?;
    ///         Ok(Arc::new(Greeting(format!("hello {}", name))))
    ///     },
    /// );
    ///
    /// assert_eq!(container.resolve::<Greeting>().unwrap().0, "hello world");
    /// ```
    pub fn register_factory<S, F>(&self, lifetime: Lifetime, dependencies: Vec<Dependency>, factory: F) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Arguments) -> DiResult<Arc<S>> + Send + Sync + 'static,
    {
        self.insert(Binding::factory(lifetime, dependencies, factory))
    }

    /// Registers a factory whose instances need releasing at teardown.
    ///
    /// `disposer` is called on every instance the factory builds; a returned
    /// [`Disposer`] is tracked like one from [`Injectable::disposer`] and
    /// released by [`dispose`](Container::dispose).
    ///
    /// # Examples
    ///
    /// ```
    /// use autowire::{Container, Dispose, Disposer, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Socket;
    /// impl Dispose for Socket {
    ///     fn dispose(&self) -> anyhow::Result<()> { Ok(()) }
    /// }
    ///
    /// let container = Container::new();
    /// container.register_factory_with_disposer::<Socket, _, _>(
    ///     Lifetime::Transient,
    ///     Vec::new(),
    ///     |_| Ok(Arc::new(Socket)),
    ///     |socket| Some(Disposer::sync(socket.clone())),
    /// );
    ///
    /// container.resolve::<Socket>().unwrap();
    /// assert_eq!(container.tracked_disposables(), 1);
    /// ```
    pub fn register_factory_with_disposer<S, F, D>(
        &self,
        lifetime: Lifetime,
        dependencies: Vec<Dependency>,
        factory: F,
        disposer: D,
    ) -> &Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Arguments) -> DiResult<Arc<S>> + Send + Sync + 'static,
        D: Fn(&Arc<S>) -> Option<Disposer> + Send + Sync + 'static,
    {
        self.insert(Binding::factory_with_disposer(lifetime, dependencies, factory, disposer))
    }

    fn insert(&self, binding: Binding) -> &Self {
        let key = binding.key;
        let implementation = binding.implementation;
        let lifetime = binding.lifetime;

        let previous = self.inner.registry.write().insert(binding);
        match previous {
            Some(previous) => tracing::debug!(
                service = key.display_name(),
                previous = previous.implementation,
                implementation,
                %lifetime,
                "replaced binding"
            ),
            None => tracing::debug!(service = key.display_name(), implementation, %lifetime, "registered"),
        }
        self
    }

    /// Returns `true` when a binding exists for `S`.
    pub fn is_registered<S: ?Sized + 'static>(&self) -> bool {
        self.inner.registry.read().contains(&Key::of::<S>())
    }

    /// Snapshot of every binding, sorted by identity name.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        let mut descriptors: Vec<_> = self
            .inner
            .registry
            .read()
            .iter()
            .map(ServiceDescriptor::from_binding)
            .collect();
        descriptors.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        descriptors
    }

    /// Number of bindings.
    pub fn registered_count(&self) -> usize {
        self.inner.registry.read().len()
    }

    // ----- Resolution -----

    /// Resolves the service identity `S`.
    ///
    /// Singletons are constructed once and cached; transient services are
    /// constructed on every call. Constructor parameters are resolved
    /// depth-first in declaration order.
    ///
    /// # Errors
    ///
    /// - [`DiError::NotFound`] when `S` or one of its dependencies has no binding
    /// - [`DiError::MissingTypeAnnotation`] when an implementation declares an untyped parameter
    /// - [`DiError::Circular`] when the dependency graph loops back on itself
    /// - [`DiError::DepthExceeded`] when the chain is deeper than the configured maximum
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<S>> {
        let any = self.resolve_any(&Key::of::<S>())?;
        downcast::<S>(any)
    }

    /// Resolves `S`, panicking on failure.
    ///
    /// Use this when a missing service is a configuration bug.
    pub fn resolve_required<S: ?Sized + Send + Sync + 'static>(&self) -> Arc<S> {
        self.resolve::<S>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<S>(), e))
    }

    /// Root of one resolution call tree. Failures are reported to observers
    /// here once, not at every nested level.
    pub(crate) fn resolve_any(&self, key: &Key) -> DiResult<AnyArc> {
        let mut path = ResolutionPath::new(self.inner.config.max_depth);
        self.resolve_in(*key, &mut path).map_err(|error| {
            if let Some(observers) = self.observers() {
                observers.resolution_failed(key, &error);
            }
            error
        })
    }

    fn resolve_in(&self, key: Key, path: &mut ResolutionPath) -> DiResult<AnyArc> {
        let binding = self.inner.registry.read().lookup(&key)?.clone();

        if binding.lifetime == Lifetime::Singleton {
            if let Some(cached) = self.inner.singletons.lock().get(&key) {
                tracing::trace!(service = key.display_name(), "singleton cache hit");
                return Ok(cached.clone());
            }
        }

        let observers = self.observers();
        let start = observers.as_ref().map(|observers| {
            observers.resolving(&key);
            Instant::now()
        });

        path.enter(key)?;
        let constructed = self.construct(&binding, path);
        path.exit(key);
        let constructed = constructed?;

        if let Some(disposer) = constructed.disposer {
            if self.inner.disposables.lock().push(key.display_name(), disposer) {
                tracing::debug!(service = key.display_name(), "tracking disposable instance");
            }
        }

        let value = match binding.lifetime {
            Lifetime::Singleton => self
                .inner
                .singletons
                .lock()
                .entry(key)
                .or_insert(constructed.value)
                .clone(),
            Lifetime::Transient => constructed.value,
        };

        if let (Some(observers), Some(start)) = (observers, start) {
            observers.resolved(&key, start.elapsed());
        }
        Ok(value)
    }

    fn construct(
        &self,
        binding: &Binding,
        path: &mut ResolutionPath,
    ) -> DiResult<crate::registration::Constructed> {
        // Every parameter needs a declared type before anything is resolved
        let mut parameters = Vec::with_capacity(binding.dependencies.len());
        for dependency in binding.dependencies.iter() {
            match dependency.key() {
                Some(key) => parameters.push((dependency.name(), key)),
                None => {
                    return Err(DiError::MissingTypeAnnotation {
                        service: binding.implementation,
                        parameter: dependency.name(),
                    })
                }
            }
        }

        let mut values = Vec::with_capacity(parameters.len());
        for (name, key) in parameters {
            values.push((name, self.resolve_in(key, path)?));
        }

        tracing::debug!(
            service = binding.key.display_name(),
            implementation = binding.implementation,
            depth = path.depth(),
            "constructing"
        );
        let mut args = Arguments::new(binding.implementation, values);
        (binding.ctor)(&mut args)
    }

    fn observers(&self) -> Option<Observers> {
        let observers = self.inner.observers.read();
        if observers.has_observers() {
            Some(observers.clone())
        } else {
            None
        }
    }

    /// Number of instances awaiting release.
    pub fn tracked_disposables(&self) -> usize {
        self.inner.disposables.lock().len()
    }

    /// Number of cached singleton instances.
    pub fn cached_singletons(&self) -> usize {
        self.inner.singletons.lock().len()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        for d in self.descriptors() {
            s.push_str(&format!(
                "  {} => {} ({}) [{}]\n",
                d.type_name(),
                d.implementation,
                d.lifetime,
                d.parameters.join(", ")
            ));
        }
        s.push_str(&format!(
            "Cached singletons: {}\nTracked disposables: {}\n",
            self.cached_singletons(),
            self.tracked_disposables()
        ));
        s
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Container {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Drop for Container {
    fn drop(&mut self) {
        // Only the last handle reports undisposed resources
        if Arc::strong_count(&self.inner) == 1 {
            if let Some(bag) = self.inner.disposables.try_lock() {
                if !bag.is_empty() {
                    tracing::warn!(
                        undisposed = bag.len(),
                        "container dropped with undisposed resources; call dispose().await before dropping"
                    );
                }
            }
        }
    }
}
