//! Constructor metadata and the implementation contract used for auto-wiring.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::registration::AnyArc;
use crate::traits::Disposer;

/// A constructor parameter of an implementation.
///
/// A parameter with a declared type is resolved through the container before
/// the implementation is constructed. A parameter created with
/// [`Dependency::untyped`] has no declared type and makes resolution fail
/// with [`DiError::MissingTypeAnnotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    name: &'static str,
    key: Option<Key>,
}

impl Dependency {
    /// Parameter `name` of service type `S`.
    pub fn typed<S: ?Sized + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: Some(Key::of::<S>()),
        }
    }

    /// Parameter `name` without a declared type.
    pub fn untyped(name: &'static str) -> Self {
        Self { name, key: None }
    }

    /// Parameter name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared service identity, if any.
    pub fn key(&self) -> Option<Key> {
        self.key
    }
}

/// Resolved constructor arguments handed to [`Injectable::construct`].
///
/// Values are stored in declaration order and can be taken by parameter
/// name with [`take`](Self::take) or in order with [`next`](Self::next).
pub struct Arguments {
    service: &'static str,
    values: Vec<(&'static str, Option<AnyArc>)>,
}

impl Arguments {
    pub(crate) fn new(service: &'static str, values: Vec<(&'static str, AnyArc)>) -> Self {
        Self {
            service,
            values: values.into_iter().map(|(name, v)| (name, Some(v))).collect(),
        }
    }

    /// Takes the argument resolved for parameter `name`.
    ///
    /// # Errors
    ///
    /// [`DiError::MissingArgument`] when no parameter of that name was
    /// declared (or it was already taken), [`DiError::TypeMismatch`] when it
    /// was declared with a different service type.
    pub fn take<S: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> DiResult<Arc<S>> {
        let slot = self
            .values
            .iter_mut()
            .find(|(n, v)| *n == name && v.is_some())
            .and_then(|(_, v)| v.take());
        match slot {
            Some(value) => downcast::<S>(value),
            None => Err(DiError::MissingArgument {
                service: self.service,
                parameter: name.to_string(),
            }),
        }
    }

    /// Takes the next argument in declaration order that has not been taken yet.
    pub fn next<S: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<S>> {
        let slot = self.values.iter_mut().find_map(|(_, v)| v.take());
        match slot {
            Some(value) => downcast::<S>(value),
            None => Err(DiError::MissingArgument {
                service: self.service,
                parameter: format!("<positional {}>", std::any::type_name::<S>()),
            }),
        }
    }

    /// Number of arguments not taken yet.
    pub fn len(&self) -> usize {
        self.values.iter().filter(|(_, v)| v.is_some()).count()
    }

    /// Returns `true` when every argument has been taken.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The service being constructed.
    pub fn service(&self) -> &'static str {
        self.service
    }
}

// Every resolved value is stored as `Arc<Arc<S>>` so trait objects and
// concrete types share one representation.
pub(crate) fn downcast<S: ?Sized + Send + Sync + 'static>(value: AnyArc) -> DiResult<Arc<S>> {
    value
        .downcast::<Arc<S>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch(std::any::type_name::<S>()))
}

pub(crate) fn erase<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> AnyArc {
    Arc::new(value)
}

/// An implementation the container can construct by itself.
///
/// `dependencies` lists the constructor parameters and their service types;
/// the resolver resolves them depth-first, in that order, and hands the
/// results to `construct`. Implementations that hold resources declare their
/// release capability through `disposer`.
///
/// # Examples
///
/// ```
/// use autowire::{Arguments, Container, Dependency, DiResult, Injectable};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// impl Injectable for Config {
///     fn construct(_: &mut Arguments) -> DiResult<Self> {
///         Ok(Config { url: "postgres://localhost".into() })
///     }
/// }
///
/// struct Repository { config: Arc<Config> }
/// impl Injectable for Repository {
///     fn dependencies() -> Vec<Dependency> {
///         vec![Dependency::typed::<Config>("config")]
///     }
///     fn construct(args: &mut Arguments) -> DiResult<Self> {
///         Ok(Repository { config: args.take("config")? })
///     }
/// }
///
/// let container = Container::new();
/// container.add_singleton::<Config, Config>();
/// container.add_transient::<Repository, Repository>();
///
/// let repo = container.resolve::<Repository>().unwrap();
/// assert_eq!(repo.config.url, "postgres://localhost");
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Constructor parameters in declaration order.
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    /// Builds the instance from its resolved arguments.
    fn construct(args: &mut Arguments) -> DiResult<Self>;

    /// Release capability of a constructed instance.
    fn disposer(this: &Arc<Self>) -> Option<Disposer> {
        let _ = this;
        None
    }
}

/// Declares that `Self` can satisfy the service contract `S`.
///
/// Every injectable type implements its own contract. Trait-object contracts
/// are declared with the [`interface!`](crate::interface) macro.
pub trait Implements<S: ?Sized + Send + Sync + 'static>: Injectable {
    /// Converts a constructed instance into the contract type.
    fn upcast(this: Arc<Self>) -> Arc<S>;
}

impl<T: Injectable> Implements<T> for T {
    fn upcast(this: Arc<Self>) -> Arc<T> {
        this
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> Arguments {
        Arguments::new(
            "Subject",
            vec![
                ("first", erase(Arc::new(1u32))),
                ("second", erase(Arc::new("two".to_string()))),
            ],
        )
    }

    #[test]
    fn take_by_name() {
        let mut a = args();
        let second = a.take::<String>("second").unwrap();
        let first = a.take::<u32>("first").unwrap();
        assert_eq!(*first, 1);
        assert_eq!(second.as_str(), "two");
        assert!(a.is_empty());
    }

    #[test]
    fn next_skips_taken() {
        let mut a = args();
        let _ = a.take::<u32>("first").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.next::<String>().unwrap().as_str(), "two");
        assert!(matches!(a.next::<String>(), Err(DiError::MissingArgument { .. })));
    }

    #[test]
    fn take_twice_is_missing() {
        let mut a = args();
        a.take::<u32>("first").unwrap();
        match a.take::<u32>("first") {
            Err(DiError::MissingArgument { service, parameter }) => {
                assert_eq!(service, "Subject");
                assert_eq!(parameter, "first");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn wrong_type_is_mismatch() {
        let mut a = args();
        assert!(matches!(a.take::<u64>("first"), Err(DiError::TypeMismatch(_))));
    }

    #[test]
    fn untyped_dependency_has_no_key() {
        assert_eq!(Dependency::untyped("x").key(), None);
        assert_eq!(Dependency::typed::<u8>("x").key(), Some(Key::of::<u8>()));
    }
}
