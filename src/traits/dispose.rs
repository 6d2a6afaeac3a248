//! Disposal traits for resource cleanup.

use std::sync::Arc;

/// Trait for synchronous resource disposal.
///
/// Implement this trait for services that need structured teardown (e.g., flushing caches,
/// closing file handles) and expose it from [`Injectable::disposer`](crate::Injectable::disposer).
///
/// # Examples
///
/// ```
/// use autowire::{Arguments, Container, DiResult, Dispose, Disposer, Injectable, Lifetime};
/// use std::sync::Arc;
///
/// struct Cache;
///
/// impl Dispose for Cache {
///     fn dispose(&self) -> anyhow::Result<()> {
///         println!("Flushing cache");
///         Ok(())
///     }
/// }
///
/// impl Injectable for Cache {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Cache) }
///     fn disposer(this: &Arc<Self>) -> Option<Disposer> { Some(Disposer::sync(this.clone())) }
/// }
///
/// let container = Container::new();
/// container.register_self::<Cache>(Lifetime::Singleton);
/// let _cache = container.resolve::<Cache>().unwrap();
/// assert_eq!(container.tracked_disposables(), 1);
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self) -> anyhow::Result<()>;
}

/// Trait for asynchronous resource disposal.
///
/// Implement this trait for services whose teardown has to wait on something
/// external, such as closing a network connection. Scope teardown awaits
/// every async release before it completes.
///
/// # Examples
///
/// ```
/// use autowire::AsyncDispose;
/// use async_trait::async_trait;
///
/// struct DatabaseClient {
///     connection_id: String,
/// }
///
/// #[async_trait]
/// impl AsyncDispose for DatabaseClient {
///     async fn dispose(&self) -> anyhow::Result<()> {
///         println!("Closing database connection: {}", self.connection_id);
///         Ok(())
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait AsyncDispose: Send + Sync + 'static {
    /// Perform asynchronous cleanup of resources.
    async fn dispose(&self) -> anyhow::Result<()>;
}

/// Release capability declared by a constructed instance.
#[derive(Clone)]
pub enum Disposer {
    /// Released by calling [`Dispose::dispose`].
    Sync(Arc<dyn Dispose>),
    /// Released by awaiting [`AsyncDispose::dispose`].
    Async(Arc<dyn AsyncDispose>),
}

impl Disposer {
    /// Declares a synchronous release operation.
    pub fn sync<T: Dispose>(service: Arc<T>) -> Self {
        Disposer::Sync(service)
    }

    /// Declares an asynchronous release operation.
    pub fn asynchronous<T: AsyncDispose>(service: Arc<T>) -> Self {
        Disposer::Async(service)
    }

    /// Address of the instance behind this disposer.
    pub(crate) fn addr(&self) -> *const () {
        match self {
            Disposer::Sync(s) => Arc::as_ptr(s) as *const (),
            Disposer::Async(s) => Arc::as_ptr(s) as *const (),
        }
    }

    pub(crate) async fn release(&self) -> anyhow::Result<()> {
        match self {
            Disposer::Sync(s) => s.dispose(),
            Disposer::Async(s) => s.dispose().await,
        }
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disposer::Sync(_) => f.write_str("Disposer::Sync"),
            Disposer::Async(_) => f.write_str("Disposer::Async"),
        }
    }
}
