//! Container teardown and scoped lifecycles.
//!
//! [`Container::dispose`] releases every tracked instance in construction
//! order and clears the singleton cache. [`Container::scoped`] runs a body
//! against the container and always tears it down afterwards, even when the
//! body panics or the scope's future is dropped before completing.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use futures::FutureExt;

use crate::error::{DiError, DiResult, DisposeFailure};
use crate::internal::Tracked;
use crate::observer::Observers;
use crate::traits::Disposer;

use super::Container;

impl Container {
    /// Releases every tracked instance and clears the singleton cache.
    ///
    /// Instances are released in the order they were constructed; each one
    /// is released exactly once. A failing release does not stop the
    /// remaining ones: all failures are collected and returned together as
    /// [`DiError::Dispose`]. A release that panics or exceeds the configured
    /// [`dispose_timeout`](crate::ContainerConfig::dispose_timeout) counts as
    /// a failure.
    ///
    /// The container stays usable afterwards. Resolving again constructs
    /// fresh instances, which a later `dispose` releases.
    ///
    /// # Examples
    ///
    /// ```
    /// use autowire::{Arguments, Container, DiResult, Dispose, Disposer, Injectable, Lifetime};
    /// use std::sync::Arc;
    ///
    /// struct Pool;
    /// impl Dispose for Pool {
    ///     fn dispose(&self) -> anyhow::Result<()> { Ok(()) }
    /// }
    /// impl Injectable for Pool {
    ///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Pool) }
    ///     fn disposer(this: &Arc<Self>) -> Option<Disposer> { Some(Disposer::sync(this.clone())) }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let container = Container::new();
    /// container.register_self::<Pool>(Lifetime::Singleton);
    /// container.resolve::<Pool>().unwrap();
    ///
    /// container.dispose().await.unwrap();
    /// assert_eq!(container.tracked_disposables(), 0);
    /// assert_eq!(container.cached_singletons(), 0);
    /// # });
    /// ```
    pub async fn dispose(&self) -> DiResult<()> {
        let tracked = self.inner().disposables.lock().take();
        let observers = self.observers();
        let timeout = self.inner().config.dispose_timeout;
        let total = tracked.len();

        tracing::debug!(count = total, "disposing container");

        let mut failures = Vec::new();
        for Tracked { service, disposer } in tracked {
            let outcome = release(&disposer, timeout).await;
            if let Err(failure) = report(observers.as_ref(), service, outcome) {
                failures.push(failure);
            }
        }

        let cleared = self.clear_singletons();

        tracing::info!(
            released = total - failures.len(),
            failed = failures.len(),
            singletons_cleared = cleared,
            "container disposed"
        );

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::Dispose(failures))
        }
    }

    /// Runs `body` with this container, then disposes it.
    ///
    /// Teardown happens on every exit path. When `body` panics the container
    /// is disposed first and the panic then resumes. A teardown failure after
    /// a successful body is returned as the error; the body's own value
    /// (often a `Result` itself) is passed through untouched otherwise.
    ///
    /// If the returned future is dropped before it completes (a timeout, a
    /// losing `select!` branch, an aborted task) teardown still runs from
    /// `Drop`: synchronous releases happen immediately, the singleton cache
    /// is cleared, and async releases are spawned on the current tokio
    /// runtime. Without a runtime the async releases are skipped with a
    /// warning. Failures on this path are logged, not returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use autowire::{Arguments, Container, DiResult, Injectable, Lifetime};
    ///
    /// struct Session;
    /// impl Injectable for Session {
    ///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Session) }
    /// }
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let container = Container::new();
    /// container.register_self::<Session>(Lifetime::Singleton);
    ///
    /// let resolved = container
    ///     .scoped(|c| async move { c.resolve::<Session>().is_ok() })
    ///     .await
    ///     .unwrap();
    /// assert!(resolved);
    /// assert_eq!(container.cached_singletons(), 0);
    /// # });
    /// ```
    pub async fn scoped<'a, F, Fut, R>(&'a self, body: F) -> DiResult<R>
    where
        F: FnOnce(&'a Container) -> Fut,
        Fut: Future<Output = R> + 'a,
    {
        let mut guard = Teardown {
            container: self,
            armed: true,
        };

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| body(self))) {
            Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
            Err(payload) => Err(payload),
        };

        let disposed = self.dispose().await;
        guard.armed = false;

        match outcome {
            Ok(value) => disposed.map(|()| value),
            Err(payload) => {
                if let Err(err) = disposed {
                    tracing::error!(error = %err, "teardown failed while unwinding");
                }
                panic::resume_unwind(payload)
            }
        }
    }

    /// Teardown for a scope whose future was dropped mid-flight.
    fn dispose_detached(&self) {
        let tracked = self.inner().disposables.lock().take();
        let observers = self.observers();
        let timeout = self.inner().config.dispose_timeout;
        let runtime = tokio::runtime::Handle::try_current().ok();
        let total = tracked.len();

        let mut released = 0;
        let mut spawned = 0;
        let mut skipped = 0;
        for Tracked { service, disposer } in tracked {
            match disposer {
                Disposer::Sync(instance) => {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| instance.dispose()))
                        .unwrap_or_else(|payload| Err(panicked(payload.as_ref())));
                    if report(observers.as_ref(), service, outcome).is_ok() {
                        released += 1;
                    }
                }
                Disposer::Async(instance) => {
                    let Some(handle) = &runtime else {
                        tracing::warn!(service, "no tokio runtime; async release skipped");
                        skipped += 1;
                        continue;
                    };
                    let observers = observers.clone();
                    handle.spawn(async move {
                        let outcome = release(&Disposer::Async(instance), timeout).await;
                        let _ = report(observers.as_ref(), service, outcome);
                    });
                    spawned += 1;
                }
            }
        }

        let cleared = self.clear_singletons();

        tracing::warn!(
            tracked = total,
            released,
            spawned,
            skipped,
            singletons_cleared = cleared,
            "scope dropped before completion; container disposed from drop"
        );
    }

    fn clear_singletons(&self) -> usize {
        let mut singletons = self.inner().singletons.lock();
        let count = singletons.len();
        singletons.clear();
        count
    }
}

/// Disposes the container if a scope's future is dropped before teardown
/// finished.
struct Teardown<'a> {
    container: &'a Container,
    armed: bool,
}

impl Drop for Teardown<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.container.dispose_detached();
        }
    }
}

/// Runs one release, turning panics and timeouts into errors.
async fn release(disposer: &Disposer, timeout: Option<Duration>) -> anyhow::Result<()> {
    let release = AssertUnwindSafe(disposer.release()).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, release).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(anyhow::anyhow!("release timed out after {:?}", limit)),
        },
        None => release.await,
    };
    outcome.unwrap_or_else(|payload| Err(panicked(payload.as_ref())))
}

fn report(
    observers: Option<&Observers>,
    service: &'static str,
    outcome: anyhow::Result<()>,
) -> Result<(), DisposeFailure> {
    if let Some(observers) = observers {
        observers.released(service, outcome.is_ok());
    }
    outcome.map_err(|err| {
        tracing::warn!(service, error = %err, "release failed");
        DisposeFailure {
            service,
            message: format!("{:#}", err),
        }
    })
}

fn panicked(payload: &(dyn std::any::Any + Send)) -> anyhow::Error {
    anyhow::anyhow!("release panicked: {}", panic_message(payload))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
