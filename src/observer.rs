//! Diagnostic observers for dependency injection traceability.
//!
//! Observers receive resolution and teardown events, enabling structured
//! tracing, performance monitoring and debugging of object graphs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::Key;

/// Observer trait for dependency injection events.
///
/// Observer calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use autowire::{Container, DiObserver, Key};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct PrintObserver;
///
/// impl DiObserver for PrintObserver {
///     fn resolving(&self, key: &Key) {
///         println!("Resolving: {}", key.display_name());
///     }
///
///     fn resolved(&self, key: &Key, duration: Duration) {
///         println!("Resolved: {} in {:?}", key.display_name(), duration);
///     }
/// }
///
/// let container = Container::new();
/// container.add_observer(Arc::new(PrintObserver));
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a binding is constructed (not on singleton cache hits).
    fn resolving(&self, key: &Key);

    /// Called after a new instance was constructed.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when resolving `key` failed.
    fn resolution_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }

    /// Called after a tracked instance's release operation completed.
    fn released(&self, service: &'static str, success: bool) {
        let _ = (service, success);
    }
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    /// Returns true if any observers are registered.
    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }

    pub(crate) fn released(&self, service: &'static str, success: bool) {
        for observer in &self.observers {
            observer.released(service, success);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// Resolutions are logged at `debug`, failures at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    pub fn new() -> Self {
        Self
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!(service = key.display_name(), "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(service = key.display_name(), elapsed = ?duration, "resolved");
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(service = key.display_name(), %error, "resolution failed");
    }

    fn released(&self, service: &'static str, success: bool) {
        tracing::debug!(service, success, "released");
    }
}

/// Observer that keeps resolution and teardown counters.
///
/// # Examples
///
/// ```
/// use autowire::{Arguments, Container, DiResult, Injectable, Lifetime, MetricsObserver};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Clock) }
/// }
///
/// let metrics = Arc::new(MetricsObserver::new());
/// let container = Container::new();
/// container.add_observer(metrics.clone());
/// container.register_self::<Clock>(Lifetime::Transient);
///
/// container.resolve::<Clock>().unwrap();
/// container.resolve::<Clock>().unwrap();
/// assert_eq!(metrics.resolution_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolution_count: AtomicU64,
    failure_count: AtomicU64,
    release_count: AtomicU64,
    total_resolution_nanos: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of constructed instances.
    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    /// Number of failed top-level resolutions.
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Number of completed release operations.
    pub fn release_count(&self) -> u64 {
        self.release_count.load(Ordering::Relaxed)
    }

    /// Total time spent constructing instances.
    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_nanos.load(Ordering::Relaxed))
    }

    /// Resets all counters.
    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.release_count.store(0, Ordering::Relaxed);
        self.total_resolution_nanos.store(0, Ordering::Relaxed);
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn resolution_failed(&self, _key: &Key, _error: &DiError) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn released(&self, _service: &'static str, _success: bool) {
        self.release_count.fetch_add(1, Ordering::Relaxed);
    }
}
