//! # autowire
//!
//! Type-keyed dependency injection with constructor auto-wiring and ordered teardown.
//!
//! ## Features
//!
//! - **Constructor auto-wiring**: implementations declare their parameters once, the container resolves them recursively
//! - **Two lifetimes**: Singleton (one cached instance) and Transient (fresh on every resolution)
//! - **Trait identities**: resolve `dyn Trait` to whichever implementation is bound
//! - **Circular dependency detection**: cycles fail with the full resolution path
//! - **Ordered teardown**: instances that need cleanup are released in construction order, sync or async
//! - **Auto-registration**: types marked with [`injectable!`] are discovered per module
//!
//! ## Quick Start
//!
//! ```rust
//! use autowire::{Arguments, Container, Dependency, DiResult, Injectable, Lifetime};
//! use std::sync::Arc;
//!
//! struct Database {
//!     connection_string: String,
//! }
//!
//! impl Injectable for Database {
//!     fn construct(_: &mut Arguments) -> DiResult<Self> {
//!         Ok(Database { connection_string: "postgres://localhost".to_string() })
//!     }
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! impl Injectable for UserService {
//!     fn dependencies() -> Vec<Dependency> {
//!         vec![Dependency::typed::<Database>("db")]
//!     }
//!
//!     fn construct(args: &mut Arguments) -> DiResult<Self> {
//!         Ok(UserService { db: args.take("db")? })
//!     }
//! }
//!
//! let container = Container::new();
//! container.register_self::<Database>(Lifetime::Singleton);
//! container.register_self::<UserService>(Lifetime::Transient);
//!
//! let a = container.resolve::<UserService>().unwrap();
//! let b = container.resolve::<UserService>().unwrap();
//! assert!(!Arc::ptr_eq(&a, &b));
//! assert!(Arc::ptr_eq(&a.db, &b.db));
//! assert_eq!(a.db.connection_string, "postgres://localhost");
//! ```
//!
//! ## Teardown
//!
//! Implementations that hold resources return a [`Disposer`] from
//! [`Injectable::disposer`]. [`Container::dispose`] releases them in the order
//! they were constructed and clears the singleton cache;
//! [`Container::scoped`] does the same when a body finishes, including when
//! it panics.
//!
//! ```rust
//! use autowire::{Arguments, AsyncDispose, Container, DiResult, Disposer, Injectable, Lifetime};
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct Connection;
//!
//! #[async_trait]
//! impl AsyncDispose for Connection {
//!     async fn dispose(&self) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! impl Injectable for Connection {
//!     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Connection) }
//!     fn disposer(this: &Arc<Self>) -> Option<Disposer> {
//!         Some(Disposer::asynchronous(this.clone()))
//!     }
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let container = Container::new();
//! container.register_self::<Connection>(Lifetime::Singleton);
//!
//! container
//!     .scoped(|c| async move {
//!         c.resolve::<Connection>().unwrap();
//!         assert_eq!(c.tracked_disposables(), 1);
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(container.tracked_disposables(), 0);
//! # });
//! ```

// Module declarations
pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod lifetime;
pub mod observer;
pub mod scan;
pub mod traits;

mod macros;

// Internal modules
mod internal;
mod registration;

// Re-export core types
pub use config::ContainerConfig;
pub use container::Container;
pub use descriptors::ServiceDescriptor;
pub use error::{DiError, DiResult, DisposeFailure};
pub use key::{key_of, Key};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, MetricsObserver, TracingObserver};
pub use scan::{InjectableEntry, Namespace};
pub use traits::{Arguments, AsyncDispose, Dependency, Dispose, Disposer, Implements, Injectable};

#[doc(hidden)]
pub use inventory;
