//! Core traits for the dependency injection container.

mod dispose;
mod injectable;

pub use dispose::{AsyncDispose, Dispose, Disposer};
pub use injectable::{Arguments, Dependency, Implements, Injectable};
pub(crate) use injectable::{downcast, erase};
