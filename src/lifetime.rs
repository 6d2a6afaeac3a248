//! Service lifetime definitions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Service lifetimes controlling instance caching behavior
///
/// # Examples
///
/// ```rust
/// use autowire::{Arguments, Container, DiResult, Injectable, Lifetime};
/// use std::sync::Arc;
///
/// struct Clock;
/// impl Injectable for Clock {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Clock) }
/// }
///
/// struct Request;
/// impl Injectable for Request {
///     fn construct(_: &mut Arguments) -> DiResult<Self> { Ok(Request) }
/// }
///
/// let container = Container::new();
/// container.register_self::<Clock>(Lifetime::Singleton);
/// container.register_self::<Request>(Lifetime::Transient);
///
/// // Singleton: same instance on every resolution
/// let a = container.resolve::<Clock>().unwrap();
/// let b = container.resolve::<Clock>().unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// // Transient: new instance every time
/// let c = container.resolve::<Request>().unwrap();
/// let d = container.resolve::<Request>().unwrap();
/// assert!(!Arc::ptr_eq(&c, &d));
///
/// assert_eq!(Lifetime::default(), Lifetime::Singleton);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Lifetime {
    /// Single instance per container, cached until the container is disposed
    ///
    /// Singleton services are created when first requested and then cached.
    /// Every caller of the same container observes the same instance until
    /// disposal clears the cache.
    #[default]
    Singleton,
    /// New instance per resolution, never cached
    ///
    /// Transient services create a fresh instance every time they're
    /// requested. Their singleton dependencies are still shared.
    Transient,
}

impl Lifetime {
    /// Lowercase name used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifetime::Singleton => "singleton",
            Lifetime::Transient => "transient",
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Lifetime {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Lifetime::Singleton),
            "transient" => Ok(Lifetime::Transient),
            other => Err(DiError::Config(format!("unknown lifetime `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Singleton".parse::<Lifetime>().unwrap(), Lifetime::Singleton);
        assert_eq!(" TRANSIENT ".parse::<Lifetime>().unwrap(), Lifetime::Transient);
        assert!("scoped".parse::<Lifetime>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for lifetime in [Lifetime::Singleton, Lifetime::Transient] {
            assert_eq!(lifetime.to_string().parse::<Lifetime>().unwrap(), lifetime);
        }
    }
}
