//! Internal implementation details.

pub(crate) mod dispose_bag;
pub(crate) mod path;

pub(crate) use dispose_bag::{DisposeBag, Tracked};
pub(crate) use path::{ResolutionPath, MAX_DEPTH};
