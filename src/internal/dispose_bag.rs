//! Internal disposal bag tracking release operations in construction order.

use std::collections::HashSet;

use crate::traits::Disposer;

/// A release operation together with the identity it was constructed for.
pub(crate) struct Tracked {
    pub(crate) service: &'static str,
    pub(crate) disposer: Disposer,
}

/// Instances exposing a release capability, in insertion order.
///
/// Instances are tracked by reference: pushing the same instance twice keeps
/// a single entry.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<Tracked>,
    addrs: HashSet<usize>,
}

impl DisposeBag {
    /// Tracks `disposer`, returning `false` if the instance was already tracked.
    pub(crate) fn push(&mut self, service: &'static str, disposer: Disposer) -> bool {
        if !self.addrs.insert(disposer.addr() as usize) {
            return false;
        }
        self.entries.push(Tracked { service, disposer });
        true
    }

    /// Empties the bag, handing back entries in insertion order.
    pub(crate) fn take(&mut self) -> Vec<Tracked> {
        self.addrs.clear();
        std::mem::take(&mut self.entries)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the bag is empty (no disposers registered).
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
