//! Resolution path tracking for cycle and depth detection.

use crate::error::{DiError, DiResult};
use crate::key::Key;

/// Default maximum resolution depth.
///
/// Resolution recurses once per link, so the limit has to fit a default 2 MiB
/// thread stack in an unoptimised build.
pub(crate) const MAX_DEPTH: usize = 128;

/// Stack of identities currently being constructed, outermost first.
///
/// The path is threaded explicitly through one `resolve` call tree, so every
/// call tree has its own path and nested resolutions on other threads never
/// interfere.
pub(crate) struct ResolutionPath {
    stack: Vec<Key>,
    max_depth: usize,
}

impl ResolutionPath {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth,
        }
    }

    /// Pushes `key`, failing when it is already being constructed or the
    /// path is full.
    pub(crate) fn enter(&mut self, key: Key) -> DiResult<()> {
        // Circular detection BEFORE pushing the new key
        if self.stack.contains(&key) {
            let mut path: Vec<&'static str> = self.stack.iter().map(Key::display_name).collect();
            path.push(key.display_name());
            return Err(DiError::Circular(path));
        }

        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }

        tracing::trace!(service = key.display_name(), depth = self.stack.len(), "entering resolution");
        self.stack.push(key);
        Ok(())
    }

    pub(crate) fn exit(&mut self, key: Key) {
        let last = self.stack.pop();
        debug_assert_eq!(last, Some(key));
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }
}
