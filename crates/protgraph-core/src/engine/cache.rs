//! Content-addressed cache of external tool outputs.
//!
//! Entries are keyed by tool and the SHA-256 digest of the tool's input, so two structures
//! with identical content share one tool run. Each key is computed at most once while a run
//! is in flight; concurrent callers for the same key wait for that run instead of starting
//! their own.

use super::annotations::{ToolKind, ToolOutput};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub tool: ToolKind,
    /// Hex-encoded SHA-256 of the tool input.
    pub digest: String,
}

impl CacheKey {
    pub fn new(tool: ToolKind, input: &[u8]) -> Self {
        Self {
            tool,
            digest: hex::encode(Sha256::digest(input)),
        }
    }
}

#[derive(Debug, Default)]
pub struct ToolOutputCache {
    entries: DashMap<CacheKey, Arc<OnceLock<ToolOutput>>>,
}

impl ToolOutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached output for `input`, running `run` to produce it on a miss.
    ///
    /// Failed and timed-out outputs are returned to the caller but not retained, so a later
    /// call retries the tool.
    pub fn get_or_run<F>(&self, tool: ToolKind, input: &[u8], run: F) -> ToolOutput
    where
        F: FnOnce() -> ToolOutput,
    {
        let key = CacheKey::new(tool, input);
        // The map guard must be released before `run`, which may be slow.
        let cell = Arc::clone(self.entries.entry(key.clone()).or_default().value());

        let mut computed = false;
        let output = cell
            .get_or_init(|| {
                computed = true;
                run()
            })
            .clone();

        if computed {
            debug!(tool = %tool, digest = %key.digest, "Cached tool output");
        }
        if !output.is_completed() {
            self.entries
                .remove_if(&key, |_, stored| Arc::ptr_eq(stored, &cell));
        }
        output
    }

    pub fn get(&self, tool: ToolKind, input: &[u8]) -> Option<ToolOutput> {
        self.entries
            .get(&CacheKey::new(tool, input))
            .and_then(|cell| cell.get().cloned())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
