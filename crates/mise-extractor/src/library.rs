//! Live handle on the current pattern library version

use mise_domain::PatternLibraryVersion;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

/// Versioned, read-mostly pattern library
///
/// Readers take an `Arc` snapshot and keep it for a whole parse. Publishing
/// swaps the pointer; snapshots already handed out are never touched.
#[derive(Debug)]
pub struct PatternLibrary {
    current: RwLock<Arc<PatternLibraryVersion>>,
}

impl PatternLibrary {
    /// Library starting at the given version
    pub fn new(initial: PatternLibraryVersion) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// Empty bootstrap library (version 0)
    pub fn empty() -> Self {
        Self::new(PatternLibraryVersion::empty())
    }

    /// Snapshot of the current version
    pub fn current(&self) -> Arc<PatternLibraryVersion> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Current version number
    pub fn version(&self) -> u64 {
        self.current().version
    }

    /// Swap in a newer version
    ///
    /// Returns false and keeps the current version when `next` is not
    /// strictly newer.
    pub fn publish(&self, next: PatternLibraryVersion) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if next.version <= guard.version {
            return false;
        }
        info!(
            "Publishing pattern library v{} ({} active rules, replaces v{})",
            next.version,
            next.active_rule_count(),
            guard.version
        );
        *guard = Arc::new(next);
        true
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::empty()
    }
}
