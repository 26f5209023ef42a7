//! Source registry: opaque source id to adapter lookup.
//!
//! The gateway layer owns an instance of this registry and resolves the
//! source id carried by each API definition before invoking the export
//! engine. The engine itself never touches the registry; it receives the
//! resolved adapter as a parameter, so no process-wide state leaks into
//! per-request pipelines.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use privgate_core::{PrivGateError, Result};

use super::SourceAdapter;

/// Thread-safe mapping from source id to connected adapter.
#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, Arc<dyn SourceAdapter>>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the adapter for a source id.
    pub fn register(&self, source_id: impl Into<String>, adapter: Arc<dyn SourceAdapter>) {
        let source_id = source_id.into();
        tracing::debug!("Registering source '{}'", source_id);
        self.sources
            .write()
            .expect("source registry lock poisoned")
            .insert(source_id, adapter);
    }

    /// Resolves a source id to its adapter.
    ///
    /// # Errors
    /// Returns a configuration error for an unknown id.
    pub fn get(&self, source_id: &str) -> Result<Arc<dyn SourceAdapter>> {
        self.sources
            .read()
            .expect("source registry lock poisoned")
            .get(source_id)
            .cloned()
            .ok_or_else(|| {
                PrivGateError::configuration(format!("Unknown source id: {}", source_id))
            })
    }

    /// Removes a source, returning whether it was present.
    pub fn remove(&self, source_id: &str) -> bool {
        self.sources
            .write()
            .expect("source registry lock poisoned")
            .remove(source_id)
            .is_some()
    }
}
