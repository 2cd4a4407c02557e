use super::Cache;
use crate::types::State;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Keeps every stored state until it is deleted.
#[derive(Debug, Default)]
pub struct ForeverCache {
    entries: Mutex<HashMap<String, Arc<State>>>,
}

impl ForeverCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Cache for ForeverCache {
    fn store(&self, state: Arc<State>) {
        self.entries.lock().insert(state.uri.to_string(), state);
    }

    fn get(&self, uri: &str) -> Option<Arc<State>> {
        self.entries.lock().get(uri).cloned()
    }

    fn has(&self, uri: &str) -> bool {
        self.entries.lock().contains_key(uri)
    }

    fn delete(&self, uri: &str) {
        self.entries.lock().remove(uri);
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }
}
