use super::Cache;
use crate::types::State;
use std::sync::Arc;

/// A cache that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverCache;

impl Cache for NeverCache {
    fn store(&self, _state: Arc<State>) {}

    fn get(&self, _uri: &str) -> Option<Arc<State>> {
        None
    }

    fn has(&self, _uri: &str) -> bool {
        false
    }

    fn delete(&self, _uri: &str) {}

    fn clear(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_util::state;

    #[test]
    fn test_never_stores() {
        let cache = NeverCache;
        cache.store(state("https://x/a"));
        assert!(!cache.has("https://x/a"));
        assert!(cache.get("https://x/a").is_none());
    }
}
