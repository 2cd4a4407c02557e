use super::{Cache, ForeverCache};
use crate::types::State;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Expiry timer for one URI; `generation` tells a fired timer whether it is
/// still the current one.
struct Timer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    next_generation: u64,
    by_uri: HashMap<String, Timer>,
}

/// A [`ForeverCache`] whose entries expire `ttl` after their last `store`.
///
/// Every `store` restarts the timer for that URI. Timers run as tokio tasks;
/// outside a runtime entries are kept until deleted.
pub struct ShortCache {
    ttl: Duration,
    entries: Arc<ForeverCache>,
    timers: Arc<Mutex<Timers>>,
}

impl ShortCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        ShortCache {
            ttl,
            entries: Arc::new(ForeverCache::new()),
            timers: Arc::new(Mutex::new(Timers::default())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn schedule_expiry(&self, timers: &mut Timers, uri: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("No tokio runtime; {} will not expire", uri);
            return;
        };

        timers.next_generation += 1;
        let generation = timers.next_generation;
        let ttl = self.ttl;
        let entries = self.entries.clone();
        let shared = self.timers.clone();
        let key = uri.clone();

        let handle = runtime.spawn(async move {
            // a zero ttl evicts on the first poll, without the timer driver
            if !ttl.is_zero() {
                tokio::time::sleep(ttl).await;
            }
            let mut timers = shared.lock();
            if timers.by_uri.get(&key).map(|t| t.generation) == Some(generation) {
                timers.by_uri.remove(&key);
                entries.delete(&key);
            }
        });

        if let Some(previous) = timers.by_uri.insert(uri, Timer { generation, handle }) {
            previous.handle.abort();
        }
    }
}

impl Cache for ShortCache {
    fn store(&self, state: Arc<State>) {
        let uri = state.uri.to_string();
        let mut timers = self.timers.lock();
        self.entries.store(state);
        self.schedule_expiry(&mut timers, uri);
    }

    fn get(&self, uri: &str) -> Option<Arc<State>> {
        self.entries.get(uri)
    }

    fn has(&self, uri: &str) -> bool {
        self.entries.has(uri)
    }

    fn delete(&self, uri: &str) {
        let mut timers = self.timers.lock();
        if let Some(timer) = timers.by_uri.remove(uri) {
            timer.handle.abort();
        }
        self.entries.delete(uri);
    }

    fn clear(&self) {
        let mut timers = self.timers.lock();
        for (_, timer) in timers.by_uri.drain() {
            timer.handle.abort();
        }
        self.entries.clear();
    }
}

impl Drop for ShortCache {
    fn drop(&mut self) {
        for (_, timer) in self.timers.lock().by_uri.drain() {
            timer.handle.abort();
        }
    }
}
