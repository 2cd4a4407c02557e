//! State caches.
//!
//! All policies share the [`Cache`] trait, keyed by absolute URI:
//!
//! - [`NeverCache`]: stores nothing. Every `get` goes to the network and
//!   embedded resources are not primed.
//! - [`ForeverCache`]: keeps entries until they are deleted or invalidated.
//! - [`ShortCache`]: a `ForeverCache` whose entries expire a fixed time after
//!   their last `store`.
//!
//! The caches do not invalidate anything by themselves; the client's
//! invalidation middleware deletes entries after unsafe requests.

mod forever;
mod never;
mod short;

pub use forever::ForeverCache;
pub use never::NeverCache;
pub use short::ShortCache;

use crate::types::State;
use std::sync::Arc;
use std::time::Duration;

/// Storage for states, keyed by absolute URI.
pub trait Cache: Send + Sync {
    /// Insert or replace the state for `state.uri`.
    fn store(&self, state: Arc<State>);

    fn get(&self, uri: &str) -> Option<Arc<State>>;

    fn has(&self, uri: &str) -> bool;

    fn delete(&self, uri: &str);

    fn clear(&self);
}

/// Which cache a client builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CachePolicy {
    Never,
    #[default]
    Forever,
    /// Entries expire this long after they were last stored.
    Short(Duration),
}

impl CachePolicy {
    pub fn build(self) -> Arc<dyn Cache> {
        match self {
            CachePolicy::Never => Arc::new(NeverCache),
            CachePolicy::Forever => Arc::new(ForeverCache::new()),
            CachePolicy::Short(ttl) => Arc::new(ShortCache::new(ttl)),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use crate::representor::Format;
    use crate::types::{Representation, State};
    use std::sync::Arc;
    use url::Url;

    pub fn state(uri: &str) -> Arc<State> {
        Arc::new(State::new(
            Url::parse(uri).unwrap(),
            Format::Json,
            Representation::Empty,
        ))
    }
}
