//! Configuration for the hypermedia client.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `user_agent` | `ketting_rs/<version>` | Sent when a request has no `User-Agent` |
//! | `cache` | `Forever` | State cache policy |
//! | `request_timeout_ms` | 30000 | Transport request timeout |
//! | `pool_max_idle_per_host` | 100 | Idle connections kept per host |
//! | `proxy_url` | empty | Route requests through this proxy |
//! | `fallback_to_binary` | true | Parse unknown media types as raw bytes |
//! | `warn_on_deprecation` | true | Install the deprecation warning middleware |
//!
//! # Examples
//!
//! ```
//! use ketting_rs::{CachePolicy, ClientConfig};
//! use std::time::Duration;
//!
//! let config = ClientConfig {
//!     cache: CachePolicy::Short(Duration::from_secs(30)),
//!     ..Default::default()
//! };
//! assert_eq!(config.request_timeout_ms, 30000);
//! ```

use crate::cache::CachePolicy;

/// Default `User-Agent` header value.
pub const DEFAULT_USER_AGENT: &str = concat!("ketting_rs/", env!("CARGO_PKG_VERSION"));

/// Configuration for a [`Client`](crate::Client).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// `User-Agent` for requests that do not carry one.
    pub user_agent: String,

    /// Which cache the client builds.
    ///
    /// `Short` entries expire a fixed time after they were last stored;
    /// `Never` turns every `get` into a network call.
    pub cache: CachePolicy,

    /// Request timeout in milliseconds.
    pub request_timeout_ms: u64,

    /// Maximum idle connections per host in the transport's pool.
    pub pool_max_idle_per_host: usize,

    /// Proxy URL (optional).
    ///
    /// If set, requests will be routed through this proxy.
    pub proxy_url: String,

    /// Build a binary state for media types no representor handles instead
    /// of failing with `UnsupportedFormat`.
    pub fallback_to_binary: bool,

    /// Log a warning for responses that announce deprecation.
    pub warn_on_deprecation: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache: CachePolicy::Forever,
            request_timeout_ms: 30000,
            pool_max_idle_per_host: 100,
            proxy_url: String::new(),
            fallback_to_binary: true,
            warn_on_deprecation: true,
        }
    }
}
