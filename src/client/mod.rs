//! The hypermedia client.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── config    - ClientConfig
//! ├── transport - Transport trait and the reqwest implementation
//! ├── fetcher   - origin-scoped middleware pipeline
//! ├── resource  - Resource handles, verbs and refresh coalescing
//! ├── follow    - lazy FollowOne / FollowMany
//! └── action    - form submission
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Entry point: bookmark, cache, registry of live resources |
//! | [`Resource`] | Handle for one URI; at most one live handle per URI |
//! | [`FollowOne`] / [`FollowMany`] | Awaitable link traversal |
//! | [`Action`] | A form bound to a client |
//! | [`ClientConfig`] | Client configuration options |

mod action;
mod config;
pub mod fetcher;
mod follow;
mod resource;
pub mod transport;

pub use action::Action;
pub use config::{ClientConfig, DEFAULT_USER_AGENT};
pub use fetcher::{Fetcher, RequestInit};
pub use follow::{FollowMany, FollowOne};
pub use resource::{Resource, ResourceEvent};
pub use transport::{ReqwestTransport, Transport};

use crate::cache::Cache;
use crate::error::Result;
use crate::middleware::{AcceptHeader, CacheInvalidation, DeprecationWarning, Middleware};
use crate::representor::{self, Format, FormatRegistry};
use crate::types::{Response, State};
use parking_lot::{Mutex, RwLock};
use resource::ResourceInner;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use url::Url;

pub(crate) struct ClientInner {
    bookmark: Url,
    config: ClientConfig,
    formats: RwLock<FormatRegistry>,
    cache: Arc<dyn Cache>,
    resources: Mutex<HashMap<String, Weak<ResourceInner>>>,
    fetcher: Fetcher,
}

/// Entry point for navigating an API.
///
/// Cloning is cheap and every clone shares the cache, the middleware
/// pipeline and the resource registry.
///
/// ```no_run
/// # async fn run() -> ketting_rs::Result<()> {
/// use ketting_rs::Client;
///
/// let client = Client::new("https://api.example.org/")?;
/// let author = client.follow("author").await?;
/// let state = author.get(Default::default()).await?;
/// println!("{:?}", state.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// Non-owning handle held by the built-in middlewares.
#[derive(Clone)]
pub struct WeakClient(Weak<ClientInner>);

impl WeakClient {
    pub fn upgrade(&self) -> Option<Client> {
        self.0.upgrade().map(|inner| Client { inner })
    }
}

impl Client {
    /// Create a client with default configuration.
    pub fn new(bookmark: &str) -> Result<Self> {
        Self::with_config(bookmark, ClientConfig::default())
    }

    pub fn with_config(bookmark: &str, config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::from_config(&config));
        Self::with_transport(bookmark, config, transport)
    }

    /// Create a client that sends requests through `transport`.
    pub fn with_transport(
        bookmark: &str,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let bookmark = Url::parse(bookmark)?;
        let mut formats = FormatRegistry::default();
        formats.fallback_to_binary = config.fallback_to_binary;

        let inner = Arc::new_cyclic(|weak: &Weak<ClientInner>| {
            let fetcher = Fetcher::new(transport, &config.user_agent);
            fetcher.register_global(Arc::new(AcceptHeader::new(WeakClient(weak.clone()))));
            fetcher.register_global(Arc::new(CacheInvalidation::new(WeakClient(weak.clone()))));
            if config.warn_on_deprecation {
                fetcher.register_global(Arc::new(DeprecationWarning));
            }

            ClientInner {
                bookmark,
                cache: config.cache.build(),
                config,
                formats: RwLock::new(formats),
                resources: Mutex::new(HashMap::new()),
                fetcher,
            }
        });

        tracing::debug!("Created client for {}", inner.bookmark);
        Ok(Client { inner })
    }

    pub fn bookmark(&self) -> &Url {
        &self.inner.bookmark
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.inner.fetcher
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.inner.cache
    }

    pub fn downgrade(&self) -> WeakClient {
        WeakClient(Arc::downgrade(&self.inner))
    }

    /// Resource for `uri`, resolved against the bookmark.
    ///
    /// While a returned handle is alive, every `go` for the same absolute URI
    /// returns that same resource.
    pub fn go(&self, uri: &str) -> Result<Resource> {
        let url = self.inner.bookmark.join(uri)?;
        Ok(self.resource_for(url))
    }

    pub fn go_bookmark(&self) -> Resource {
        self.resource_for(self.inner.bookmark.clone())
    }

    /// Follow `rel` from the bookmark.
    pub fn follow(&self, rel: &str) -> FollowOne {
        self.go_bookmark().follow(rel)
    }

    /// Add a middleware for requests to origins matching `origin`.
    ///
    /// Runs after the built-in middlewares and any registered earlier.
    pub fn use_middleware(&self, middleware: impl Middleware, origin: &str) -> Result<()> {
        self.inner.fetcher.register(Arc::new(middleware), origin)
    }

    /// Register or re-weight a media type.
    pub fn register_format(&self, media_type: &str, q: f32, format: Format) {
        self.inner.formats.write().register(media_type, q, format);
    }

    pub fn accept_header(&self) -> String {
        self.inner.formats.read().accept_header()
    }

    /// Content type used for bodies when neither the caller nor the resource
    /// names one.
    pub fn default_content_type(&self) -> String {
        self.inner.formats.read().default_content_type().to_string()
    }

    /// Store `state` and its embedded states, notifying live resources.
    ///
    /// Embedded states are moved out of the returned state into the cache.
    pub fn cache_state(&self, mut state: State) -> Arc<State> {
        let embedded = state.take_embedded();
        let state = Arc::new(state);

        self.inner.cache.store(state.clone());
        if let Some(resource) = self.live_resource(state.uri.as_str()) {
            resource.emit(ResourceEvent::Update(state.clone()));
        }

        for child in embedded {
            self.cache_state(child);
        }
        state
    }

    /// Drop cache entries, telling live resources they went `Stale` or were
    /// deleted.
    pub fn clear_resource_cache(&self, stale: &[String], deleted: &[String]) {
        for uri in stale {
            self.inner.cache.delete(uri);
            if let Some(resource) = self.live_resource(uri) {
                resource.emit(ResourceEvent::Stale);
            }
        }
        for uri in deleted {
            self.inner.cache.delete(uri);
            if let Some(resource) = self.live_resource(uri) {
                resource.emit(ResourceEvent::Delete);
            }
        }
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Parse a response into a state with the representor its
    /// `Content-Type` selects.
    pub fn state_for_response(&self, uri: Url, response: &Response) -> Result<State> {
        let content_type = crate::protocol::content_type(response.headers());
        let format = self.inner.formats.read().select(content_type.as_deref())?;
        format.parse(&uri, response)
    }

    /// State for a HEAD response: headers and `Link` headers only.
    pub fn head_state_for_response(&self, uri: Url, response: &Response) -> State {
        representor::parse_head(&uri, response)
    }

    fn resource_for(&self, uri: Url) -> Resource {
        let key = uri.to_string();
        let mut resources = self.inner.resources.lock();
        if let Some(inner) = resources.get(&key).and_then(Weak::upgrade) {
            return Resource::from_inner(inner);
        }

        resources.retain(|_, r| r.strong_count() > 0);
        let resource = Resource::new(self.clone(), uri);
        resources.insert(key, resource.downgrade());
        resource
    }

    pub(crate) fn live_resource(&self, uri: &str) -> Option<Resource> {
        let inner = self.inner.resources.lock().get(uri).and_then(Weak::upgrade)?;
        Some(Resource::from_inner(inner))
    }
}
