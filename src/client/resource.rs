//! Resource handles.

use super::{Action, Client, FollowMany, FollowOne};
use crate::error::{Error, Result};
use crate::protocol::request_signature;
use crate::types::{Link, Request, RequestOptions, Response, State};
use bytes::Bytes;
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use http::header::LOCATION;
use http::{HeaderMap, Method, StatusCode};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use url::Url;

const EVENT_CAPACITY: usize = 16;

/// Something happened to a resource's cached state.
#[derive(Clone, Debug)]
pub enum ResourceEvent {
    /// A new state was stored.
    Update(Arc<State>),
    /// The cached state was dropped; the next `get` goes to the network.
    Stale,
    /// The resource was deleted on the server.
    Delete,
}

type Refresh = Shared<BoxFuture<'static, Result<Arc<State>>>>;

pub(crate) struct ResourceInner {
    uri: Url,
    client: Client,
    content_type: Mutex<Option<String>>,
    events: broadcast::Sender<ResourceEvent>,
    in_flight: Mutex<HashMap<String, Refresh>>,
}

/// A handle for one URI.
///
/// Obtained from [`Client::go`] or by following links. Cloning shares the
/// handle.
#[derive(Clone)]
pub struct Resource {
    inner: Arc<ResourceInner>,
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("uri", &self.inner.uri.as_str())
            .finish()
    }
}

impl Resource {
    pub(crate) fn new(client: Client, uri: Url) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Resource {
            inner: Arc::new(ResourceInner {
                uri,
                client,
                content_type: Mutex::new(None),
                events,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<ResourceInner>) -> Self {
        Resource { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<ResourceInner> {
        Arc::downgrade(&self.inner)
    }

    /// Whether two handles are the same resource.
    pub fn ptr_eq(a: &Resource, b: &Resource) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn uri(&self) -> &Url {
        &self.inner.uri
    }

    pub fn client(&self) -> &Client {
        &self.inner.client
    }

    /// Content type remembered from the link that led here, or set by hand.
    pub fn content_type(&self) -> Option<String> {
        self.inner.content_type.lock().clone()
    }

    pub fn set_content_type(&self, content_type: impl Into<String>) {
        *self.inner.content_type.lock() = Some(content_type.into());
    }

    /// Receive `Update`, `Stale` and `Delete` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent> {
        self.inner.events.subscribe()
    }

    pub(crate) fn emit(&self, event: ResourceEvent) {
        // no receivers is fine
        let _ = self.inner.events.send(event);
    }

    // ========== Reads ==========

    /// Current state: the cached one unless `options` carries headers,
    /// otherwise a refresh.
    pub async fn get(&self, options: RequestOptions) -> Result<Arc<State>> {
        if !options.has_headers() {
            if let Some(state) = self.inner.client.cache().get(self.inner.uri.as_str()) {
                return Ok(state);
            }
        }
        self.refresh(options).await
    }

    /// Fetch the state from the network and cache it.
    ///
    /// Concurrent refreshes with the same method and headers share a single
    /// request and resolve to the same `Arc<State>`.
    pub async fn refresh(&self, options: RequestOptions) -> Result<Arc<State>> {
        options.validate()?;
        self.coalesced(Method::GET, options.headers).await
    }

    /// The cached state when `options` carries no headers, otherwise a HEAD
    /// request. A HEAD result holds headers and `Link` header links only and
    /// is never cached.
    pub async fn head(&self, options: RequestOptions) -> Result<Arc<State>> {
        if !options.has_headers() {
            if let Some(state) = self.inner.client.cache().get(self.inner.uri.as_str()) {
                return Ok(state);
            }
        }
        options.validate()?;
        self.coalesced(Method::HEAD, options.headers).await
    }

    fn coalesced(&self, method: Method, headers: HeaderMap) -> Refresh {
        let key = request_signature(&method, &headers);
        let mut in_flight = self.inner.in_flight.lock();
        if let Some(pending) = in_flight.get(&key) {
            tracing::debug!("Joining in-flight {} of {}", method, self.inner.uri);
            return pending.clone();
        }

        let client = self.inner.client.clone();
        let uri = self.inner.uri.clone();
        let owner = self.downgrade();
        let k = key.clone();
        let pending = async move {
            let result = fetch_state(&client, uri, method, headers).await;
            if let Some(owner) = owner.upgrade() {
                owner.in_flight.lock().remove(&k);
            }
            result
        }
        .boxed()
        .shared();

        in_flight.insert(key, pending.clone());
        pending
    }

    /// Link `rel` on the current state.
    pub async fn link(&self, rel: &str) -> Result<Link> {
        let state = self.get(RequestOptions::default()).await?;
        Ok(state.require_link(rel)?.clone())
    }

    /// Every link `rel` on the current state.
    pub async fn links(&self, rel: &str) -> Result<Vec<Link>> {
        let state = self.get(RequestOptions::default()).await?;
        Ok(state.links.get_many(rel).to_vec())
    }

    pub async fn has_link(&self, rel: &str) -> Result<bool> {
        let state = self.get(RequestOptions::default()).await?;
        Ok(state.links.has(rel))
    }

    // ========== Writes ==========

    /// Replace the resource with a raw body.
    pub async fn put(&self, options: RequestOptions) -> Result<()> {
        self.send(Method::PUT, options).await?;
        Ok(())
    }

    /// Replace the resource with `state`, then cache what was sent.
    pub async fn put_state(&self, state: State) -> Result<()> {
        let body = state.serialize_body()?;
        let mut options = RequestOptions::new().with_body(body);
        if let Some(content_type) = state.content_type() {
            options = options.with_content_type(content_type);
        }
        self.send(Method::PUT, options).await?;
        self.inner.client.cache_state(state);
        Ok(())
    }

    pub async fn patch(&self, options: RequestOptions) -> Result<()> {
        self.send(Method::PATCH, options).await?;
        Ok(())
    }

    /// POST and parse the response. `None` for a bodiless 204 or 205.
    pub async fn post(&self, options: RequestOptions) -> Result<Option<State>> {
        let response = self.send(Method::POST, options).await?;
        let status = response.status();
        if (status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT)
            && response.body().is_empty()
        {
            return Ok(None);
        }
        let state = self
            .inner
            .client
            .state_for_response(self.inner.uri.clone(), &response)?;
        Ok(Some(state))
    }

    /// POST, then go to the created resource (`201` with `Location`) or stay
    /// here (`205`).
    pub async fn post_follow(&self, options: RequestOptions) -> Result<Resource> {
        let response = self.send(Method::POST, options).await?;
        match response.status() {
            StatusCode::CREATED => {
                let location = location(&response)
                    .ok_or(Error::UnexpectedStatus(StatusCode::CREATED.as_u16()))?;
                let target = self.inner.uri.join(location)?;
                self.inner.client.go(target.as_str())
            }
            StatusCode::RESET_CONTENT => Ok(self.clone()),
            other => Err(Error::UnexpectedStatus(other.as_u16())),
        }
    }

    pub async fn delete(&self) -> Result<()> {
        self.send(Method::DELETE, RequestOptions::default()).await?;
        Ok(())
    }

    async fn send(&self, method: Method, options: RequestOptions) -> Result<Response> {
        let content_type = options
            .content_type
            .clone()
            .or_else(|| self.content_type())
            .unwrap_or_else(|| self.inner.client.default_content_type());
        let headers = options.request_headers(&content_type)?;

        let mut request: Request = http::Request::builder()
            .method(method)
            .uri(self.inner.uri.as_str())
            .body(options.body.unwrap_or_default())?;
        *request.headers_mut() = headers;

        self.inner.client.fetcher().fetch_or_error(request).await
    }

    // ========== Navigation ==========

    pub fn follow(&self, rel: &str) -> FollowOne {
        FollowOne::new(future::ready(Ok(self.clone())).boxed(), rel)
    }

    /// Follow a templated link, expanding it with `variables`.
    pub fn follow_with(&self, rel: &str, variables: Map<String, Value>) -> FollowOne {
        self.follow(rel).with_variables(variables)
    }

    pub fn follow_all(&self, rel: &str) -> FollowMany {
        FollowMany::new(future::ready(Ok(self.clone())).boxed(), rel)
    }

    /// Form `name` (or the first one) on the current state.
    pub async fn action(&self, name: Option<&str>) -> Result<Action> {
        let state = self.get(RequestOptions::default()).await?;
        state.action(&self.inner.client, name)
    }
}

async fn fetch_state(
    client: &Client,
    uri: Url,
    method: Method,
    headers: HeaderMap,
) -> Result<Arc<State>> {
    let mut request: Request = http::Request::builder()
        .method(method.clone())
        .uri(uri.as_str())
        .body(Bytes::new())?;
    *request.headers_mut() = headers;

    let response = client.fetcher().fetch_or_error(request).await?;
    if method == Method::HEAD {
        return Ok(Arc::new(client.head_state_for_response(uri, &response)));
    }
    let state = client.state_for_response(uri, &response)?;
    Ok(client.cache_state(state))
}

fn location(response: &Response) -> Option<&str> {
    response.headers().get(LOCATION)?.to_str().ok()
}
