use super::{Middleware, Next};
use crate::client::WeakClient;
use crate::error::Result;
use crate::protocol::constants::rels;
use crate::protocol::{is_no_store, is_safe_method, parse_link_headers};
use crate::types::{Request, Response};
use async_trait::async_trait;
use http::header::{CONTENT_LOCATION, LOCATION};
use http::Method;
use url::Url;

/// Keeps the client's cache honest after unsafe requests.
///
/// For every response to a method other than GET, HEAD, OPTIONS or TRACE:
///
/// | Source | Effect |
/// |--------|--------|
/// | request URI | deleted; `Delete` event for DELETE, `Stale` otherwise |
/// | `Link: rel="invalidates"` | deleted, `Stale` |
/// | `Location` | deleted, `Stale` |
/// | `Content-Location` | body cached as that URI's state, `Update` (`Stale` with `no-store`) |
pub struct CacheInvalidation {
    client: WeakClient,
}

impl CacheInvalidation {
    pub fn new(client: WeakClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Middleware for CacheInvalidation {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let method = request.method().clone();
        let target = request.uri().to_string();
        let response = next.run(request).await?;

        if is_safe_method(&method) {
            return Ok(response);
        }
        let Some(client) = self.client.upgrade() else {
            return Ok(response);
        };
        let base = Url::parse(&target)?;

        let mut stale = Vec::new();
        let mut deleted = Vec::new();
        if method == Method::DELETE {
            deleted.push(base.to_string());
        } else {
            stale.push(base.to_string());
        }

        for link in parse_link_headers(response.headers()) {
            if link.rel != rels::INVALIDATES {
                continue;
            }
            if let Ok(url) = base.join(&link.href) {
                stale.push(url.to_string());
            }
        }

        if let Some(url) = header_url(&base, &response, LOCATION) {
            stale.push(url.to_string());
        }

        let mut fresh = None;
        if let Some(url) = header_url(&base, &response, CONTENT_LOCATION) {
            if response.status().is_success() && !is_no_store(response.headers()) {
                match client.state_for_response(url.clone(), &response) {
                    Ok(state) => fresh = Some(state),
                    Err(e) => {
                        tracing::debug!("Cannot cache Content-Location body of {}: {}", url, e);
                        stale.push(url.to_string());
                    }
                }
            } else {
                stale.push(url.to_string());
            }
        }

        tracing::debug!(
            "Invalidating after {} {}: stale={:?} deleted={:?}",
            method,
            target,
            stale,
            deleted
        );
        client.clear_resource_cache(&stale, &deleted);
        if let Some(state) = fresh {
            client.cache_state(state);
        }

        Ok(response)
    }
}

fn header_url(base: &Url, response: &Response, name: http::HeaderName) -> Option<Url> {
    let value = response.headers().get(name)?.to_str().ok()?;
    base.join(value).ok()
}
