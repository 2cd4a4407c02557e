use super::{Middleware, Next};
use crate::client::WeakClient;
use crate::error::Result;
use crate::types::{Request, Response};
use async_trait::async_trait;
use http::header::ACCEPT;
use http::HeaderValue;

/// Fills in `Accept` from the client's format registry when the caller did
/// not set one.
pub struct AcceptHeader {
    client: WeakClient,
}

impl AcceptHeader {
    pub fn new(client: WeakClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Middleware for AcceptHeader {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        if !request.headers().contains_key(ACCEPT) {
            if let Some(client) = self.client.upgrade() {
                if let Ok(value) = HeaderValue::try_from(client.accept_header()) {
                    request.headers_mut().insert(ACCEPT, value);
                }
            }
        }
        next.run(request).await
    }
}
