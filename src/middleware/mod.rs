//! Fetch middleware.
//!
//! A [`Middleware`] sees every request the client sends to a matching origin
//! and decides how to pass it on: it may rewrite the request, call
//! [`Next::run`] zero, one or more times, and inspect or replace the
//! response.
//!
//! ```text
//! request → mw1 → mw2 → ... → terminal (User-Agent, transport)
//! ```
//!
//! The client installs [`AcceptHeader`], [`CacheInvalidation`] and
//! [`DeprecationWarning`] itself; the authentication middlewares are opt-in.

mod accept;
mod auth;
mod cache;
mod oauth2;
mod warning;

pub use accept::AcceptHeader;
pub use auth::{BasicAuth, BearerAuth};
pub use cache::CacheInvalidation;
pub use oauth2::{OAuth2, OAuth2Token, TokenSource};
pub use warning::DeprecationWarning;

use crate::client::fetcher::Terminal;
use crate::error::Result;
use crate::types::{Request, Response};
use async_trait::async_trait;
use std::sync::Arc;

/// A stage of the fetch pipeline.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    /// Handle `request`, delegating to the rest of the chain through `next`.
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response>;
}

/// Lets a caller keep a handle on a middleware after registering it.
#[async_trait]
impl<M: Middleware + ?Sized> Middleware for Arc<M> {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        (**self).handle(request, next).await
    }
}

/// The remainder of a middleware chain.
///
/// `Next` is `Copy`, so a middleware can run the rest of the chain again,
/// e.g. to retry with fresh credentials.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    terminal: &'a Terminal,
}

impl<'a> Next<'a> {
    pub(crate) fn new(middlewares: &'a [Arc<dyn Middleware>], terminal: &'a Terminal) -> Self {
        Next {
            middlewares,
            terminal,
        }
    }

    pub async fn run(self, request: Request) -> Result<Response> {
        match self.middlewares.split_first() {
            Some((current, rest)) => {
                current
                    .handle(request, Next::new(rest, self.terminal))
                    .await
            }
            None => self.terminal.send(request).await,
        }
    }
}
