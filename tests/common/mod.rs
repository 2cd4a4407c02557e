//! Scripted in-memory transport shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use ketting_rs::{types::clone_request, Client, ClientConfig, Request, Response, Result, Transport};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const BASE: &str = "https://api.example/";

type Handler = Box<dyn Fn(&Request) -> Response + Send + Sync>;

struct Route {
    method: Method,
    url: String,
    handler: Handler,
}

/// Answers requests from registered routes; anything else gets a 404.
///
/// Later routes for the same method and URL take precedence.
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    log: Mutex<Vec<Request>>,
    delay: Mutex<Duration>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(MockTransport {
            routes: Mutex::new(Vec::new()),
            log: Mutex::new(Vec::new()),
            delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn on<F>(&self, method: Method, path: &str, handler: F)
    where
        F: Fn(&Request) -> Response + Send + Sync + 'static,
    {
        self.routes.lock().push(Route {
            method,
            url: url(path),
            handler: Box::new(handler),
        });
    }

    /// Serve the same response every time.
    pub fn reply(&self, method: Method, path: &str, response: fn() -> Response) {
        self.on(method, path, move |_| response());
    }

    /// Delay every response, to keep requests in flight.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().iter().map(clone_request).collect()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        let url = url(path);
        self.log
            .lock()
            .iter()
            .filter(|r| r.method() == method && r.uri().to_string() == url)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<Request> {
        let url = url(path);
        self.log
            .lock()
            .iter()
            .rev()
            .find(|r| r.method() == method && r.uri().to_string() == url)
            .map(clone_request)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.log.lock().push(clone_request(&request));

        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let target = request.uri().to_string();
        let routes = self.routes.lock();
        let response = routes
            .iter()
            .rev()
            .find(|r| r.method == request.method() && r.url == target)
            .map(|r| (r.handler)(&request))
            .unwrap_or_else(|| status(404));
        Ok(response)
    }
}

pub fn url(path: &str) -> String {
    url::Url::parse(BASE)
        .and_then(|base| base.join(path))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| path.to_string())
}

pub fn client(mock: &Arc<MockTransport>) -> Client {
    client_with(mock, ClientConfig::default())
}

pub fn client_with(mock: &Arc<MockTransport>, config: ClientConfig) -> Client {
    Client::with_transport(BASE, config, mock.clone()).unwrap()
}

pub fn status(code: u16) -> Response {
    http::Response::builder()
        .status(code)
        .body(Bytes::new())
        .unwrap()
}

pub fn body(code: u16, content_type: &str, value: &Value) -> Response {
    http::Response::builder()
        .status(code)
        .header("content-type", content_type)
        .body(Bytes::from(serde_json::to_vec(value).unwrap()))
        .unwrap()
}

pub fn hal(value: Value) -> Response {
    body(200, "application/hal+json", &value)
}

pub fn json(value: Value) -> Response {
    body(200, "application/json", &value)
}

/// Copy of `response` with an extra header.
pub fn with_header(mut response: Response, name: &'static str, value: &str) -> Response {
    response
        .headers_mut()
        .append(name, http::HeaderValue::from_str(value).unwrap());
    response
}
