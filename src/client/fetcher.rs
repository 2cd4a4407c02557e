//! The fetch pipeline: origin-scoped middlewares in front of a transport.

use crate::client::transport::Transport;
use crate::error::{Error, Result};
use crate::middleware::{Middleware, Next};
use crate::types::{Request, Response};
use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderValue, Method};
use parking_lot::RwLock;
use regex::Regex;
use std::sync::Arc;

/// Arguments for [`Fetcher::fetch_url`].
#[derive(Clone, Debug, Default)]
pub struct RequestInit {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Bytes,
}

enum OriginPattern {
    Any,
    Glob(Regex),
}

impl OriginPattern {
    /// `*` matches any run of characters; everything else is literal.
    fn parse(pattern: &str) -> Result<Self> {
        if pattern == "*" {
            return Ok(OriginPattern::Any);
        }
        let body = pattern
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        Regex::new(&format!("^{}$", body))
            .map(OriginPattern::Glob)
            .map_err(|e| Error::InvalidArgument(format!("bad origin pattern {}: {}", pattern, e)))
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            OriginPattern::Any => true,
            OriginPattern::Glob(re) => re.is_match(origin),
        }
    }
}

struct Registration {
    origin: OriginPattern,
    middleware: Arc<dyn Middleware>,
}

/// Last stage of every chain.
pub(crate) struct Terminal {
    transport: Arc<dyn Transport>,
    user_agent: HeaderValue,
}

impl Terminal {
    pub(crate) async fn send(&self, mut request: Request) -> Result<Response> {
        if !request.headers().contains_key(USER_AGENT) {
            request
                .headers_mut()
                .insert(USER_AGENT, self.user_agent.clone());
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        tracing::debug!("{} {}", method, uri);

        let response = self.transport.send(request).await?;
        tracing::debug!("{} {} -> {}", method, uri, response.status());
        Ok(response)
    }
}

/// Runs requests through the registered middlewares.
pub struct Fetcher {
    registrations: RwLock<Vec<Registration>>,
    terminal: Terminal,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, user_agent: &str) -> Self {
        let user_agent = HeaderValue::try_from(user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static(super::config::DEFAULT_USER_AGENT));
        Fetcher {
            registrations: RwLock::new(Vec::new()),
            terminal: Terminal {
                transport,
                user_agent,
            },
        }
    }

    /// Add a middleware for origins matching `origin` (`"*"` for all,
    /// `"https://*.example.org"` style globs otherwise).
    pub fn register(&self, middleware: Arc<dyn Middleware>, origin: &str) -> Result<()> {
        let origin = OriginPattern::parse(origin)?;
        self.registrations.write().push(Registration { origin, middleware });
        Ok(())
    }

    pub(crate) fn register_global(&self, middleware: Arc<dyn Middleware>) {
        self.registrations.write().push(Registration {
            origin: OriginPattern::Any,
            middleware,
        });
    }

    /// Send a request through every middleware registered for its origin.
    pub async fn fetch(&self, request: Request) -> Result<Response> {
        let origin = origin_of(&request)?;
        let chain: Vec<Arc<dyn Middleware>> = self
            .registrations
            .read()
            .iter()
            .filter(|r| r.origin.matches(&origin))
            .map(|r| r.middleware.clone())
            .collect();

        Next::new(&chain, &self.terminal).run(request).await
    }

    /// Build a request from parts and fetch it.
    pub async fn fetch_url(&self, url: &str, init: RequestInit) -> Result<Response> {
        let mut request = http::Request::builder()
            .method(init.method)
            .uri(url)
            .body(init.body)?;
        *request.headers_mut() = init.headers;
        self.fetch(request).await
    }

    /// Like [`fetch`](Self::fetch), but non-2xx responses become errors.
    pub async fn fetch_or_error(&self, request: Request) -> Result<Response> {
        let response = self.fetch(request).await?;
        if !response.status().is_success() {
            return Err(Error::from_response(&response));
        }
        Ok(response)
    }
}

/// `scheme://authority` of an absolute request URI.
fn origin_of(request: &Request) -> Result<String> {
    let uri = request.uri();
    match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(authority)) => Ok(format!("{}://{}", scheme, authority)),
        _ => Err(Error::InvalidArgument(format!(
            "request URI must be absolute: {}",
            uri
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Echo {
        seen: Mutex<Vec<Request>>,
    }

    #[async_trait]
    impl Transport for Echo {
        async fn send(&self, request: Request) -> Result<Response> {
            self.seen.lock().push(crate::types::clone_request(&request));
            Ok(http::Response::new(Bytes::new()))
        }
    }

    struct Tag(&'static str);

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
            request
                .headers_mut()
                .append("x-tag", HeaderValue::from_static(self.0));
            next.run(request).await
        }
    }

    fn fetcher() -> (Arc<Echo>, Fetcher) {
        let echo = Arc::new(Echo {
            seen: Mutex::new(Vec::new()),
        });
        let fetcher = Fetcher::new(echo.clone(), "test-agent");
        (echo, fetcher)
    }

    fn get(url: &str) -> Request {
        http::Request::builder().uri(url).body(Bytes::new()).unwrap()
    }

    // ========== Origin Pattern Tests ==========

    #[test]
    fn test_glob_patterns() {
        let any = OriginPattern::parse("*").unwrap();
        assert!(any.matches("https://anything"));

        let sub = OriginPattern::parse("https://*.example.org").unwrap();
        assert!(sub.matches("https://api.example.org"));
        assert!(!sub.matches("http://api.example.org"));
        assert!(!sub.matches("https://api.example.org.evil"));

        let exact = OriginPattern::parse("https://a.b:8080").unwrap();
        assert!(exact.matches("https://a.b:8080"));
        assert!(!exact.matches("https://aXb:8080"));
    }

    // ========== Pipeline Tests ==========

    #[tokio::test]
    async fn test_user_agent_added() {
        let (echo, fetcher) = fetcher();
        fetcher.fetch(get("https://x/a")).await.unwrap();

        let mut req = get("https://x/b");
        req.headers_mut()
            .insert(USER_AGENT, HeaderValue::from_static("mine"));
        fetcher.fetch(req).await.unwrap();

        let seen = echo.seen.lock();
        assert_eq!(seen[0].headers()[USER_AGENT], "test-agent");
        assert_eq!(seen[1].headers()[USER_AGENT], "mine");
    }

    #[tokio::test]
    async fn test_middleware_order_and_scope() {
        let (echo, fetcher) = fetcher();
        fetcher.register(Arc::new(Tag("first")), "*").unwrap();
        fetcher
            .register(Arc::new(Tag("scoped")), "https://only.example")
            .unwrap();
        fetcher.register(Arc::new(Tag("last")), "*").unwrap();

        fetcher.fetch(get("https://only.example/x")).await.unwrap();
        fetcher.fetch(get("https://other.example/x")).await.unwrap();

        let seen = echo.seen.lock();
        let tags = |r: &Request| {
            r.headers()
                .get_all("x-tag")
                .iter()
                .map(|v| v.to_str().unwrap().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(tags(&seen[0]), vec!["first", "scoped", "last"]);
        assert_eq!(tags(&seen[1]), vec!["first", "last"]);
    }

    #[tokio::test]
    async fn test_relative_url_rejected() {
        let (echo, fetcher) = fetcher();
        let err = fetcher
            .fetch_url("/relative", RequestInit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(echo.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_or_error() {
        struct NotFound;

        #[async_trait]
        impl Transport for NotFound {
            async fn send(&self, _request: Request) -> Result<Response> {
                Ok(http::Response::builder()
                    .status(404)
                    .body(Bytes::new())
                    .unwrap())
            }
        }

        let fetcher = Fetcher::new(Arc::new(NotFound), "t");
        let err = fetcher.fetch_or_error(get("https://x/a")).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
