//! Request and response values passed through the fetch pipeline.

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};

/// A fully buffered HTTP request.
pub type Request = http::Request<Bytes>;

/// A fully buffered HTTP response.
pub type Response = http::Response<Bytes>;

/// Copy a request, e.g. to send it again after refreshing credentials.
pub fn clone_request(request: &Request) -> Request {
    let mut copy = http::Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

/// Per-call options for resource verbs.
///
/// Builders never fail; a bad header name or value is reported when the
/// request is sent.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
    invalid: Option<String>,
}

impl RequestOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                self.invalid = Some(format!("invalid header {}: {}", name, value));
            }
        }
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// JSON body; defaults the content type to `application/json`.
    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => {
                self.body = Some(bytes.into());
                self.content_type.get_or_insert_with(|| "application/json".into());
            }
            Err(e) => self.invalid = Some(e.to_string()),
        }
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the caller supplied any headers of their own.
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Error recorded by a builder call, if any.
    pub fn validate(&self) -> crate::Result<()> {
        match &self.invalid {
            Some(msg) => Err(crate::Error::InvalidArgument(msg.clone())),
            None => Ok(()),
        }
    }

    /// Headers to send, with `Content-Type` filled in when there is a body.
    pub(crate) fn request_headers(&self, default_content_type: &str) -> crate::Result<HeaderMap> {
        self.validate()?;
        let mut headers = self.headers.clone();
        if self.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
            let ct = self.content_type.as_deref().unwrap_or(default_content_type);
            let value = HeaderValue::try_from(ct)
                .map_err(|_| crate::Error::InvalidArgument(format!("invalid content type {}", ct)))?;
            headers.insert(CONTENT_TYPE, value);
        }
        Ok(headers)
    }
}
