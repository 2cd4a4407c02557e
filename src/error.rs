//! Error types for hypermedia navigation.
//!
//! This module defines every error that can surface from the client. The
//! [`Result`] alias is used throughout the crate.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Navigation | `LinkNotFound`, `ActionNotFound` |
//! | Format | `UnsupportedFormat`, `Json`, `Template` |
//! | HTTP | `Http`, `Problem`, `UnexpectedStatus` |
//! | Call shape | `InvalidArgument`, `InvalidUri` |
//! | Transport | `Transport` |
//!
//! [`Error`] is `Clone`: a refresh shared by several callers hands the same
//! failure to each of them.
//!
//! # Examples
//!
//! ```
//! use ketting_rs::Error;
//!
//! let err = Error::LinkNotFound { rel: "next".into(), uri: "https://api.example/".into() };
//! assert!(err.to_string().contains("next"));
//! assert_eq!(err.status(), None);
//! ```

use crate::types::Response;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while fetching and navigating resources.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The requested relationship is not present on a state.
    #[error("Link with rel \"{rel}\" not found on {uri}")]
    LinkNotFound { rel: String, uri: String },

    /// The requested action is not present on a state.
    #[error("Action \"{name}\" not found on {uri}")]
    ActionNotFound { name: String, uri: String },

    /// No representor is registered for the response `Content-Type`.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The server answered with a non-2xx status.
    #[error("{0}")]
    Http(HttpError),

    /// The server answered with an `application/problem+json` body.
    #[error("{0}")]
    Problem(Problem),

    /// A malformed call, e.g. a relative URL handed to the fetcher.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A URI could not be parsed or resolved.
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// A URI template could not be expanded.
    #[error("URI template error: {0}")]
    Template(String),

    /// A JSON body could not be decoded or encoded.
    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),

    /// The transport failed before a response was received.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a status the operation cannot follow.
    #[error("Unexpected status {0}")]
    UnexpectedStatus(u16),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

impl Error {
    /// Build the error for a non-2xx response.
    ///
    /// `application/problem+json` bodies become [`Error::Problem`], everything
    /// else becomes [`Error::Http`].
    pub fn from_response(response: &Response) -> Self {
        let is_problem = crate::protocol::content_type(response.headers())
            .is_some_and(|ct| ct == "application/problem+json");
        if is_problem {
            Error::Problem(Problem::from_response(response))
        } else {
            Error::Http(HttpError::from_response(response))
        }
    }

    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http(e) => Some(e.status),
            Error::Problem(p) => Some(p.status),
            Error::UnexpectedStatus(s) => StatusCode::from_u16(*s).ok(),
            _ => None,
        }
    }

    /// Whether the server reported `404 Not Found`.
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

/// A non-2xx response, kept around so callers can inspect it.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpError {
    pub fn from_response(response: &Response) -> Self {
        HttpError {
            status: response.status(),
            headers: response.headers().clone(),
            body: response.body().clone(),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP error {}", self.status)
    }
}

/// An RFC 7807 problem document.
///
/// Server-supplied members are merged over the defaults
/// `type: "about:blank"` and `status: <http status>`.
#[derive(Debug, Clone)]
pub struct Problem {
    pub status: StatusCode,
    pub problem_type: String,
    pub title: Option<String>,
    pub detail: Option<String>,
    pub instance: Option<String>,
    /// The merged problem document, including extension members.
    pub body: Map<String, Value>,
    pub headers: HeaderMap,
}

impl Problem {
    pub fn from_response(response: &Response) -> Self {
        let status = response.status();
        let mut body = Map::new();
        body.insert("type".into(), Value::String("about:blank".into()));
        body.insert("status".into(), Value::from(status.as_u16()));

        if let Ok(Value::Object(server)) = serde_json::from_slice::<Value>(response.body()) {
            body.extend(server);
        }

        let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        Problem {
            status,
            problem_type: text("type").unwrap_or_else(|| "about:blank".into()),
            title: text("title"),
            detail: text("detail"),
            instance: text("instance"),
            headers: response.headers().clone(),
            body,
        }
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.title {
            Some(title) => write!(f, "HTTP error {}: {}", self.status, title),
            None => write!(f, "HTTP error {}", self.status),
        }
    }
}
