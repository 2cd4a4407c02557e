//! OAuth2 bearer tokens with refresh-on-401.

use super::{Middleware, Next};
use crate::error::{Error, Result};
use crate::types::{clone_request, Request, Response};
use async_trait::async_trait;
use http::header::AUTHORIZATION;
use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Token state, serializable so it can be persisted between runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Token {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<u64>,
}

impl OAuth2Token {
    pub fn new(access_token: impl Into<String>) -> Self {
        OAuth2Token {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => now_ms() >= at,
            None => false,
        }
    }

    fn header(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::try_from(format!("Bearer {}", self.access_token))
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Where new tokens come from: a token endpoint, a refresh grant, a test
/// double.
#[async_trait]
pub trait TokenSource: Send + Sync + 'static {
    /// Obtain a token. `previous` is the token that expired or was rejected,
    /// if there was one.
    async fn fetch_token(&self, previous: Option<&OAuth2Token>) -> Result<OAuth2Token>;
}

/// OAuth2 middleware.
///
/// Requests go out with the current token, or unauthenticated if there is
/// none yet. An expired token is renewed before sending. A `401` triggers one
/// renewal and one retry; a second `401` is returned to the caller.
pub struct OAuth2 {
    source: Arc<dyn TokenSource>,
    token: tokio::sync::Mutex<Option<OAuth2Token>>,
}

impl OAuth2 {
    pub fn new(source: impl TokenSource) -> Self {
        OAuth2 {
            source: Arc::new(source),
            token: tokio::sync::Mutex::new(None),
        }
    }

    /// Start from a previously exported token.
    pub fn with_token(self, token: OAuth2Token) -> Self {
        OAuth2 {
            source: self.source,
            token: tokio::sync::Mutex::new(Some(token)),
        }
    }

    pub async fn export_token(&self) -> Option<OAuth2Token> {
        self.token.lock().await.clone()
    }

    /// Current token, renewed first if it has expired.
    async fn current(&self) -> Result<Option<OAuth2Token>> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.is_expired() {
                tracing::debug!("OAuth2 token expired, refreshing");
                let fresh = self.source.fetch_token(Some(token)).await?;
                *guard = Some(fresh);
            }
        }
        Ok(guard.clone())
    }

    /// Replace `rejected`, unless a concurrent request already did.
    async fn renew(&self, rejected: Option<&OAuth2Token>) -> Result<OAuth2Token> {
        let mut guard = self.token.lock().await;
        if let Some(current) = guard.as_ref() {
            if Some(current) != rejected && !current.is_expired() {
                return Ok(current.clone());
            }
        }
        let fresh = self.source.fetch_token(guard.as_ref()).await?;
        *guard = Some(fresh.clone());
        Ok(fresh)
    }
}

#[async_trait]
impl Middleware for OAuth2 {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        let token = self.current().await?;
        if let Some(token) = &token {
            request.headers_mut().insert(AUTHORIZATION, token.header()?);
        }

        let mut retry = clone_request(&request);
        let response = next.run(request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("401 from {}, renewing OAuth2 token", retry.uri());
        let fresh = self.renew(token.as_ref()).await?;
        retry.headers_mut().insert(AUTHORIZATION, fresh.header()?);
        next.run(retry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_serde() {
        let token = OAuth2Token {
            access_token: "a".into(),
            refresh_token: Some("r".into()),
            expires_at: Some(1_700_000_000_000),
        };
        let json = serde_json::to_value(&token).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "a",
                "refresh_token": "r",
                "expires_at": 1_700_000_000_000u64
            })
        );
        let back: OAuth2Token = serde_json::from_value(json).unwrap();
        assert_eq!(back, token);
    }

    #[test]
    fn test_minimal_token_deserializes() {
        let token: OAuth2Token =
            serde_json::from_value(serde_json::json!({"access_token": "x"})).unwrap();
        assert_eq!(token, OAuth2Token::new("x"));
        assert!(!token.is_expired());
    }

    #[test]
    fn test_expiry() {
        let mut token = OAuth2Token::new("x");
        token.expires_at = Some(1);
        assert!(token.is_expired());
        token.expires_at = Some(now_ms() + 60_000);
        assert!(!token.is_expired());
    }
}
