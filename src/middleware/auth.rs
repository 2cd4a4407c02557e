//! Static credentials.

use super::{Middleware, Next};
use crate::error::{Error, Result};
use crate::types::{Request, Response};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::header::AUTHORIZATION;
use http::HeaderValue;

/// HTTP Basic authentication.
pub struct BasicAuth {
    header: HeaderValue,
}

impl BasicAuth {
    pub fn new(user: &str, password: &str) -> Result<Self> {
        let encoded = STANDARD.encode(format!("{}:{}", user, password));
        let mut header = HeaderValue::try_from(format!("Basic {}", encoded))
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

#[async_trait]
impl Middleware for BasicAuth {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
        next.run(request).await
    }
}

/// Bearer token authentication with a fixed token.
pub struct BearerAuth {
    header: HeaderValue,
}

impl BearerAuth {
    pub fn new(token: &str) -> Result<Self> {
        let mut header = HeaderValue::try_from(format!("Bearer {}", token))
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

#[async_trait]
impl Middleware for BearerAuth {
    async fn handle(&self, mut request: Request, next: Next<'_>) -> Result<Response> {
        request
            .headers_mut()
            .insert(AUTHORIZATION, self.header.clone());
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_header() {
        let auth = BasicAuth::new("Aladdin", "open sesame").unwrap();
        assert_eq!(auth.header, "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
        assert!(auth.header.is_sensitive());
    }

    #[test]
    fn test_bearer_header() {
        let auth = BearerAuth::new("abc").unwrap();
        assert_eq!(auth.header, "Bearer abc");
    }

    #[test]
    fn test_bearer_rejects_newlines() {
        assert!(BearerAuth::new("abc\ndef").is_err());
    }
}
