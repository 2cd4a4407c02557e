use super::{Middleware, Next};
use crate::error::Result;
use crate::protocol::constants::{rels, DEPRECATION, SUNSET};
use crate::protocol::parse_link_headers;
use crate::types::{Request, Response};
use async_trait::async_trait;

/// Logs a warning when a response says the resource is deprecated.
///
/// Looks at the `Deprecation` and `Sunset` headers and at
/// `Link: <...>; rel="deprecation"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeprecationWarning;

#[async_trait]
impl Middleware for DeprecationWarning {
    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        let url = request.uri().to_string();
        let response = next.run(request).await?;

        if let Some(message) = deprecation_message(&url, &response) {
            tracing::warn!("{}", message);
        }
        Ok(response)
    }
}

fn deprecation_message(url: &str, response: &Response) -> Option<String> {
    let headers = response.headers();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let deprecation = header(DEPRECATION);
    let sunset = header(SUNSET);
    let docs = parse_link_headers(headers)
        .into_iter()
        .find(|l| l.rel == rels::DEPRECATION)
        .map(|l| l.href);

    if deprecation.is_none() && sunset.is_none() && docs.is_none() {
        return None;
    }

    let mut message = format!("Resource {} is deprecated.", url);
    if let Some(sunset) = sunset {
        message.push_str(&format!(" It will no longer respond after {}.", sunset));
    }
    if let Some(docs) = docs {
        message.push_str(&format!(" See {} for more information.", docs));
    }
    Some(message)
}
