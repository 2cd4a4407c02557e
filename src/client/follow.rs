//! Lazy link traversal.
//!
//! `FollowOne` and `FollowMany` are builders that implement
//! [`IntoFuture`]; nothing is fetched until they are awaited.
//!
//! ```no_run
//! # async fn run(client: ketting_rs::Client) -> ketting_rs::Result<()> {
//! let article = client
//!     .follow("collection")
//!     .prefer_transclude()
//!     .follow("item")
//!     .pre_fetch()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use super::Resource;
use crate::error::Result;
use crate::protocol::constants::{PREFER, PREFER_PUSH};
use crate::types::{Link, RequestOptions, State};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::future::IntoFuture;
use std::sync::Arc;

type Source = BoxFuture<'static, Result<Resource>>;

#[derive(Clone, Copy, Debug, Default)]
struct FollowOptions {
    pre_fetch: bool,
    prefer_push: bool,
    prefer_transclude: bool,
    use_head: bool,
}

/// Follow the first link with a given rel.
#[must_use = "a follow does nothing until awaited"]
pub struct FollowOne {
    source: Source,
    rel: String,
    variables: Option<Map<String, Value>>,
    options: FollowOptions,
}

/// Follow every link with a given rel.
#[must_use = "a follow does nothing until awaited"]
pub struct FollowMany {
    source: Source,
    rel: String,
    options: FollowOptions,
}

impl FollowOne {
    pub(crate) fn new(source: Source, rel: &str) -> Self {
        FollowOne {
            source,
            rel: rel.to_string(),
            variables: None,
            options: FollowOptions::default(),
        }
    }

    /// Values for a templated link.
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Start a background `get` of the target once it is known.
    pub fn pre_fetch(mut self) -> Self {
        self.options.pre_fetch = true;
        self
    }

    /// Ask the server to push the target (`Prefer-Push`).
    pub fn prefer_push(mut self) -> Self {
        self.options.prefer_push = true;
        self
    }

    /// Ask the server to embed the target (`Prefer: transclude`).
    pub fn prefer_transclude(mut self) -> Self {
        self.options.prefer_transclude = true;
        self
    }

    /// Find the link with a HEAD request, from `Link` headers only.
    pub fn use_head(mut self) -> Self {
        self.options.use_head = true;
        self
    }

    pub fn follow(self, rel: &str) -> FollowOne {
        FollowOne::new(self.into_future(), rel)
    }

    pub fn follow_all(self, rel: &str) -> FollowMany {
        FollowMany::new(self.into_future(), rel)
    }

    async fn resolve(self) -> Result<Resource> {
        let source = self.source.await?;
        let state = source_state(&source, &self.rel, self.options).await?;
        let link = state.require_link(&self.rel)?;
        open(&source, link, self.variables.as_ref(), self.options)
    }
}

impl IntoFuture for FollowOne {
    type Output = Result<Resource>;
    type IntoFuture = BoxFuture<'static, Result<Resource>>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve().boxed()
    }
}

impl FollowMany {
    pub(crate) fn new(source: Source, rel: &str) -> Self {
        FollowMany {
            source,
            rel: rel.to_string(),
            options: FollowOptions::default(),
        }
    }

    pub fn pre_fetch(mut self) -> Self {
        self.options.pre_fetch = true;
        self
    }

    pub fn prefer_push(mut self) -> Self {
        self.options.prefer_push = true;
        self
    }

    pub fn prefer_transclude(mut self) -> Self {
        self.options.prefer_transclude = true;
        self
    }

    pub fn use_head(mut self) -> Self {
        self.options.use_head = true;
        self
    }

    async fn resolve(self) -> Result<Vec<Resource>> {
        let source = self.source.await?;
        let state = source_state(&source, &self.rel, self.options).await?;
        state
            .links
            .get_many(&self.rel)
            .iter()
            .map(|link| open(&source, link, None, self.options))
            .collect()
    }
}

impl IntoFuture for FollowMany {
    type Output = Result<Vec<Resource>>;
    type IntoFuture = BoxFuture<'static, Result<Vec<Resource>>>;

    fn into_future(self) -> Self::IntoFuture {
        self.resolve().boxed()
    }
}

async fn source_state(source: &Resource, rel: &str, options: FollowOptions) -> Result<Arc<State>> {
    let mut request = RequestOptions::new();
    if options.prefer_push {
        request = request.with_header(PREFER_PUSH, rel);
    }
    if options.prefer_transclude && !options.use_head {
        request = request.with_header(PREFER, &format!("transclude={}", rel));
    }

    if options.use_head {
        source.head(request).await
    } else {
        source.get(request).await
    }
}

fn open(
    source: &Resource,
    link: &Link,
    variables: Option<&Map<String, Value>>,
    options: FollowOptions,
) -> Result<Resource> {
    let empty = Map::new();
    let href = link.expand(variables.unwrap_or(&empty))?;

    let resource = source.client().go(href.as_str())?;
    if let Some(media_type) = &link.media_type {
        resource.set_content_type(media_type.clone());
    }

    if options.pre_fetch {
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let target = resource.clone();
                runtime.spawn(async move {
                    if let Err(e) = target.get(RequestOptions::default()).await {
                        tracing::warn!("Prefetch of {} failed: {}", target.uri(), e);
                    }
                });
            }
            Err(_) => tracing::warn!("No tokio runtime; skipping prefetch of {}", resource.uri()),
        }
    }
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Client, ClientConfig, Transport};
    use crate::error::Error;
    use crate::types::{Request, Response};
    use async_trait::async_trait;
    use url::Url;

    struct Offline;

    #[async_trait]
    impl Transport for Offline {
        async fn send(&self, _request: Request) -> Result<Response> {
            Err(Error::Transport("offline".into()))
        }
    }

    fn client() -> Client {
        Client::with_transport("https://api.example/", ClientConfig::default(), Arc::new(Offline))
            .unwrap()
    }

    #[test]
    fn test_pre_fetch_without_runtime_is_skipped() {
        let client = client();
        let source = client.go_bookmark();
        let link = Link::new("next", "/next", Url::parse("https://api.example/").unwrap());
        let options = FollowOptions {
            pre_fetch: true,
            ..FollowOptions::default()
        };

        let target = open(&source, &link, None, options).unwrap();
        assert_eq!(target.uri().as_str(), "https://api.example/next");
    }

    #[test]
    fn test_templated_without_variables_drops_expressions() {
        let client = client();
        let source = client.go_bookmark();
        let link = Link::new("search", "/search{?q}", Url::parse("https://api.example/").unwrap())
            .templated();

        let target = open(&source, &link, None, FollowOptions::default()).unwrap();
        assert_eq!(target.uri().as_str(), "https://api.example/search");
    }
}
