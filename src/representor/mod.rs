//! Representors: turn an HTTP response into a [`State`].
//!
//! Each supported media type maps to one [`Format`], a plain enum whose
//! variants dispatch to a parser function. The [`FormatRegistry`] decides
//! which format handles a response and builds the `Accept` header.
//!
//! | Format | Media types | Links | Embedded | Actions |
//! |--------|-------------|-------|----------|---------|
//! | `Hal` | `application/hal+json`, `application/prs.hal-forms+json` | `_links`, `_embedded`, `Link` | `_embedded` | `_templates` |
//! | `Siren` | `application/vnd.siren+json` | `links`, `entities`, `Link` | `entities` | `actions` |
//! | `Json` | `application/json`, `*+json` | `Link` | no | no |
//! | `Text` | `text/*` | `Link` | no | no |
//! | `Binary` | anything else | `Link` | no | no |

pub mod hal;
mod registry;
pub mod siren;

pub use registry::{FormatEntry, FormatRegistry};

use crate::error::Result;
use crate::protocol::parse_link_headers;
use crate::types::{Link, LinkSet, Representation, Response, State};
use bytes::Bytes;
use url::Url;

/// Wire formats the client can read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Hal,
    Siren,
    Json,
    Text,
    Binary,
}

impl Format {
    /// Build a state for `uri` from a GET (or other body-carrying) response.
    pub fn parse(self, uri: &Url, response: &Response) -> Result<State> {
        let state = match self {
            Format::Hal => hal::parse(uri, response)?,
            Format::Siren => siren::parse(uri, response)?,
            Format::Json => parse_json(uri, response)?,
            Format::Text => State::new(
                uri.clone(),
                self,
                Representation::Text(String::from_utf8_lossy(response.body()).into_owned()),
            ),
            Format::Binary => State::new(
                uri.clone(),
                self,
                Representation::Binary(response.body().clone()),
            ),
        };
        Ok(finish(state, uri, response))
    }

    /// Inverse of [`Format::parse`], for PUT requests.
    pub fn serialize(self, state: &State) -> Result<Bytes> {
        match (self, &state.data) {
            (Format::Hal, _) => hal::serialize(state),
            (_, Representation::Json(value)) => Ok(serde_json::to_vec(value)?.into()),
            (_, Representation::Text(text)) => Ok(Bytes::from(text.clone())),
            (_, Representation::Binary(bytes)) => Ok(bytes.clone()),
            (_, Representation::Empty) => Ok(Bytes::new()),
        }
    }
}

/// State for a HEAD response: no body, links from the `Link` header only.
pub fn parse_head(uri: &Url, response: &Response) -> State {
    finish(
        State::new(uri.clone(), Format::Binary, Representation::Empty),
        uri,
        response,
    )
}

fn parse_json(uri: &Url, response: &Response) -> Result<State> {
    let data = if response.body().is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(response.body())?
    };
    Ok(State::new(uri.clone(), Format::Json, Representation::Json(data)))
}

/// Attach response headers and merge `Link` header links into the body links.
fn finish(state: State, uri: &Url, response: &Response) -> State {
    let mut links = state.links.clone();
    merge_links(&mut links, header_links(uri, response));
    state
        .with_links(links)
        .with_headers(response.headers().clone())
}

pub(crate) fn header_links(uri: &Url, response: &Response) -> Vec<Link> {
    parse_link_headers(response.headers())
        .into_iter()
        .map(|l| Link::from_http_link(l, uri))
        .collect()
}

/// Add links, skipping `(rel, href)` pairs that are already present.
pub(crate) fn merge_links(set: &mut LinkSet, links: impl IntoIterator<Item = Link>) {
    for link in links {
        if !set.contains(&link.rel, &link.href) {
            set.add(link);
        }
    }
}
