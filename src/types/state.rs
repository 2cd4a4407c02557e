//! The uniform representation of a fetched resource.

use crate::client::{Action, Client};
use crate::error::{Error, Result};
use crate::representor::Format;
use crate::types::{ActionInfo, Link, LinkSet};
use bytes::Bytes;
use http::HeaderMap;
use serde_json::Value;
use std::time::SystemTime;
use url::Url;

/// Decoded body of a state.
#[derive(Clone, Debug, PartialEq)]
pub enum Representation {
    Json(Value),
    Text(String),
    Binary(Bytes),
    /// HEAD responses and bodiless replies.
    Empty,
}

impl Representation {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Representation::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Representation::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A resource's representation at a point in time.
///
/// States are immutable once a representor has built them and are shared as
/// `Arc<State>`; the cache holds one copy per URI.
#[derive(Clone, Debug)]
pub struct State {
    pub uri: Url,
    pub data: Representation,
    pub headers: HeaderMap,
    pub links: LinkSet,
    pub timestamp: SystemTime,
    /// Format the state was parsed from, also used to serialize it back.
    pub format: Format,
    actions: Vec<ActionInfo>,
    embedded: Vec<State>,
}

impl State {
    pub fn new(uri: Url, format: Format, data: Representation) -> Self {
        State {
            uri,
            data,
            headers: HeaderMap::new(),
            links: LinkSet::new(),
            timestamp: SystemTime::now(),
            format,
            actions: Vec::new(),
            embedded: Vec::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_links(mut self, links: LinkSet) -> Self {
        self.links = links;
        self
    }

    pub fn with_actions(mut self, actions: Vec<ActionInfo>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_embedded(mut self, embedded: Vec<State>) -> Self {
        self.embedded = embedded;
        self
    }

    /// Media type of the representation.
    pub fn content_type(&self) -> Option<String> {
        crate::protocol::content_type(&self.headers)
    }

    pub fn link(&self, rel: &str) -> Option<&Link> {
        self.links.get(rel)
    }

    /// Link lookup that fails with [`Error::LinkNotFound`].
    pub fn require_link(&self, rel: &str) -> Result<&Link> {
        self.links.get(rel).ok_or_else(|| Error::LinkNotFound {
            rel: rel.to_string(),
            uri: self.uri.to_string(),
        })
    }

    /// Sub-states found in the body, not yet moved into a cache.
    pub fn embedded(&self) -> &[State] {
        &self.embedded
    }

    /// Detach the embedded states so the client can cache them separately.
    pub fn take_embedded(&mut self) -> Vec<State> {
        std::mem::take(&mut self.embedded)
    }

    pub fn actions(&self) -> &[ActionInfo] {
        &self.actions
    }

    pub fn has_action(&self, name: &str) -> bool {
        self.actions.iter().any(|a| a.name == name)
    }

    /// Describe an action; `None` picks the first one.
    pub fn action_info(&self, name: Option<&str>) -> Result<&ActionInfo> {
        let found = match name {
            Some(name) => self.actions.iter().find(|a| a.name == name),
            None => self.actions.first(),
        };
        found.ok_or_else(|| Error::ActionNotFound {
            name: name.unwrap_or("<default>").to_string(),
            uri: self.uri.to_string(),
        })
    }

    /// Bind an action to `client` so it can be submitted.
    pub fn action(&self, client: &Client, name: Option<&str>) -> Result<Action> {
        Ok(Action::new(client.clone(), self.action_info(name)?.clone()))
    }

    /// Body bytes suitable for a PUT of this state.
    pub fn serialize_body(&self) -> Result<Bytes> {
        self.format.serialize(self)
    }
}
