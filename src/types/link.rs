//! A single hypermedia link.

use crate::error::Result;
use crate::protocol::{expand_template, HttpLink};
use serde_json::{Map, Value};
use url::Url;

/// A typed link between two resources.
///
/// `href` is stored exactly as the server sent it. It is resolved against
/// `context` only when the link is used, see [`Link::resolve`] and
/// [`Link::expand`].
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub rel: String,
    pub href: String,
    /// URI the `href` is relative to, normally the URI of the state the link
    /// was found on.
    pub context: Url,
    pub title: Option<String>,
    /// Media type hint for the target.
    pub media_type: Option<String>,
    /// The `href` is an RFC 6570 template.
    pub templated: bool,
    pub hreflang: Option<String>,
    pub anchor: Option<String>,
    pub media: Option<String>,
    /// HAL `name`, used to tell apart links sharing a rel.
    pub name: Option<String>,
    /// Extra, format-specific hints about the target.
    pub hints: Option<Value>,
}

impl Link {
    pub fn new(rel: impl Into<String>, href: impl Into<String>, context: Url) -> Self {
        Link {
            rel: rel.into(),
            href: href.into(),
            context,
            title: None,
            media_type: None,
            templated: false,
            hreflang: None,
            anchor: None,
            media: None,
            name: None,
            hints: None,
        }
    }

    pub fn templated(mut self) -> Self {
        self.templated = true;
        self
    }

    /// Convert a parsed `Link` header entry, relative to `context`, or to its
    /// `anchor` when it carries one.
    pub fn from_http_link(link: HttpLink, context: &Url) -> Self {
        let context = link
            .anchor
            .as_deref()
            .and_then(|anchor| context.join(anchor).ok())
            .unwrap_or_else(|| context.clone());
        Link {
            rel: link.rel,
            href: link.href,
            context,
            title: link.title,
            media_type: link.media_type,
            templated: false,
            hreflang: link.hreflang,
            anchor: link.anchor,
            media: link.media,
            name: None,
            hints: None,
        }
    }

    /// Absolute target URI. Template expressions are left unexpanded.
    pub fn resolve(&self) -> Result<Url> {
        Ok(self.context.join(&self.href)?)
    }

    /// Expand the template with `vars`, then resolve against the context.
    ///
    /// Links that are not templated resolve as-is.
    pub fn expand(&self, vars: &Map<String, Value>) -> Result<Url> {
        if !self.templated {
            return self.resolve();
        }
        let href = expand_template(&self.href, vars)?;
        Ok(self.context.join(&href)?)
    }
}
