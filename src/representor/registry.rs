//! Media type → format dispatch and `Accept` generation.

use super::Format;
use crate::error::{Error, Result};
use crate::protocol::strip_media_type_params;

/// One registered media type.
#[derive(Clone, Debug, PartialEq)]
pub struct FormatEntry {
    pub media_type: String,
    /// Preference advertised in `Accept`, between 0 and 1.
    pub q: f32,
    pub format: Format,
}

/// Formats the client accepts, in registration order.
///
/// # Examples
///
/// ```
/// use ketting_rs::representor::{Format, FormatRegistry};
///
/// let registry = FormatRegistry::default();
/// assert_eq!(registry.select(Some("application/hal+json; charset=utf-8")).unwrap(), Format::Hal);
/// assert_eq!(registry.select(Some("text/csv")).unwrap(), Format::Text);
/// assert!(registry.accept_header().starts_with("application/prs.hal-forms+json;q=1"));
/// ```
#[derive(Clone, Debug)]
pub struct FormatRegistry {
    entries: Vec<FormatEntry>,
    /// Unknown media types parse as binary instead of failing.
    pub fallback_to_binary: bool,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = FormatRegistry::empty();
        registry.register("application/prs.hal-forms+json", 1.0, Format::Hal);
        registry.register("application/hal+json", 0.9, Format::Hal);
        registry.register("application/vnd.siren+json", 0.8, Format::Siren);
        registry.register("application/json", 0.7, Format::Json);
        registry.register("text/*", 0.1, Format::Text);
        registry
    }
}

impl FormatRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        FormatRegistry {
            entries: Vec::new(),
            fallback_to_binary: true,
        }
    }

    /// Register (or re-register) a media type.
    pub fn register(&mut self, media_type: &str, q: f32, format: Format) {
        let media_type = strip_media_type_params(media_type);
        let q = q.clamp(0.0, 1.0);
        match self.entries.iter_mut().find(|e| e.media_type == media_type) {
            Some(entry) => {
                entry.q = q;
                entry.format = format;
            }
            None => self.entries.push(FormatEntry {
                media_type,
                q,
                format,
            }),
        }
    }

    pub fn entries(&self) -> &[FormatEntry] {
        &self.entries
    }

    /// `Accept` value, highest preference first.
    pub fn accept_header(&self) -> String {
        let mut entries: Vec<&FormatEntry> = self.entries.iter().collect();
        // stable sort keeps registration order for equal q
        entries.sort_by(|a, b| b.q.total_cmp(&a.q));
        entries
            .iter()
            .map(|e| format!("{};q={}", e.media_type, e.q))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Content type used for request bodies when nothing else is known.
    pub fn default_content_type(&self) -> &str {
        self.entries
            .first()
            .map(|e| e.media_type.as_str())
            .unwrap_or("application/json")
    }

    /// Pick a format for a response `Content-Type`.
    pub fn select(&self, content_type: Option<&str>) -> Result<Format> {
        let Some(content_type) = content_type else {
            return Ok(Format::Binary);
        };
        let media_type = strip_media_type_params(content_type);

        if let Some(entry) = self.entries.iter().find(|e| e.media_type == media_type) {
            return Ok(entry.format);
        }
        if media_type.starts_with("text/") {
            return Ok(Format::Text);
        }
        if media_type.ends_with("+json") {
            return Ok(Format::Json);
        }
        if self.fallback_to_binary {
            return Ok(Format::Binary);
        }
        Err(Error::UnsupportedFormat(media_type))
    }
}
