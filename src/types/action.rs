//! Hypermedia form descriptors.

use http::Method;
use serde_json::Value;
use url::Url;

/// A form the server advertises on a state: where to send it, how, and
/// which fields it takes.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionInfo {
    /// Target of the submission.
    pub uri: Url,
    pub name: String,
    pub title: Option<String>,
    pub method: Method,
    /// Encoding for the submitted fields.
    pub content_type: String,
    pub fields: Vec<Field>,
}

impl ActionInfo {
    pub fn new(uri: Url, name: impl Into<String>, method: Method) -> Self {
        ActionInfo {
            uri,
            name: name.into(),
            title: None,
            method,
            content_type: "application/json".to_string(),
            fields: Vec::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// One input of an action.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    /// Input type as advertised (`text`, `number`, `hidden`, ...).
    pub field_type: String,
    pub label: Option<String>,
    pub required: bool,
    pub read_only: bool,
    /// Default value sent when the caller leaves the field out.
    pub value: Option<Value>,
    pub pattern: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            field_type: "text".to_string(),
            label: None,
            required: false,
            read_only: false,
            value: None,
            pattern: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }
}
