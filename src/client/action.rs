//! Submitting hypermedia forms.

use super::{Client, Resource};
use crate::error::{Error, Result};
use crate::types::{ActionInfo, Request, Response, State};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Method, StatusCode};
use serde_json::{Map, Value};
use url::Url;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// An [`ActionInfo`] bound to a client.
#[derive(Clone)]
pub struct Action {
    client: Client,
    info: ActionInfo,
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action").field("info", &self.info).finish()
    }
}

impl Action {
    pub fn new(client: Client, info: ActionInfo) -> Self {
        Action { client, info }
    }

    pub fn info(&self) -> &ActionInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Submit the form and parse the response.
    ///
    /// Fields left out of `form` take their advertised default value.
    pub async fn submit(&self, form: Map<String, Value>) -> Result<State> {
        let response = self.send(form).await?;
        self.client
            .state_for_response(self.info.uri.clone(), &response)
    }

    /// Submit the form and go to the resource it created.
    pub async fn submit_follow(&self, form: Map<String, Value>) -> Result<Resource> {
        let response = self.send(form).await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok());

        match (status, location) {
            (StatusCode::CREATED, Some(location)) => {
                let target = self.info.uri.join(location)?;
                self.client.go(target.as_str())
            }
            _ => Err(Error::UnexpectedStatus(status.as_u16())),
        }
    }

    /// Merge defaults and check required fields.
    fn values(&self, mut form: Map<String, Value>) -> Result<Map<String, Value>> {
        for field in &self.info.fields {
            if !form.contains_key(&field.name) {
                if let Some(value) = &field.value {
                    form.insert(field.name.clone(), value.clone());
                }
            }
            let missing = matches!(form.get(&field.name), None | Some(Value::Null));
            if field.required && missing {
                return Err(Error::InvalidArgument(format!(
                    "missing required field {} for action {}",
                    field.name, self.info.name
                )));
            }
        }
        Ok(form)
    }

    fn build_request(&self, form: Map<String, Value>) -> Result<Request> {
        let values = self.values(form)?;

        if self.info.method == Method::GET {
            let mut url = self.info.uri.clone();
            append_query(&mut url, &values);
            return Ok(http::Request::builder()
                .method(Method::GET)
                .uri(url.as_str())
                .body(Bytes::new())?);
        }

        let (content_type, body) = if is_json(&self.info.content_type) {
            let body = serde_json::to_vec(&Value::Object(values))?;
            (self.info.content_type.as_str(), Bytes::from(body))
        } else {
            (FORM_URLENCODED, Bytes::from(urlencode(&values)))
        };

        let content_type = HeaderValue::try_from(content_type)
            .map_err(|e| Error::InvalidArgument(e.to_string()))?;
        Ok(http::Request::builder()
            .method(self.info.method.clone())
            .uri(self.info.uri.as_str())
            .header(CONTENT_TYPE, content_type)
            .body(body)?)
    }

    async fn send(&self, form: Map<String, Value>) -> Result<Response> {
        let request = self.build_request(form)?;
        tracing::debug!("Submitting action {} to {}", self.info.name, self.info.uri);
        self.client.fetcher().fetch_or_error(request).await
    }
}

fn is_json(content_type: &str) -> bool {
    let media_type = crate::protocol::strip_media_type_params(content_type);
    media_type == "application/json" || media_type.ends_with("+json")
}

fn field_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn append_query(url: &mut Url, values: &Map<String, Value>) {
    let mut pairs = url.query_pairs_mut();
    for (name, value) in values {
        pairs.append_pair(name, &field_string(value));
    }
}

fn urlencode(values: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in values {
        serializer.append_pair(name, &field_string(value));
    }
    serializer.finish()
}
