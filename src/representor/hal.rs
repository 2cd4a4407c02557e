//! HAL (`application/hal+json`) and HAL-Forms.
//!
//! Links come from `_links` and from the `self` link of every `_embedded`
//! member; embedded members with a `self` link also become states of their
//! own. HAL-Forms `_templates` become actions. The three reserved keys are
//! removed from the state's data.

use super::{merge_links, Format};
use crate::error::Result;
use crate::protocol::constants::rels;
use crate::types::{ActionInfo, Field, Link, LinkSet, Representation, Response, State};
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use url::{Position, Url};

pub fn parse(uri: &Url, response: &Response) -> Result<State> {
    let body: Value = if response.body().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(response.body())?
    };

    // Embedded states carry the parent's content type and nothing else.
    let mut embedded_headers = HeaderMap::new();
    if let Some(ct) = response.headers().get(CONTENT_TYPE) {
        embedded_headers.insert(CONTENT_TYPE, ct.clone());
    }

    parse_document(uri, body, &embedded_headers)
}

fn parse_document(uri: &Url, body: Value, embedded_headers: &HeaderMap) -> Result<State> {
    let Value::Object(mut doc) = body else {
        // Not a HAL document; keep it as plain data.
        return Ok(State::new(uri.clone(), Format::Hal, Representation::Json(body)));
    };

    let mut links = LinkSet::new();
    if let Some(Value::Object(hal_links)) = doc.remove("_links") {
        links.add_all(parse_links(uri, &hal_links));
    }

    let mut embedded = Vec::new();
    if let Some(Value::Object(hal_embedded)) = doc.remove("_embedded") {
        for (rel, members) in hal_embedded {
            for member in one_or_many(members) {
                let Some(self_href) = self_href(&member) else {
                    continue;
                };
                merge_links(&mut links, [Link::new(rel.as_str(), self_href.as_str(), uri.clone())]);

                let member_uri = uri.join(&self_href)?;
                let state = parse_document(&member_uri, member, embedded_headers)?
                    .with_headers(embedded_headers.clone());
                embedded.push(state);
            }
        }
    }

    let actions = match doc.remove("_templates") {
        Some(Value::Object(templates)) => parse_templates(uri, &templates)?,
        _ => Vec::new(),
    };

    Ok(
        State::new(uri.clone(), Format::Hal, Representation::Json(Value::Object(doc)))
            .with_links(links)
            .with_actions(actions)
            .with_embedded(embedded),
    )
}

fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn self_href(member: &Value) -> Option<String> {
    let self_link = member.get("_links")?.get(rels::SELF)?;
    let self_link = match self_link {
        Value::Array(items) => items.first()?,
        other => other,
    };
    str_field(self_link, "href")
}

fn parse_links(uri: &Url, hal_links: &Map<String, Value>) -> Vec<Link> {
    let mut out = Vec::new();
    for (rel, value) in hal_links {
        if rel == "curies" {
            continue;
        }
        for item in one_or_many(value.clone()) {
            let Some(href) = str_field(&item, "href") else {
                continue;
            };
            let mut link = Link::new(rel.as_str(), href, uri.clone());
            link.title = str_field(&item, "title");
            link.media_type = str_field(&item, "type");
            link.templated = item.get("templated").and_then(Value::as_bool).unwrap_or(false);
            link.name = str_field(&item, "name");
            link.hreflang = str_field(&item, "hreflang");
            out.push(link);
        }
    }
    out
}

fn parse_templates(uri: &Url, templates: &Map<String, Value>) -> Result<Vec<ActionInfo>> {
    let mut actions = Vec::new();
    for (name, template) in templates {
        let method = str_field(template, "method")
            .and_then(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
            .unwrap_or(Method::GET);
        let target = match str_field(template, "target") {
            Some(target) => uri.join(&target)?,
            None => uri.clone(),
        };

        let mut action = ActionInfo::new(target, name.as_str(), method);
        action.title = str_field(template, "title");
        if let Some(ct) = str_field(template, "contentType") {
            action.content_type = ct;
        }

        if let Some(Value::Array(props)) = template.get("properties") {
            for prop in props {
                let Some(field_name) = str_field(prop, "name") else {
                    continue;
                };
                let mut field = Field::new(field_name);
                field.label = str_field(prop, "prompt");
                field.required = prop.get("required").and_then(Value::as_bool).unwrap_or(false);
                field.read_only = prop.get("readOnly").and_then(Value::as_bool).unwrap_or(false);
                field.pattern = str_field(prop, "regex");
                field.value = prop.get("value").cloned();
                if let Some(t) = str_field(prop, "type") {
                    field.field_type = t;
                }
                action.fields.push(field);
            }
        }
        actions.push(action);
    }
    Ok(actions)
}

/// HAL body for a state: its data plus `_links` rebuilt from the link set.
pub fn serialize(state: &State) -> Result<Bytes> {
    let mut doc = match &state.data {
        Representation::Json(Value::Object(map)) => map.clone(),
        Representation::Json(Value::Null) | Representation::Empty => Map::new(),
        Representation::Json(other) => return Ok(serde_json::to_vec(other)?.into()),
        Representation::Text(text) => return Ok(Bytes::from(text.clone())),
        Representation::Binary(bytes) => return Ok(bytes.clone()),
    };

    let mut hal_links = Map::new();
    for rel in state.links.rels() {
        let serialized: Vec<Value> = state
            .links
            .get_many(rel)
            .iter()
            .map(serialize_link)
            .collect();
        let value = match serialized.len() {
            1 => serialized.into_iter().next().unwrap_or(Value::Null),
            _ => Value::Array(serialized),
        };
        hal_links.insert(rel.to_string(), value);
    }
    if !hal_links.contains_key(rels::SELF) {
        hal_links.insert(
            rels::SELF.to_string(),
            serde_json::json!({ "href": &state.uri[Position::BeforePath..Position::AfterQuery] }),
        );
    }
    doc.insert("_links".to_string(), Value::Object(hal_links));

    Ok(serde_json::to_vec(&doc)?.into())
}

fn serialize_link(link: &Link) -> Value {
    let mut out = Map::new();
    out.insert("href".into(), Value::String(link.href.clone()));
    if let Some(title) = &link.title {
        out.insert("title".into(), Value::String(title.clone()));
    }
    if let Some(media_type) = &link.media_type {
        out.insert("type".into(), Value::String(media_type.clone()));
    }
    if link.templated {
        out.insert("templated".into(), Value::Bool(true));
    }
    if let Some(name) = &link.name {
        out.insert("name".into(), Value::String(name.clone()));
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(body: Value) -> Response {
        http::Response::builder()
            .header("content-type", "application/hal+json")
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    fn uri() -> Url {
        Url::parse("https://api.example/list").unwrap()
    }

    #[test]
    fn test_links_and_embedded() {
        let body = json!({
            "_links": { "next": { "href": "/p2" } },
            "_embedded": { "item": { "_links": { "self": { "href": "/e1" } }, "v": 1 } }
        });
        let mut state = Format::Hal.parse(&uri(), &response(body)).unwrap();

        assert_eq!(state.links.get("next").unwrap().href, "/p2");
        assert_eq!(state.data, Representation::Json(json!({})));

        let embedded = state.take_embedded();
        assert_eq!(embedded.len(), 1);
        assert_eq!(embedded[0].uri.as_str(), "https://api.example/e1");
        assert_eq!(embedded[0].data, Representation::Json(json!({ "v": 1 })));
        assert_eq!(embedded[0].links.get("self").unwrap().href, "/e1");
    }

    #[test]
    fn test_embedded_contributes_link() {
        let body = json!({
            "_embedded": { "item": [
                { "_links": { "self": { "href": "/a" } } },
                { "_links": { "self": { "href": "/b" } } }
            ] }
        });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();
        let hrefs: Vec<_> = state.links.get_many("item").iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/a", "/b"]);
    }

    #[test]
    fn test_embedded_link_not_duplicated() {
        let body = json!({
            "_links": { "item": [{ "href": "/a" }] },
            "_embedded": { "item": [{ "_links": { "self": { "href": "/a" } } }] }
        });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();
        assert_eq!(state.links.get_many("item").len(), 1);
        assert_eq!(state.embedded().len(), 1);
    }

    #[test]
    fn test_embedded_without_self_is_skipped() {
        let body = json!({ "_embedded": { "item": { "name": "anonymous" } } });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();
        assert!(state.embedded().is_empty());
        assert!(!state.links.has("item"));
    }

    #[test]
    fn test_nested_embedded() {
        let body = json!({
            "_embedded": { "item": {
                "_links": { "self": { "href": "/outer" } },
                "_embedded": { "child": { "_links": { "self": { "href": "/inner" } } } }
            } }
        });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();
        let outer = &state.embedded()[0];
        assert_eq!(outer.embedded()[0].uri.as_str(), "https://api.example/inner");
        assert!(outer.links.has("child"));
    }

    #[test]
    fn test_link_attributes() {
        let body = json!({ "_links": {
            "search": { "href": "/s{?q}", "templated": true, "title": "Search", "type": "application/hal+json" },
            "curies": [{ "name": "ex", "href": "/rels/{rel}", "templated": true }],
            "alt": [{ "href": "/en", "hreflang": "en", "name": "en" }, { "href": "/fr" }]
        } });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();

        let search = state.links.get("search").unwrap();
        assert!(search.templated);
        assert_eq!(search.title.as_deref(), Some("Search"));
        assert_eq!(search.media_type.as_deref(), Some("application/hal+json"));
        assert!(!state.links.has("curies"));
        assert_eq!(state.links.get_many("alt").len(), 2);
        assert_eq!(state.links.get("alt").unwrap().name.as_deref(), Some("en"));
    }

    #[test]
    fn test_templates_become_actions() {
        let body = json!({
            "_templates": { "default": {
                "method": "post",
                "target": "/orders",
                "contentType": "application/x-www-form-urlencoded",
                "title": "Order",
                "properties": [
                    { "name": "sku", "required": true, "prompt": "SKU" },
                    { "name": "qty", "type": "number", "value": 1 }
                ]
            } },
            "total": 3
        });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();

        assert_eq!(state.data, Representation::Json(json!({ "total": 3 })));
        let action = state.action_info(Some("default")).unwrap();
        assert_eq!(action.method, Method::POST);
        assert_eq!(action.uri.as_str(), "https://api.example/orders");
        assert_eq!(action.content_type, "application/x-www-form-urlencoded");
        assert!(action.field("sku").unwrap().required);
        assert_eq!(action.field("qty").unwrap().value, Some(json!(1)));
        assert_eq!(action.field("qty").unwrap().field_type, "number");
    }

    #[test]
    fn test_empty_body() {
        let res = http::Response::builder()
            .header("content-type", "application/hal+json")
            .body(Bytes::new())
            .unwrap();
        let state = Format::Hal.parse(&uri(), &res).unwrap();
        assert_eq!(state.data, Representation::Json(json!({})));
    }

    #[test]
    fn test_serialize_readds_links() {
        let body = json!({ "_links": { "next": { "href": "/p2" } }, "title": "x" });
        let state = Format::Hal.parse(&uri(), &response(body)).unwrap();
        let bytes = state.serialize_body().unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["title"], "x");
        assert_eq!(doc["_links"]["next"]["href"], "/p2");
        assert_eq!(doc["_links"]["self"]["href"], "/list");
    }

    #[test]
    fn test_serialize_self_keeps_query() {
        let uri = Url::parse("https://api.example/list?page=2").unwrap();
        let state = Format::Hal.parse(&uri, &response(json!({}))).unwrap();
        let bytes = state.serialize_body().unwrap();
        let doc: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(doc["_links"]["self"]["href"], "/list?page=2");
    }
}
