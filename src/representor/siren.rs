//! Siren (`application/vnd.siren+json`).

use super::{merge_links, Format};
use crate::error::Result;
use crate::protocol::constants::rels;
use crate::types::{ActionInfo, Field, Link, LinkSet, Representation, Response, State};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use serde_json::{Map, Value};
use url::Url;

pub fn parse(uri: &Url, response: &Response) -> Result<State> {
    let body: Value = if response.body().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(response.body())?
    };

    let mut embedded_headers = HeaderMap::new();
    if let Some(ct) = response.headers().get(CONTENT_TYPE) {
        embedded_headers.insert(CONTENT_TYPE, ct.clone());
    }
    parse_entity(uri, &body, &embedded_headers)
}

fn parse_entity(uri: &Url, entity: &Value, embedded_headers: &HeaderMap) -> Result<State> {
    let data = entity
        .get("properties")
        .cloned()
        .unwrap_or_else(|| Value::Object(Map::new()));

    let mut links = LinkSet::new();
    if let Some(Value::Array(siren_links)) = entity.get("links") {
        for link in siren_links {
            links.add_all(parse_link(uri, link));
        }
    }

    let mut embedded = Vec::new();
    if let Some(Value::Array(entities)) = entity.get("entities") {
        for sub in entities {
            if sub.get("href").is_some() {
                // sub-entity link
                merge_links(&mut links, parse_link(uri, sub));
                continue;
            }

            let Some(self_href) = entity_self_href(sub) else {
                continue;
            };
            let sub_uri = uri.join(&self_href)?;
            merge_links(
                &mut links,
                rel_list(sub)
                    .into_iter()
                    .map(|rel| Link::new(rel, self_href.as_str(), uri.clone())),
            );
            embedded.push(
                parse_entity(&sub_uri, sub, embedded_headers)?
                    .with_headers(embedded_headers.clone()),
            );
        }
    }

    let mut actions = Vec::new();
    if let Some(Value::Array(siren_actions)) = entity.get("actions") {
        for action in siren_actions {
            if let Some(action) = parse_action(uri, action)? {
                actions.push(action);
            }
        }
    }

    Ok(State::new(uri.clone(), Format::Siren, Representation::Json(data))
        .with_links(links)
        .with_actions(actions)
        .with_embedded(embedded))
}

fn str_field(obj: &Value, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn rel_list(obj: &Value) -> Vec<String> {
    match obj.get("rel") {
        Some(Value::Array(rels)) => rels
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        Some(Value::String(rel)) => vec![rel.clone()],
        _ => Vec::new(),
    }
}

/// One link per rel on a Siren link object.
fn parse_link(uri: &Url, link: &Value) -> Vec<Link> {
    let Some(href) = str_field(link, "href") else {
        return Vec::new();
    };
    let title = str_field(link, "title");
    let media_type = str_field(link, "type");
    rel_list(link)
        .into_iter()
        .map(|rel| {
            let mut l = Link::new(rel, href.as_str(), uri.clone());
            l.title = title.clone();
            l.media_type = media_type.clone();
            l
        })
        .collect()
}

fn entity_self_href(entity: &Value) -> Option<String> {
    let Value::Array(links) = entity.get("links")? else {
        return None;
    };
    links
        .iter()
        .find(|l| rel_list(l).iter().any(|r| r == rels::SELF))
        .and_then(|l| str_field(l, "href"))
}

fn parse_action(uri: &Url, action: &Value) -> Result<Option<ActionInfo>> {
    let (Some(name), Some(href)) = (str_field(action, "name"), str_field(action, "href")) else {
        return Ok(None);
    };
    let method = str_field(action, "method")
        .and_then(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
        .unwrap_or(Method::GET);

    let mut info = ActionInfo::new(uri.join(&href)?, name, method).with_content_type(
        str_field(action, "type").unwrap_or_else(|| "application/x-www-form-urlencoded".into()),
    );
    info.title = str_field(action, "title");

    if let Some(Value::Array(fields)) = action.get("fields") {
        for f in fields {
            let Some(field_name) = str_field(f, "name") else {
                continue;
            };
            let mut field = Field::new(field_name);
            field.label = str_field(f, "title");
            field.value = f.get("value").cloned();
            if let Some(t) = str_field(f, "type") {
                field.field_type = t;
            }
            info.fields.push(field);
        }
    }
    Ok(Some(info))
}
