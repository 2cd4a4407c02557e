//! RFC 6570 URI Template expansion (levels 1 to 4).
//!
//! Variables are a JSON object: strings, numbers and booleans are simple
//! values, arrays are lists, objects are associative arrays and `null` is
//! undefined.
//!
//! ```
//! use ketting_rs::protocol::expand_template;
//! use serde_json::json;
//!
//! let vars = json!({ "bar": "zim", "q": ["a", "b"] });
//! let vars = vars.as_object().unwrap();
//! assert_eq!(expand_template("/foo/{bar}{?q*}", vars).unwrap(), "/foo/zim?q=a&q=b");
//! ```

use crate::error::{Error, Result};
use serde_json::{Map, Value};

struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

const fn op(
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
) -> Operator {
    Operator {
        first,
        sep,
        named,
        if_empty,
        allow_reserved,
    }
}

fn operator(c: char) -> Option<Operator> {
    Some(match c {
        '+' => op("", ",", false, "", true),
        '#' => op("#", ",", false, "", true),
        '.' => op(".", ".", false, "", false),
        '/' => op("/", "/", false, "", false),
        ';' => op(";", ";", true, "", false),
        '?' => op("?", "&", true, "=", false),
        '&' => op("&", "&", true, "=", false),
        _ => return None,
    })
}

struct VarSpec<'a> {
    name: &'a str,
    prefix: Option<usize>,
    explode: bool,
}

fn parse_varspec(spec: &str) -> Result<VarSpec<'_>> {
    let spec = spec.trim();
    let (name, explode, prefix) = if let Some(name) = spec.strip_suffix('*') {
        (name, true, None)
    } else if let Some((name, len)) = spec.split_once(':') {
        let len = len
            .parse::<usize>()
            .map_err(|_| Error::Template(format!("invalid prefix modifier in {{{}}}", spec)))?;
        (name, false, Some(len))
    } else {
        (spec, false, None)
    };

    if name.is_empty() {
        return Err(Error::Template("empty variable name".into()));
    }
    Ok(VarSpec {
        name,
        prefix,
        explode,
    })
}

/// Expand `template` with `vars`.
pub fn expand_template(template: &str, vars: &Map<String, Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| Error::Template(format!("unclosed expression in {}", template)))?;
        expand_expression(&after[..close], vars, &mut out)?;
        rest = &after[close + 1..];
    }
    if rest.contains('}') {
        return Err(Error::Template(format!("unopened expression in {}", template)));
    }
    out.push_str(rest);
    Ok(out)
}

fn expand_expression(expr: &str, vars: &Map<String, Value>, out: &mut String) -> Result<()> {
    let mut chars = expr.chars();
    let (op, list) = match chars.next().and_then(operator) {
        Some(op) => (op, chars.as_str()),
        None => (op("", ",", false, "", false), expr),
    };

    let mut parts = Vec::new();
    for spec in list.split(',') {
        let spec = parse_varspec(spec)?;
        if let Some(value) = vars.get(spec.name) {
            if let Some(part) = expand_var(&op, &spec, value) {
                parts.push(part);
            }
        }
    }

    if !parts.is_empty() {
        out.push_str(op.first);
        out.push_str(&parts.join(op.sep));
    }
    Ok(())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn expand_var(op: &Operator, spec: &VarSpec<'_>, value: &Value) -> Option<String> {
    let enc = |s: &str| encode(s, op.allow_reserved);

    match value {
        Value::Null => None,
        Value::Array(items) => {
            let items: Vec<String> = items.iter().filter_map(scalar).collect();
            if items.is_empty() {
                return None;
            }
            Some(if spec.explode {
                items
                    .iter()
                    .map(|item| {
                        if op.named {
                            named(spec.name, &enc(item), op.if_empty)
                        } else {
                            enc(item)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(op.sep)
            } else {
                let joined = items.iter().map(|i| enc(i)).collect::<Vec<_>>().join(",");
                if op.named {
                    named(spec.name, &joined, op.if_empty)
                } else {
                    joined
                }
            })
        }
        Value::Object(map) => {
            let pairs: Vec<(String, String)> = map
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect();
            if pairs.is_empty() {
                return None;
            }
            Some(if spec.explode {
                pairs
                    .iter()
                    .map(|(k, v)| named(&enc(k), &enc(v), op.if_empty))
                    .collect::<Vec<_>>()
                    .join(op.sep)
            } else {
                let joined = pairs
                    .iter()
                    .map(|(k, v)| format!("{},{}", enc(k), enc(v)))
                    .collect::<Vec<_>>()
                    .join(",");
                if op.named {
                    named(spec.name, &joined, op.if_empty)
                } else {
                    joined
                }
            })
        }
        other => {
            let s = scalar(other)?;
            let s = match spec.prefix {
                Some(len) => s.chars().take(len).collect(),
                None => s,
            };
            let encoded = enc(&s);
            Some(if op.named {
                named(spec.name, &encoded, op.if_empty)
            } else {
                encoded
            })
        }
    }
}

fn named(name: &str, value: &str, if_empty: &str) -> String {
    if value.is_empty() {
        format!("{}{}", name, if_empty)
    } else {
        format!("{}={}", name, value)
    }
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

fn is_reserved(c: char) -> bool {
    matches!(
        c,
        ':' | '/' | '?' | '#' | '[' | ']' | '@' | '!' | '$' | '&' | '\'' | '(' | ')' | '*'
            | '+' | ',' | ';' | '='
    )
}

fn encode(value: &str, allow_reserved: bool) -> String {
    let mut out = String::with_capacity(value.len());
    let bytes = value.as_bytes();
    let mut i = 0;
    for c in value.chars() {
        let len = c.len_utf8();
        let keep_triplet = allow_reserved
            && c == '%'
            && bytes.len() >= i + 3
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();

        if is_unreserved(c) || (allow_reserved && is_reserved(c)) || keep_triplet {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", b));
            }
        }
        i += len;
    }
    out
}
