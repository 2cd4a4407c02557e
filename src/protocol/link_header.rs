//! RFC 8288 `Link` header parsing.
//!
//! A header such as
//!
//! ```text
//! Link: </author/1>; rel="author me", <https://x/docs>; rel=help; title="Docs"
//! ```
//!
//! yields three [`HttpLink`]s: a `rel` with several space-separated tokens is
//! split into one logical link per token.

use http::header::LINK;
use http::HeaderMap;

/// One logical link from a `Link` header.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpLink {
    pub href: String,
    pub rel: String,
    pub title: Option<String>,
    pub media_type: Option<String>,
    pub anchor: Option<String>,
    pub hreflang: Option<String>,
    pub media: Option<String>,
}

/// Parse every `Link` header line on a message.
pub fn parse_link_headers(headers: &HeaderMap) -> Vec<HttpLink> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(parse_link_header)
        .collect()
}

/// Parse a single `Link` header value.
///
/// Malformed link-values are skipped; the parser never fails.
pub fn parse_link_header(value: &str) -> Vec<HttpLink> {
    let mut links = Vec::new();
    let mut cur = Cursor::new(value);

    loop {
        cur.skip_while(|c| c.is_whitespace() || c == ',');
        match cur.peek() {
            None => break,
            Some('<') => {
                cur.bump();
            }
            Some(_) => {
                cur.skip_while(|c| c != ',');
                continue;
            }
        }

        let href = cur.take_while(|c| c != '>').trim().to_string();
        if cur.bump() != Some('>') {
            break;
        }

        let params = parse_params(&mut cur);
        cur.skip_while(|c| c != ',');

        let param = |name: &str| {
            params
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        };
        let Some(rel) = param("rel") else {
            continue;
        };

        for token in rel.split_whitespace() {
            links.push(HttpLink {
                href: href.clone(),
                rel: token.to_string(),
                title: param("title"),
                media_type: param("type"),
                anchor: param("anchor"),
                hreflang: param("hreflang"),
                media: param("media"),
            });
        }
    }

    links
}

/// `; name=value` pairs after a link target. Only the first occurrence of a
/// parameter counts.
fn parse_params(cur: &mut Cursor<'_>) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = Vec::new();
    loop {
        cur.skip_while(char::is_whitespace);
        if cur.peek() != Some(';') {
            break;
        }
        cur.bump();
        cur.skip_while(char::is_whitespace);

        let name = cur
            .take_while(|c| c != '=' && c != ';' && c != ',' && !c.is_whitespace())
            .to_ascii_lowercase();
        cur.skip_while(char::is_whitespace);

        let value = if cur.peek() == Some('=') {
            cur.bump();
            cur.skip_while(char::is_whitespace);
            if cur.peek() == Some('"') {
                cur.quoted_string()
            } else {
                cur.take_while(|c| c != ';' && c != ',' && !c.is_whitespace())
                    .to_string()
            }
        } else {
            String::new()
        };

        if !name.is_empty() && !params.iter().any(|(n, _)| *n == name) {
            params.push((name, value));
        }
    }
    params
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        &self.input[start..self.pos]
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        self.take_while(pred);
    }

    /// Reads a quoted-string starting at the opening quote, unescaping `\x`.
    fn quoted_string(&mut self) -> String {
        self.bump();
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_single_link() {
        let links = parse_link_header(r#"</bar>; rel="invalidates""#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/bar");
        assert_eq!(links[0].rel, "invalidates");
    }

    #[test]
    fn test_multiple_rel_tokens_split() {
        let links = parse_link_header(r#"</me>; rel="author  me""#);
        let rels: Vec<_> = links.iter().map(|l| l.rel.as_str()).collect();
        assert_eq!(rels, vec!["author", "me"]);
        assert!(links.iter().all(|l| l.href == "/me"));
    }

    #[test]
    fn test_multiple_link_values() {
        let links = parse_link_header(
            r#"<https://x/a>; rel=next, <https://x/b>; rel="prev"; title="Back, then""#,
        );
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].rel, "next");
        assert_eq!(links[1].href, "https://x/b");
        assert_eq!(links[1].title.as_deref(), Some("Back, then"));
    }

    #[test]
    fn test_attributes() {
        let links = parse_link_header(
            r##"</doc>; rel=help; type="text/html"; hreflang=en; anchor="#frag"; media=screen"##,
        );
        let link = &links[0];
        assert_eq!(link.media_type.as_deref(), Some("text/html"));
        assert_eq!(link.hreflang.as_deref(), Some("en"));
        assert_eq!(link.anchor.as_deref(), Some("#frag"));
        assert_eq!(link.media.as_deref(), Some("screen"));
    }

    #[test]
    fn test_first_rel_wins() {
        let links = parse_link_header(r#"</x>; rel=first; rel=second"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].rel, "first");
    }

    #[test]
    fn test_escaped_quotes() {
        let links = parse_link_header(r#"</x>; rel=a; title="say \"hi\"""#);
        assert_eq!(links[0].title.as_deref(), Some(r#"say "hi""#));
    }

    #[test]
    fn test_missing_rel_is_skipped() {
        assert!(parse_link_header("</x>; title=nothing").is_empty());
    }

    #[test]
    fn test_garbage_is_skipped() {
        let links = parse_link_header("garbage, </ok>; rel=ok, <unterminated");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/ok");
    }

    #[test]
    fn test_empty() {
        assert!(parse_link_header("").is_empty());
    }

    #[test]
    fn test_multiple_header_lines() {
        let mut headers = HeaderMap::new();
        headers.append(LINK, HeaderValue::from_static("</a>; rel=a"));
        headers.append(LINK, HeaderValue::from_static("</b>; rel=b"));
        let links = parse_link_headers(&headers);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1].rel, "b");
    }
}
