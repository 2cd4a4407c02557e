//! Ordered multimap of relation type to links.

use crate::types::Link;

/// Links grouped by `rel`.
///
/// Rels keep the order in which they were first seen, and links within a rel
/// keep insertion order. Absence is an empty result, never an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkSet {
    entries: Vec<(String, Vec<Link>)>,
}

impl LinkSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a link after any existing links with the same rel.
    pub fn add(&mut self, link: Link) {
        match self.entries.iter_mut().find(|(rel, _)| *rel == link.rel) {
            Some((_, links)) => links.push(link),
            None => self.entries.push((link.rel.clone(), vec![link])),
        }
    }

    pub fn add_all(&mut self, links: impl IntoIterator<Item = Link>) {
        for link in links {
            self.add(link);
        }
    }

    /// Replace every link with this rel by `link`.
    pub fn set(&mut self, link: Link) {
        match self.entries.iter_mut().find(|(rel, _)| *rel == link.rel) {
            Some((_, links)) => *links = vec![link],
            None => self.entries.push((link.rel.clone(), vec![link])),
        }
    }

    /// First link with this rel.
    pub fn get(&self, rel: &str) -> Option<&Link> {
        self.get_many(rel).first()
    }

    pub fn get_many(&self, rel: &str) -> &[Link] {
        self.entries
            .iter()
            .find(|(r, _)| r == rel)
            .map(|(_, links)| links.as_slice())
            .unwrap_or_default()
    }

    pub fn get_all(&self) -> Vec<&Link> {
        self.entries.iter().flat_map(|(_, links)| links).collect()
    }

    pub fn has(&self, rel: &str) -> bool {
        !self.get_many(rel).is_empty()
    }

    /// Whether a link with this rel points at `href`, resolved against the
    /// link's own context.
    pub fn contains(&self, rel: &str, href: &str) -> bool {
        self.get_many(rel)
            .iter()
            .any(|l| same_target(l, &l.href, href))
    }

    /// Remove all links with `rel`, or only those pointing at `href`.
    ///
    /// `href` may be relative; both sides are resolved before comparing.
    pub fn delete(&mut self, rel: &str, href: Option<&str>) {
        let Some(href) = href else {
            self.entries.retain(|(r, _)| r != rel);
            return;
        };

        if let Some((_, links)) = self.entries.iter_mut().find(|(r, _)| r == rel) {
            links.retain(|l| !same_target(l, &l.href, href));
        }
        self.entries.retain(|(_, links)| !links.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, links)| links.len()).sum()
    }

    pub fn rels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(rel, _)| rel.as_str())
    }
}

fn same_target(link: &Link, a: &str, b: &str) -> bool {
    match (link.context.join(a), link.context.join(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

impl IntoIterator for LinkSet {
    type Item = Link;
    type IntoIter = std::vec::IntoIter<Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .into_iter()
            .flat_map(|(_, links)| links)
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl FromIterator<Link> for LinkSet {
    fn from_iter<I: IntoIterator<Item = Link>>(iter: I) -> Self {
        let mut set = LinkSet::new();
        set.add_all(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn link(rel: &str, href: &str) -> Link {
        Link::new(rel, href, Url::parse("https://api.example/dir/").unwrap())
    }

    fn hrefs(set: &LinkSet, rel: &str) -> Vec<String> {
        set.get_many(rel).iter().map(|l| l.href.clone()).collect()
    }

    #[test]
    fn test_add_preserves_order() {
        let mut set = LinkSet::new();
        set.add(link("item", "/a"));
        set.add(link("item", "/b"));
        assert_eq!(hrefs(&set, "item"), vec!["/a", "/b"]);
        assert_eq!(set.get("item").unwrap().href, "/a");
    }

    #[test]
    fn test_set_replaces() {
        let mut set = LinkSet::new();
        set.add(link("item", "/a"));
        set.add(link("item", "/b"));
        set.set(link("item", "/c"));
        assert_eq!(hrefs(&set, "item"), vec!["/c"]);
    }

    #[test]
    fn test_set_on_new_rel() {
        let mut set = LinkSet::new();
        set.set(link("next", "/n"));
        assert!(set.has("next"));
    }

    #[test]
    fn test_absent_rel() {
        let set = LinkSet::new();
        assert!(set.get("nope").is_none());
        assert!(set.get_many("nope").is_empty());
        assert!(!set.has("nope"));
    }

    #[test]
    fn test_get_all_keeps_rel_order() {
        let mut set = LinkSet::new();
        set.add(link("b", "/1"));
        set.add(link("a", "/2"));
        set.add(link("b", "/3"));
        let all: Vec<_> = set.get_all().iter().map(|l| l.href.as_str()).collect();
        assert_eq!(all, vec!["/1", "/3", "/2"]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_delete_whole_rel() {
        let mut set = LinkSet::new();
        set.add(link("item", "/a"));
        set.add(link("next", "/n"));
        set.delete("item", None);
        assert!(!set.has("item"));
        assert!(set.has("next"));
    }

    #[test]
    fn test_delete_resolves_href() {
        let mut set = LinkSet::new();
        set.add(link("item", "a"));
        set.add(link("item", "/b"));
        // "a" relative to /dir/ is /dir/a
        set.delete("item", Some("https://api.example/dir/a"));
        assert_eq!(hrefs(&set, "item"), vec!["/b"]);
        set.delete("item", Some("/b"));
        assert!(!set.has("item"));
    }

    #[test]
    fn test_contains() {
        let mut set = LinkSet::new();
        set.add(link("item", "/a"));
        assert!(set.contains("item", "/a"));
        assert!(set.contains("item", "https://api.example/a"));
        assert!(!set.contains("item", "/b"));
        assert!(!set.contains("other", "/a"));
    }
}
