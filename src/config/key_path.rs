//! Key paths into the configuration tree.

use std::fmt;

/// An ordered sequence of lower-cased key segments, e.g. `languages.en.params`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The empty path, addressing the whole tree.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from segments. Segments are lower-cased.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// Parse a dot-separated path. Empty segments are dropped.
    pub fn parse(path: &str) -> Self {
        Self::new(path.split('.').filter(|s| !s.is_empty()))
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: impl AsRef<str>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.as_ref().to_lowercase());
        Self(segments)
    }

    /// Return a new path with all of `other`'s segments appended.
    pub fn join(&self, other: &KeyPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// The path without its last segment. The root has no parent.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// If `self` starts with `prefix`, the remaining segments.
    pub fn strip_prefix(&self, prefix: &KeyPath) -> Option<KeyPath> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }

    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Every proper prefix of this path, shortest first (root excluded).
    pub fn ancestors(&self) -> impl Iterator<Item = KeyPath> + '_ {
        (1..self.0.len()).map(|n| Self(self.0[..n].to_vec()))
    }

    /// Replace the first segment, used for alias resolution.
    pub(crate) fn with_first(&self, first: &str) -> Self {
        let mut segments = self.0.clone();
        if let Some(head) = segments.first_mut() {
            *head = first.to_string();
        }
        Self(segments)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases_and_skips_empty() {
        let path = KeyPath::parse("Languages..EN.params");
        assert_eq!(path.segments(), ["languages", "en", "params"]);
        assert_eq!(path.to_string(), "languages.en.params");
    }

    #[test]
    fn test_root_is_empty() {
        assert!(KeyPath::root().is_root());
        assert!(KeyPath::parse("").is_root());
        assert_eq!(KeyPath::root().parent(), None);
    }

    #[test]
    fn test_strip_prefix() {
        let path = KeyPath::parse("menus.main.home");
        let rest = path.strip_prefix(&KeyPath::parse("menus")).unwrap();
        assert_eq!(rest, KeyPath::parse("main.home"));
        assert!(path.strip_prefix(&KeyPath::parse("params")).is_none());
    }

    #[test]
    fn test_ancestors_shortest_first() {
        let path = KeyPath::parse("a.b.c");
        let ancestors: Vec<_> = path.ancestors().map(|p| p.to_string()).collect();
        assert_eq!(ancestors, vec!["a", "a.b"]);
    }

    #[test]
    fn test_ordering_puts_prefix_first() {
        let mut paths = vec![KeyPath::parse("menus.main"), KeyPath::parse("menus")];
        paths.sort();
        assert_eq!(paths[0], KeyPath::parse("menus"));
    }
}
