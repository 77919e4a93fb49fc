//! The typed document tree.
//!
//! A [`DocumentTree`] is an insertion-ordered map from normalized key to
//! [`Node`]. The merge-or-list decision is made once when the tree is built
//! and recorded in the variant; readers never re-inspect raw lines.
//!
//! Serializes to plain JSON: maps become objects (in document order), lists
//! become string arrays and leaves become `{raw, value, unit, label}` objects.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::value::ParsedValue;

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Map(DocumentTree),
    List(Vec<String>),
    Leaf(ParsedValue),
}

impl Node {
    pub fn as_map(&self) -> Option<&DocumentTree> {
        match self {
            Node::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Node::List(lines) => Some(lines),
            _ => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&ParsedValue> {
        match self {
            Node::Leaf(value) => Some(value),
            _ => None,
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Map(map) => map.serialize(serializer),
            Node::List(lines) => lines.serialize(serializer),
            Node::Leaf(value) => value.serialize(serializer),
        }
    }
}

/// Ordered mapping from normalized key to node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentTree {
    entries: Vec<(String, Node)>,
}

impl DocumentTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. A key that is already present keeps its position and
    /// takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    /// Look up a dotted key path such as `economy.economic_metrics.inflation_rate`.
    pub fn get_path(&self, path: &str) -> Option<&Node> {
        let mut segments = path.split('.').map(str::trim);
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            node = node.as_map()?.get(segment)?;
        }
        Some(node)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, n)| (k.as_str(), n))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Project the tree down to the requested dotted key paths.
    ///
    /// Nesting along each path is preserved; paths that do not resolve are
    /// skipped. Paths sharing a prefix merge into the same branch.
    pub fn project<S: AsRef<str>>(&self, paths: &[S]) -> DocumentTree {
        let mut projected = DocumentTree::new();
        for path in paths {
            let path = path.as_ref().trim();
            if path.is_empty() {
                continue;
            }
            let Some(node) = self.get_path(path) else {
                continue;
            };
            let segments: Vec<&str> = path.split('.').map(str::trim).collect();
            projected.insert_along(&segments, node);
        }
        projected
    }

    fn insert_along(&mut self, segments: &[&str], node: &Node) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.insert(*head, node.clone());
        } else if let Some(child) = self.child_map_mut(head) {
            child.insert_along(rest, node);
        }
    }

    fn child_map_mut(&mut self, key: &str) -> Option<&mut DocumentTree> {
        if self.get(key).is_none() {
            self.entries
                .push((key.to_string(), Node::Map(DocumentTree::new())));
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, Node::Map(map))) => Some(map),
            _ => None,
        }
    }
}

impl Serialize for DocumentTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, node) in &self.entries {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}
