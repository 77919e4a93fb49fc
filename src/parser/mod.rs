//! Structured-text parser.
//!
//! Converts a generated state document into a typed [`DocumentTree`]:
//!
//! ```text
//! # Economy                          economy:
//! ## Economic System                   economic_system: ["A mixed market ..."]
//! A mixed market ...          ==>      economic_metrics:
//! ## Economic Metrics                    gdp: {raw: "$2.7 billion", value: 2.7e9, unit: "units"}
//! - GDP: $2.7 billion                    inflation_rate: {raw: "3%", value: 0.03, unit: "%"}
//! - Inflation Rate: 3%
//! ```
//!
//! Parsing is a pure function of the text and the [`ProseRules`] table:
//! comments are stripped, headings nest by `#` count, and a run of lines
//! becomes a map only when every line is a `Label: Value` pair outside a
//! prose heading.

pub mod composition;
pub mod extract;
pub mod rules;
pub mod tree;
pub mod value;

pub use composition::normalize_compositions;
pub use extract::{
    extract_codeblock, find_section, join_sections, split_sections, strip_title_heading,
};
pub use rules::ProseRules;
pub use tree::{DocumentTree, Node};
pub use value::{ParsedValue, normalize_key, parse_value};

use regex::Regex;
use std::sync::LazyLock;

use crate::schema::DocumentSchema;

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#+)\s+(\S.*?)\s*$").unwrap());

/// Key under which text preceding the first sub-heading is stored.
pub const PREAMBLE_KEY: &str = "_preamble";

/// Remove every `<!-- ... -->` span, including multi-line ones.
pub fn strip_comments(text: &str) -> String {
    COMMENT_REGEX.replace_all(text, "").into_owned()
}

/// Builds document trees according to a prose rule table.
#[derive(Debug, Clone, Default)]
pub struct DocumentParser {
    rules: ProseRules,
}

impl DocumentParser {
    pub fn new(rules: ProseRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ProseRules {
        &self.rules
    }

    /// Parse a full document.
    pub fn parse(&self, text: &str) -> DocumentTree {
        let stripped = strip_comments(text);
        let lines: Vec<&str> = stripped.lines().collect();
        self.build_map(None, &lines)
    }

    /// Parse, then keep only the requested dotted key paths.
    pub fn parse_filtered<S: AsRef<str>>(&self, text: &str, paths: &[S]) -> DocumentTree {
        self.parse(text).project(paths)
    }

    fn build_map(&self, parent_title: Option<&str>, lines: &[&str]) -> DocumentTree {
        let mut tree = DocumentTree::new();

        let Some(level) = lines.iter().filter_map(|l| heading(l)).map(|(lvl, _)| lvl).min() else {
            // No headings at all: the whole run is content of the parent
            if let Some(node) = self.build_content(parent_title, lines) {
                tree.insert(PREAMBLE_KEY, node);
            }
            return tree;
        };

        let mut preamble: Vec<&str> = Vec::new();
        let mut current: Option<(&str, Vec<&str>)> = None;

        for &line in lines {
            match heading(line) {
                Some((lvl, title)) if lvl == level => {
                    if let Some((title, body)) = current.take() {
                        self.insert_section(&mut tree, title, &body);
                    }
                    current = Some((title, Vec::new()));
                }
                _ => match current.as_mut() {
                    Some((_, body)) => body.push(line),
                    None => preamble.push(line),
                },
            }
        }
        if let Some((title, body)) = current {
            self.insert_section(&mut tree, title, &body);
        }

        if let Some(node) = self.build_content(parent_title, &preamble) {
            tree.insert(PREAMBLE_KEY, node);
        }
        tree
    }

    fn insert_section(&self, tree: &mut DocumentTree, title: &str, body: &[&str]) {
        let key = match normalize_key(title) {
            k if k.is_empty() => title.trim().to_lowercase(),
            k => k,
        };
        let node = if body.iter().any(|l| heading(l).is_some()) {
            Node::Map(self.build_map(Some(title), body))
        } else {
            self.build_content(Some(title), body)
                .unwrap_or_else(|| Node::List(Vec::new()))
        };
        tree.insert(key, node);
    }

    /// Decide map-or-list for a run of heading-free lines. `None` when the run is blank.
    fn build_content(&self, title: Option<&str>, lines: &[&str]) -> Option<Node> {
        let content: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if content.is_empty() {
            return None;
        }

        let prose = title.is_some_and(|t| self.rules.treats_as_prose(t));
        if !prose {
            let pairs: Option<Vec<(&str, &str)>> =
                content.iter().map(|l| value::split_label_value(l)).collect();
            if let Some(pairs) = pairs {
                let mut map = DocumentTree::new();
                for (label, raw) in pairs {
                    map.insert(normalize_key(label), Node::Leaf(parse_value(label, raw)));
                }
                return Some(Node::Map(map));
            }
        }

        Some(Node::List(
            content.iter().map(|l| value::strip_bullet(l).to_string()).collect(),
        ))
    }
}

impl DocumentTree {
    /// Schema dimensions with no top-level entry in this tree.
    pub fn missing_sections(&self, schema: &DocumentSchema) -> Vec<String> {
        schema
            .dimensions()
            .iter()
            .filter(|d| self.get(&normalize_key(&d.title)).is_none())
            .map(|d| d.title.clone())
            .collect()
    }
}

fn heading(line: &str) -> Option<(usize, &str)> {
    let caps = HEADING_REGEX.captures(line)?;
    let level = caps.get(1)?.as_str().len();
    let title = caps.get(2)?.as_str();
    Some((level, title))
}
