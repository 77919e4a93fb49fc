//! Declarative rule table for headings whose content is always prose.
//!
//! Under a heading such as `Government System` or `Recent Citizen Quotes`, a
//! colon belongs to a sentence or an attribution, not a field separator, so
//! the tree builder keeps those lines as free text instead of a key/value map.

/// Heading suffixes whose children are treated as prose.
pub const DEFAULT_PROSE_SUFFIXES: &[&str] = &[
    "System",
    "Practices",
    "Identity",
    "Features",
    "Participation",
    "Technologies",
    "Headlines",
    "Quotes",
    "Landscape",
    "Relations",
    "Migration",
    "Market",
    "Infrastructure",
];

/// Suffix table consulted by the tree builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProseRules {
    suffixes: Vec<String>,
}

impl Default for ProseRules {
    fn default() -> Self {
        Self::new(DEFAULT_PROSE_SUFFIXES.iter().copied())
    }
}

impl ProseRules {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.into().trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Add another suffix to the table.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into().trim().to_ascii_lowercase();
        if !suffix.is_empty() && !self.suffixes.contains(&suffix) {
            self.suffixes.push(suffix);
        }
        self
    }

    /// True when `heading` ends with one of the prose suffixes (case-insensitive).
    pub fn treats_as_prose(&self, heading: &str) -> bool {
        let heading = heading.trim().to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| heading.ends_with(suffix.as_str()))
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.suffixes.iter().map(String::as_str)
    }
}
