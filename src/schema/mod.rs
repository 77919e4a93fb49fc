//! Document schema: the ordered list of dimensions a state document is made of.
//!
//! The schema is plain configuration. It is built once (either
//! [`DocumentSchema::builtin`] or loaded from a TOML file) and handed to the
//! orchestrator behind an `Arc`; nothing mutates it afterwards.
//!
//! ```toml
//! [[dimensions]]
//! title = "Economy"
//! template = "## Economic Metrics\n- Gross Domestic Product (GDP): {AmountUSD}"
//! seed_assumptions = ["Assume an initial GDP of 2.7 billion USD"]
//! depends_on = ["People"]
//! ```

mod dimensions;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::SchemaError;
use crate::parser::normalize_key;

/// One named section of the state document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub title: String,
    /// Field placeholders plus inline `<!-- -->` guidance.
    pub template: String,
    /// Constraints injected only when a state is first generated.
    #[serde(default)]
    pub seed_assumptions: Vec<String>,
    /// Other dimensions whose previous text is shown when regenerating this one.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl DimensionSpec {
    pub fn new(title: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            template: template.into(),
            seed_assumptions: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_seed_assumptions<I, S>(mut self, assumptions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_assumptions = assumptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_depends_on<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = titles.into_iter().map(Into::into).collect();
        self
    }

    /// Seed assumptions as prompt lines, one `- ` bullet each. Empty when there are none.
    pub fn seed_constraints(&self) -> String {
        self.seed_assumptions
            .iter()
            .map(|a| format!("- {a}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Top-level tree key of this dimension once parsed.
    pub fn key(&self) -> String {
        normalize_key(&self.title)
    }
}

/// The ordered, immutable list of dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSchema {
    dimensions: Vec<DimensionSpec>,
}

impl DocumentSchema {
    /// Build and validate a schema.
    pub fn new(dimensions: Vec<DimensionSpec>) -> Result<Self, SchemaError> {
        let schema = Self { dimensions };
        schema.validate()?;
        Ok(schema)
    }

    /// The built-in thirteen-dimension schema.
    pub fn builtin() -> Self {
        Self {
            dimensions: dimensions::builtin_dimensions(),
        }
    }

    /// Load a schema from a TOML file of `[[dimensions]]` tables.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid schema file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let schema: DocumentSchema =
            toml::from_str(content).context("Failed to parse schema TOML")?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.dimensions.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for dimension in &self.dimensions {
            if !seen.insert(dimension.title.to_lowercase()) {
                return Err(SchemaError::DuplicateTitle {
                    title: dimension.title.clone(),
                });
            }
        }
        for dimension in &self.dimensions {
            for dependency in &dimension.depends_on {
                if dependency.eq_ignore_ascii_case(&dimension.title) {
                    return Err(SchemaError::SelfDependency {
                        title: dimension.title.clone(),
                    });
                }
                if self.get(dependency).is_none() {
                    return Err(SchemaError::UnknownDependency {
                        title: dimension.title.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn dimensions(&self) -> &[DimensionSpec] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Look up a dimension by title (case-insensitive).
    pub fn get(&self, title: &str) -> Option<&DimensionSpec> {
        self.dimensions
            .iter()
            .find(|d| d.title.eq_ignore_ascii_case(title.trim()))
    }

    /// Top-level tree keys, in schema order.
    pub fn section_keys(&self) -> Vec<String> {
        self.dimensions.iter().map(DimensionSpec::key).collect()
    }

    /// The full document template, one `# Title` per dimension.
    pub fn render_template(&self) -> String {
        self.dimensions
            .iter()
            .map(|d| format!("# {}\n\n{}", d.title, d.template))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for DocumentSchema {
    fn default() -> Self {
        Self::builtin()
    }
}
