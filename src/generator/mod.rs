//! The text generator boundary.
//!
//! Every pipeline stage sends one prompt and receives one text reply. The
//! [`TextGenerator`] trait is the seam: production uses an HTTP chat API or
//! the `claude` CLI, tests substitute scripted doubles.

pub mod claude;
pub mod openai;

pub use claude::ClaudeCliGenerator;
pub use openai::OpenAiGenerator;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{GeneratorBackend, SandboxConfig};

/// How much reasoning a stage asks for. Adapters map this to a model choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::Low => write!(f, "low"),
            Effort::Medium => write!(f, "medium"),
            Effort::High => write!(f, "high"),
        }
    }
}

/// Produces natural-language text from a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, effort: Effort) -> Result<String>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "generator"
    }
}

/// Build the generator selected by the configuration.
pub fn from_config(config: &SandboxConfig) -> Result<Arc<dyn TextGenerator>> {
    let generator = &config.toml.generator;
    match generator.backend {
        GeneratorBackend::Openai => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key found. Set {} or switch generator.backend to claude-cli",
                    generator.api_key_env
                )
            })?;
            Ok(Arc::new(OpenAiGenerator::new(generator, api_key)?))
        }
        GeneratorBackend::ClaudeCli => Ok(Arc::new(ClaudeCliGenerator::new(generator))),
    }
}
