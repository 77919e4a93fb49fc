//! Policy sanitization.
//!
//! Player text goes to the generator only inside a rewrite prompt. The reply
//! is accepted only if it starts with [`POLICY_LABEL`]; anything else becomes
//! the no-policy sentinel, so injected instructions never reach later stages.

use serde::{Deserialize, Serialize};

use crate::errors::TurnError;
use crate::generator::{Effort, TextGenerator};
use crate::prompts::{self, NO_POLICY, POLICY_LABEL};

const STAGE: &str = "Policy sanitization";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedPolicy {
    pub text: String,
    pub accepted: bool,
}

impl SanitizedPolicy {
    pub fn none() -> Self {
        Self {
            text: NO_POLICY.to_string(),
            accepted: false,
        }
    }

    /// Validate a generator reply.
    pub fn from_reply(reply: &str) -> Self {
        let Some(line) = reply.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Self::none();
        };
        let line = line.trim_matches('`').trim();
        if !line.starts_with(POLICY_LABEL) || line == NO_POLICY {
            return Self::none();
        }
        if line[POLICY_LABEL.len()..].trim().is_empty() {
            return Self::none();
        }
        Self {
            text: line.to_string(),
            accepted: true,
        }
    }
}

/// Rewrite `raw` into a single labelled policy sentence.
///
/// Blank input skips the generator entirely.
pub async fn sanitize_policy(
    generator: &dyn TextGenerator,
    raw: &str,
    max_chars: usize,
) -> Result<SanitizedPolicy, TurnError> {
    let raw = prompts::truncate_chars(raw.trim(), max_chars);
    if raw.is_empty() {
        return Ok(SanitizedPolicy::none());
    }
    let reply = generator
        .generate(&prompts::sanitize_policy_prompt(raw), Effort::Low)
        .await
        .map_err(|e| TurnError::generator(STAGE, e))?;

    let policy = SanitizedPolicy::from_reply(&reply);
    if !policy.accepted {
        tracing::info!("policy request rejected during sanitization");
    }
    Ok(policy)
}
