//! Scripted generator and fixtures for pipeline tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::generator::{Effort, TextGenerator};
use crate::schema::{DimensionSpec, DocumentSchema};
use crate::store::{MemoryStore, SnapshotDocument, SnapshotStore};

/// Replies by looking for the tag each prompt builder emits.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    sections: HashMap<String, String>,
    report_reply: Option<String>,
    events_reply: Option<String>,
    fail_marker: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) const POLICY: &'static str = "Policy: Raise the fuel tax by 5%.";
    pub(crate) const NARRATIVE: &'static str = "Fuel prices rise and the economy slows.";

    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_section(mut self, title: &str, body: &str) -> Self {
        self.sections.insert(title.to_string(), body.to_string());
        self
    }

    pub(crate) fn with_report_reply(mut self, reply: &str) -> Self {
        self.report_reply = Some(reply.to_string());
        self
    }

    pub(crate) fn with_events_reply(mut self, reply: &str) -> Self {
        self.events_reply = Some(reply.to_string());
        self
    }

    /// Fail every prompt containing `marker`.
    pub(crate) fn failing_on(mut self, marker: &str) -> Self {
        self.fail_marker = Some(marker.to_string());
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub(crate) fn prompt_containing(&self, marker: &str) -> Option<String> {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.contains(marker))
            .cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, _effort: Effort) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(marker) = &self.fail_marker
            && prompt.contains(marker)
        {
            bail!("scripted failure");
        }

        const SECTION_TAG: &str = "<section-template title=\"";
        if prompt.contains("<policy-request>") {
            Ok(Self::POLICY.to_string())
        } else if prompt.contains("<new-events>") {
            Ok(Self::NARRATIVE.to_string())
        } else if let Some(start) = prompt.find(SECTION_TAG) {
            let rest = &prompt[start + SECTION_TAG.len()..];
            let title = &rest[..rest.find('"').unwrap_or(0)];
            let body = self
                .sections
                .get(title)
                .cloned()
                .unwrap_or_else(|| format!("- Summary: {title} updated"));
            Ok(format!("```markdown\n{body}\n```"))
        } else if prompt.contains("<report-template>") {
            Ok(self.report_reply.clone().unwrap_or_else(|| {
                "```markdown\n### Executive Summary\n\nFuel got expensive.\n```".to_string()
            }))
        } else if prompt.contains("<events-template>") {
            Ok(self
                .events_reply
                .clone()
                .unwrap_or_else(|| "```markdown\n# Weather\n- 100% Flood\n```".to_string()))
        } else if prompt.contains("<flag-request>") {
            Ok("```svg\n<svg viewBox=\"0 0 3 2\"/>\n```".to_string())
        } else if prompt.contains("<advice-template>") {
            Ok("```markdown\n- Cut income tax\n- Build a rail line\n- Fund rural schools\n- Hire more police\n- Host the Olympics\n```".to_string())
        } else {
            bail!("unexpected prompt")
        }
    }
}

/// People and Economy; Economy depends on People.
pub(crate) fn small_schema() -> DocumentSchema {
    DocumentSchema::new(vec![
        DimensionSpec::new("People", "- Total: {Number}"),
        DimensionSpec::new("Economy", "- GDP: {AmountUSD}").with_depends_on(["People"]),
    ])
    .unwrap()
}

/// A state with one committed snapshot for January 2025.
pub(crate) async fn seed_state(store: &Arc<MemoryStore>) -> String {
    let id = store.create_entity("Veloria").await.unwrap().id;
    store
        .append_snapshot(
            &id,
            SnapshotDocument::new(
                "2025-01",
                "# People\n\n- Total: 5 million\n\n# Economy\n\n- GDP: $2 billion",
            )
            .with_candidate_events("# Weather\n- 100% Drought"),
        )
        .await
        .unwrap();
    id
}
