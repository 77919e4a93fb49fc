//! State creation and policy advice.

use serde::{Deserialize, Serialize};

use super::TurnOrchestrator;
use crate::errors::TurnError;
use crate::generator::Effort;
use crate::parser::extract_codeblock;
use crate::parser::value::strip_bullet;
use crate::period;
use crate::prompts;
use crate::store::SnapshotDocument;
use crate::stream::StatusSink;

const MAX_NAME_CHARS: usize = 30;
const MAX_SUGGESTIONS: usize = 4;
const DEFAULT_NAME: &str = "New State";

/// Input for a new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    /// First period, `YYYY-MM`
    pub period: String,
    /// `(question, 1..=5)`, 1 = strongly disagree
    #[serde(default)]
    pub answers: Vec<(String, u8)>,
}

impl CreateRequest {
    /// Trimmed and shortened name; falls back to a placeholder when blank.
    pub fn display_name(&self) -> String {
        let name = prompts::truncate_chars(self.name.trim(), MAX_NAME_CHARS).trim();
        if name.is_empty() {
            DEFAULT_NAME.to_string()
        } else {
            name.to_string()
        }
    }
}

impl TurnOrchestrator {
    /// Create a state and commit its first snapshot.
    ///
    /// Sends a `created` record as soon as the state exists, so a client can
    /// navigate to it while its sections are still being written.
    pub async fn create_entity(
        &self,
        request: &CreateRequest,
        sink: &StatusSink,
    ) -> Result<SnapshotDocument, TurnError> {
        let period_key = period::validate_period(&request.period)?;
        let label = period::period_label(&period_key)?;
        let values = prompts::format_answers(&request.answers)?;
        let name = request.display_name();

        let entity = self
            .store
            .create_entity(&name)
            .await
            .map_err(TurnError::Store)?;
        tracing::info!(entity_id = %entity.id, state = %name, period = %period_key, "creating state");
        sink.created(&entity.id);

        sink.status(format!("Drafting {} dimensions", self.schema.len()));
        let section_prompts = self
            .schema
            .dimensions()
            .iter()
            .map(|dimension| prompts::create_section_prompt(dimension, &name, &label, &values))
            .collect();
        let sections = self.generate_sections(section_prompts, sink, "Drafted").await?;
        let body = self.join(&sections);

        sink.status("Designing the flag and forecasting events");
        let (flag, candidates) = tokio::try_join!(
            self.draw_flag(&name, &body),
            self.forecast_events(&label, &body),
        )?;

        self.store
            .set_flag(&entity.id, &flag)
            .await
            .map_err(TurnError::Store)?;
        let snapshot = SnapshotDocument::new(period_key, body).with_candidate_events(candidates);
        self.store
            .append_snapshot(&entity.id, snapshot.clone())
            .await
            .map_err(TurnError::Store)?;

        sink.status(format!("{name} was founded in {label}"));
        Ok(snapshot)
    }

    async fn draw_flag(&self, name: &str, body: &str) -> Result<String, TurnError> {
        const STAGE: &str = "Flag";
        let reply = self
            .generator
            .generate(&prompts::flag_prompt(name, body), Effort::Low)
            .await
            .map_err(|e| TurnError::generator(STAGE, e))?;
        extract_codeblock(&reply, "svg").map_err(|e| TurnError::extraction(STAGE, e))
    }

    /// Up to four policies the player could enact next.
    pub async fn suggest_policies(&self, entity_id: &str) -> Result<Vec<String>, TurnError> {
        const STAGE: &str = "Advice";
        let (latest, previous) = self
            .store
            .latest_two(entity_id)
            .await
            .map_err(TurnError::Store)?;
        let latest = latest.ok_or_else(|| TurnError::NoSnapshot {
            entity_id: entity_id.to_string(),
        })?;
        let recent = previous
            .as_ref()
            .and_then(|p| p.prior_events_text.as_deref())
            .unwrap_or_default();

        let reply = self
            .generator
            .generate(&prompts::advice_prompt(&latest.body_text, recent), Effort::Medium)
            .await
            .map_err(|e| TurnError::generator(STAGE, e))?;
        let text =
            extract_codeblock(&reply, "markdown").map_err(|e| TurnError::extraction(STAGE, e))?;

        let suggestions: Vec<String> = text
            .lines()
            .map(|line| strip_bullet(line).trim())
            .filter(|line| !line.is_empty())
            .take(MAX_SUGGESTIONS)
            .map(str::to_string)
            .collect();
        if suggestions.is_empty() {
            return Err(TurnError::UnexpectedShape {
                stage: STAGE.into(),
                detail: "no suggestions in reply".into(),
            });
        }
        Ok(suggestions)
    }
}
