//! The turn pipeline.
//!
//! A turn advances one state by one period:
//!
//! 1. sample this period's events from the latest snapshot's candidates
//! 2. sanitize the player's policy
//! 3. narrate the changes (events + policy + previous document)
//! 4. regenerate every dimension concurrently from the narrative
//! 5. join the sections in schema order and normalize compositions
//! 6. write the report and forecast next period's candidate events, concurrently
//! 7. commit the new snapshot and record the sampled events on the previous one, atomically
//!
//! Any failure aborts the turn before anything is written. The caller owns
//! the turn lock; see [`crate::guard`].

pub mod create;
pub mod policy;
pub mod stage;
#[cfg(test)]
pub(crate) mod testing;

pub use create::CreateRequest;
pub use policy::{SanitizedPolicy, sanitize_policy};
pub use stage::TurnStage;

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

use crate::config::TurnConfig;
use crate::errors::TurnError;
use crate::events::{self, EventSampleResult};
use crate::generator::{Effort, TextGenerator};
use crate::parser::{
    extract_codeblock, find_section, join_sections, normalize_compositions, split_sections,
    strip_title_heading,
};
use crate::period;
use crate::prompts;
use crate::schema::DocumentSchema;
use crate::store::{SnapshotDocument, SnapshotStore};
use crate::stream::StatusSink;
use stage::StageTracker;

/// Runs turns and creations against one schema, generator and store.
pub struct TurnOrchestrator {
    schema: Arc<DocumentSchema>,
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn SnapshotStore>,
    config: TurnConfig,
    rng: Mutex<StdRng>,
}

impl TurnOrchestrator {
    pub fn new(
        schema: Arc<DocumentSchema>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn SnapshotStore>,
        config: TurnConfig,
    ) -> Self {
        let rng = match config.sampler_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            schema,
            generator,
            store,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn schema(&self) -> &DocumentSchema {
        &self.schema
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    /// Advance `entity_id` by one period.
    ///
    /// The caller must hold the state's turn lock for the whole call.
    pub async fn run_turn(
        &self,
        entity_id: &str,
        raw_policy: &str,
        sink: &StatusSink,
    ) -> Result<SnapshotDocument, TurnError> {
        let mut tracker = StageTracker::new(entity_id);
        match self.execute_turn(entity_id, raw_policy, sink, &mut tracker).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                tracker.fail(&e);
                Err(e)
            }
        }
    }

    async fn execute_turn(
        &self,
        entity_id: &str,
        raw_policy: &str,
        sink: &StatusSink,
        tracker: &mut StageTracker,
    ) -> Result<SnapshotDocument, TurnError> {
        let entity = self
            .store
            .entity(entity_id)
            .await
            .map_err(TurnError::Store)?
            .ok_or_else(|| TurnError::EntityNotFound {
                entity_id: entity_id.to_string(),
            })?;
        let (latest, previous) = self
            .store
            .latest_two(entity_id)
            .await
            .map_err(TurnError::Store)?;
        let latest = latest.ok_or_else(|| TurnError::NoSnapshot {
            entity_id: entity_id.to_string(),
        })?;

        let next_key = period::next_period(&latest.period_key, self.config.period_months)?;
        if next_key <= latest.period_key {
            return Err(TurnError::PeriodNotAdvancing {
                latest: latest.period_key,
                next: next_key,
            });
        }
        let current_label = period::period_label(&latest.period_key)?;
        let next_label = period::period_label(&next_key)?;

        let sampled = self.sample(latest.candidate_events_text.as_deref().unwrap_or_default());
        tracing::info!(
            entity_id,
            state = %entity.name,
            period = %next_key,
            notable = sampled.iter().filter(|r| r.is_notable()).count(),
            "starting turn"
        );

        tracker.enter(TurnStage::PolicySanitizing);
        sink.status(TurnStage::PolicySanitizing.describe());
        let policy =
            sanitize_policy(self.generator.as_ref(), raw_policy, self.config.max_policy_chars)
                .await?;

        tracker.enter(TurnStage::DiffNarrating);
        sink.status(TurnStage::DiffNarrating.describe());
        let prior_events = previous
            .as_ref()
            .and_then(|p| p.prior_events_text.as_deref())
            .unwrap_or_default();
        let prompt = prompts::diff_narrative_prompt(
            &current_label,
            &next_label,
            &latest.body_text,
            prior_events,
            &events::format_notable_events(&sampled),
            &policy.text,
        );
        let narrative = self
            .generator
            .generate(&prompt, Effort::High)
            .await
            .map_err(|e| TurnError::generator("Diff narration", e))?
            .trim()
            .to_string();
        if narrative.is_empty() {
            return Err(TurnError::UnexpectedShape {
                stage: "Diff narration".into(),
                detail: "empty narrative".into(),
            });
        }

        tracker.enter(TurnStage::SectionRegenerating);
        sink.status(TurnStage::SectionRegenerating.describe());
        let prior_sections = split_sections(&latest.body_text);
        let section_prompts = self
            .schema
            .dimensions()
            .iter()
            .map(|dimension| {
                let previous_section = find_section(&prior_sections, &dimension.title)
                    .unwrap_or_else(|| {
                        tracing::warn!(
                            entity_id,
                            dimension = %dimension.title,
                            "previous document has no such section"
                        );
                        ""
                    });
                let related: Vec<(&str, &str)> = dimension
                    .depends_on
                    .iter()
                    .filter_map(|title| {
                        find_section(&prior_sections, title).map(|text| (title.as_str(), text))
                    })
                    .collect();
                prompts::section_prompt(
                    dimension,
                    previous_section,
                    &related,
                    &narrative,
                    &next_label,
                )
            })
            .collect();
        let sections = self.generate_sections(section_prompts, sink, "Updated").await?;

        tracker.enter(TurnStage::Joining);
        sink.status(TurnStage::Joining.describe());
        let body = self.join(&sections);

        tracker.enter(TurnStage::ReportingAndForecasting);
        sink.status(TurnStage::ReportingAndForecasting.describe());
        let (report, candidates) = tokio::try_join!(
            self.generate_report(&next_label, &narrative),
            self.forecast_events(&next_label, &body),
        )?;

        let event_log = events::format_event_log(&sampled);
        let snapshot = SnapshotDocument::new(next_key, body)
            .with_diff(narrative, report)
            .with_candidate_events(candidates);
        self.store
            .commit_turn(entity_id, &latest.period_key, &event_log, snapshot.clone())
            .await
            .map_err(TurnError::Store)?;

        tracker.enter(TurnStage::Committed);
        sink.status(format!("{} is now in {}", entity.name, next_label));
        Ok(snapshot)
    }

    fn sample(&self, candidates: &str) -> Vec<EventSampleResult> {
        let categories = events::parse_event_categories(candidates);
        // Poisoning only means a panic mid-draw; the generator state is still usable
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        events::sample_events(&categories, &mut *rng)
    }

    /// Run one generator call per dimension and return the sections in schema order.
    async fn generate_sections(
        &self,
        prompts: Vec<String>,
        sink: &StatusSink,
        verb: &str,
    ) -> Result<Vec<String>, TurnError> {
        let dimensions = self.schema.dimensions();
        let total = dimensions.len();
        let mut set = JoinSet::new();

        for (index, prompt) in prompts.into_iter().enumerate() {
            let generator = Arc::clone(&self.generator);
            let title = dimensions[index].title.clone();
            set.spawn(async move {
                let stage = format!("Section '{}'", title);
                let reply = generator
                    .generate(&prompt, Effort::Medium)
                    .await
                    .map_err(|e| TurnError::generator(stage.clone(), e))?;
                let section = extract_codeblock(&reply, "markdown")
                    .map_err(|e| TurnError::extraction(stage, e))?;
                Ok::<_, TurnError>((index, strip_title_heading(&section).to_string()))
            });
        }

        let mut sections: Vec<Option<String>> = vec![None; total];
        let mut done = 0;
        // Returning early drops the set, which aborts the remaining tasks
        while let Some(joined) = set.join_next().await {
            let (index, text) = joined.map_err(|e| TurnError::TaskFailed(e.to_string()))??;
            done += 1;
            sink.status(format!("{verb} {} ({done}/{total})", dimensions[index].title));
            sections[index] = Some(text);
        }

        sections
            .into_iter()
            .zip(dimensions)
            .map(|(section, dimension)| {
                section.ok_or_else(|| {
                    TurnError::TaskFailed(format!("no result for section '{}'", dimension.title))
                })
            })
            .collect()
    }

    fn join(&self, sections: &[String]) -> String {
        let titled: Vec<(&str, &str)> = self
            .schema
            .dimensions()
            .iter()
            .zip(sections)
            .map(|(dimension, text)| (dimension.title.as_str(), text.as_str()))
            .collect();
        normalize_compositions(&join_sections(&titled))
    }

    async fn generate_report(&self, next_label: &str, narrative: &str) -> Result<String, TurnError> {
        const STAGE: &str = "Report";
        let reply = self
            .generator
            .generate(&prompts::report_prompt(next_label, narrative), Effort::Medium)
            .await
            .map_err(|e| TurnError::generator(STAGE, e))?;
        extract_codeblock(&reply, "markdown").map_err(|e| TurnError::extraction(STAGE, e))
    }

    /// Candidate events for the period after `label`, validated to contain at least one category.
    async fn forecast_events(&self, label: &str, body: &str) -> Result<String, TurnError> {
        const STAGE: &str = "Event forecast";
        let reply = self
            .generator
            .generate(&prompts::events_prompt(label, body), Effort::Medium)
            .await
            .map_err(|e| TurnError::generator(STAGE, e))?;
        let text =
            extract_codeblock(&reply, "markdown").map_err(|e| TurnError::extraction(STAGE, e))?;
        if events::parse_event_categories(&text).is_empty() {
            return Err(TurnError::UnexpectedShape {
                stage: STAGE.into(),
                detail: "no event categories with weighted events".into(),
            });
        }
        Ok(text)
    }
}
