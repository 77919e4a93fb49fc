//! Turn lifecycle.
//!
//! ```text
//! Idle → PolicySanitizing → DiffNarrating → SectionRegenerating
//!      → Joining → ReportingAndForecasting → Committed
//!
//! any stage after Idle ──(failure)──▶ Errored
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::errors::TurnError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnStage {
    #[default]
    Idle,
    PolicySanitizing,
    DiffNarrating,
    /// One concurrent task per dimension
    SectionRegenerating,
    Joining,
    /// Report and next-period events, concurrently
    ReportingAndForecasting,
    Committed,
    Errored,
}

impl TurnStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::PolicySanitizing => "policy_sanitizing",
            Self::DiffNarrating => "diff_narrating",
            Self::SectionRegenerating => "section_regenerating",
            Self::Joining => "joining",
            Self::ReportingAndForecasting => "reporting_and_forecasting",
            Self::Committed => "committed",
            Self::Errored => "errored",
        }
    }

    /// The following stage on the success path.
    pub fn next(&self) -> Option<TurnStage> {
        match self {
            Self::Idle => Some(Self::PolicySanitizing),
            Self::PolicySanitizing => Some(Self::DiffNarrating),
            Self::DiffNarrating => Some(Self::SectionRegenerating),
            Self::SectionRegenerating => Some(Self::Joining),
            Self::Joining => Some(Self::ReportingAndForecasting),
            Self::ReportingAndForecasting => Some(Self::Committed),
            Self::Committed | Self::Errored => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Committed | Self::Errored)
    }

    pub fn can_transition_to(&self, target: TurnStage) -> bool {
        if target == Self::Errored {
            return !matches!(self, Self::Idle) && !self.is_terminal();
        }
        self.next() == Some(target)
    }

    /// Status line shown to the player when the stage starts.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting to start",
            Self::PolicySanitizing => "Reviewing the proposed policy",
            Self::DiffNarrating => "Projecting how the state changes this period",
            Self::SectionRegenerating => "Updating every dimension of the state",
            Self::Joining => "Assembling the new state document",
            Self::ReportingAndForecasting => "Writing the report and forecasting next period's events",
            Self::Committed => "Turn complete",
            Self::Errored => "Turn failed",
        }
    }
}

impl fmt::Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Follows one run through its stages and logs each transition.
#[derive(Debug)]
pub(crate) struct StageTracker {
    entity_id: String,
    stage: TurnStage,
    started: Instant,
}

impl StageTracker {
    pub(crate) fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            stage: TurnStage::Idle,
            started: Instant::now(),
        }
    }

    pub(crate) fn stage(&self) -> TurnStage {
        self.stage
    }

    pub(crate) fn enter(&mut self, next: TurnStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "invalid turn transition {} -> {}",
            self.stage,
            next
        );
        tracing::info!(
            entity_id = %self.entity_id,
            from = %self.stage,
            to = %next,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "turn stage"
        );
        self.stage = next;
    }

    /// Record a failure. Failures before the first stage only reject the turn.
    pub(crate) fn fail(&mut self, error: &TurnError) {
        if self.stage.can_transition_to(TurnStage::Errored) {
            tracing::warn!(
                entity_id = %self.entity_id,
                stage = %self.stage,
                error = %error,
                "turn failed"
            );
            self.stage = TurnStage::Errored;
        } else {
            tracing::info!(entity_id = %self.entity_id, error = %error, "turn rejected");
        }
    }
}
