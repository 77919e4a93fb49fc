//! Weighted random-event sampling.
//!
//! Candidate events arrive as a categorized document, one heading per
//! category and one `N% Description` bullet per outcome:
//!
//! ```text
//! # Environmental and Weather Events
//! - 80% No notable events
//! - 15% Severe flooding in the river delta
//! - 5% Category 4 hurricane makes landfall
//! ```
//!
//! Each category draws exactly one outcome, independently of the others, so
//! a period can see a flood and a recession at once. Weights are relative;
//! they do not need to sum to 100.

use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::parser::strip_comments;

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#+\s+(\S.*?)\s*$").unwrap());

static EVENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*]\s*(\d+(?:\.\d+)?)\s*%\s*(\S.*?)\s*$").unwrap());

/// Outcome text conventionally listed first in every category.
pub const NO_EVENT_TEXT: &str = "No notable events";

/// One category of mutually exclusive outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCategory {
    pub name: String,
    /// `(probability, text)` pairs; probability is the bullet's percentage / 100.
    pub events: Vec<(f64, String)>,
}

impl EventCategory {
    pub fn total_weight(&self) -> f64 {
        self.events.iter().map(|(w, _)| w).sum()
    }

    /// Draw one outcome.
    ///
    /// Walks the cumulative weights and returns the first event whose running
    /// sum reaches a uniform draw in `[0, total)`. Falls back to the last
    /// event for float edge cases, and to the first when the weights sum to
    /// zero or overflow.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let total = self.total_weight();
        if total <= 0.0 || !total.is_finite() {
            return self.events.first().map_or("", |(_, text)| text.as_str());
        }
        let draw = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        for (weight, text) in &self.events {
            cumulative += weight;
            if cumulative >= draw {
                return text;
            }
        }
        self.events.last().map_or("", |(_, text)| text.as_str())
    }
}

/// The outcome drawn for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSampleResult {
    pub category: String,
    pub chosen_text: String,
}

impl EventSampleResult {
    pub fn is_notable(&self) -> bool {
        !self.chosen_text.eq_ignore_ascii_case(NO_EVENT_TEXT)
    }
}

/// Parse a categorized event document.
///
/// Lines that are not `N% text` bullets are skipped. Categories without any
/// parseable event are omitted.
pub fn parse_event_categories(text: &str) -> Vec<EventCategory> {
    let stripped = strip_comments(text);
    let mut categories: Vec<EventCategory> = Vec::new();
    let mut current: Option<EventCategory> = None;

    for line in stripped.lines() {
        if let Some(caps) = HEADING_REGEX.captures(line) {
            if let Some(category) = current.take()
                && !category.events.is_empty()
            {
                categories.push(category);
            }
            current = Some(EventCategory {
                name: caps[1].to_string(),
                events: Vec::new(),
            });
            continue;
        }

        let Some(category) = current.as_mut() else {
            continue;
        };
        if let Some(caps) = EVENT_REGEX.captures(line)
            && let Ok(percent) = caps[1].parse::<f64>()
            && percent.is_finite()
        {
            category.events.push((percent / 100.0, caps[2].to_string()));
        }
    }
    if let Some(category) = current
        && !category.events.is_empty()
    {
        categories.push(category);
    }
    categories
}

/// Draw one outcome per category.
pub fn sample_events<R: Rng + ?Sized>(
    categories: &[EventCategory],
    rng: &mut R,
) -> Vec<EventSampleResult> {
    categories
        .iter()
        .map(|category| EventSampleResult {
            category: category.name.clone(),
            chosen_text: category.sample(rng).to_string(),
        })
        .collect()
}

/// Render sampled events as the event log stored on a snapshot.
///
/// One `- Category: outcome` line per category, baseline outcomes included.
pub fn format_event_log(results: &[EventSampleResult]) -> String {
    results
        .iter()
        .map(|r| format!("- {}: {}", r.category, r.chosen_text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render only the notable outcomes, for prompts. Empty when nothing happened.
pub fn format_notable_events(results: &[EventSampleResult]) -> String {
    results
        .iter()
        .filter(|r| r.is_notable())
        .map(|r| format!("- {}: {}", r.category, r.chosen_text))
        .collect::<Vec<_>>()
        .join("\n")
}
