//! Composition normalizer.
//!
//! Generated percentage breakdowns rarely add up. Every list directly under a
//! heading whose title contains `Composition` is rescaled so it sums to 100:
//!
//! ```text
//! ### Gender Composition        ### Gender Composition
//! - Male: 48%           ==>     - Male: 48%
//! - Female: 49%                 - Female: 49.5%
//! - Other: 1%                   - Other: 1%  (values scaled by 100/98)
//! ```
//!
//! Runs on raw text before parsing; every other line is passed through as is.

use regex::Regex;
use std::sync::LazyLock;

static HEADING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#+\s+(.*)$").unwrap());

static ITEM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*-\s*[^:]+:\s*)(\d+(?:\.\d+)?)\s*%(.*)$").unwrap()
});

const COMPOSITION_MARKER: &str = "Composition";

struct Item {
    line: usize,
    prefix: String,
    value: f64,
    suffix: String,
}

/// Rescale every Composition list in `text` to sum to 100%.
pub fn normalize_compositions(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut output: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

    let mut i = 0;
    while i < lines.len() {
        let is_composition = HEADING_REGEX
            .captures(lines[i])
            .is_some_and(|caps| caps[1].contains(COMPOSITION_MARKER));
        if !is_composition {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        // Tolerate blank lines between the heading and its first item
        while j < lines.len() && lines[j].trim().is_empty() {
            j += 1;
        }

        let mut items = Vec::new();
        while j < lines.len() && !lines[j].trim().is_empty() && !HEADING_REGEX.is_match(lines[j]) {
            if let Some(caps) = ITEM_REGEX.captures(lines[j])
                && let Ok(value) = caps[2].parse::<f64>()
            {
                items.push(Item {
                    line: j,
                    prefix: caps[1].to_string(),
                    value,
                    suffix: caps[3].to_string(),
                });
            }
            j += 1;
        }

        let total: f64 = items.iter().map(|item| item.value).sum();
        if total > 0.0 {
            for item in &items {
                let scaled = item.value * 100.0 / total;
                output[item.line] =
                    format!("{}{}{}", item.prefix, format_percentage(scaled), item.suffix);
            }
        }
        i = j;
    }

    let mut normalized = output.join("\n");
    if text.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Render a percentage as an integer when it is whole at one decimal, else with one decimal.
pub fn format_percentage(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}%", rounded as i64)
    } else {
        format!("{:.1}%", rounded)
    }
}
