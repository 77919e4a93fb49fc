//! Leaf value normalization.
//!
//! Turns the right-hand side of a `Label: Value` line into a [`ParsedValue`]:
//!
//! | Raw text            | value           | unit        |
//! |---------------------|-----------------|-------------|
//! | `$2,700,000,000`    | 2.7e9           | `units`     |
//! | `2.7 billion`       | 2.7e9           | `units`     |
//! | `12%`               | 0.12            | `%`         |
//! | `-0.4% per year`    | -0.004          | `%`         |
//! | `6.1 out of 10`     | 6.1             | `out of 10` |
//! | `Dollar (USD)`      | none            | none        |

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Optional approximation marker, sign, currency sign, then a comma-grouped or plain number.
static NUMBER_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[~<>]\s*)?([+-]?)\s*\$?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)(.*)$")
        .unwrap()
});

/// Unit recorded for a bare number with nothing after it.
pub const DEFAULT_UNIT: &str = "units";

/// Unit recorded for percentages; the numeric value is then a fraction.
pub const PERCENT_UNIT: &str = "%";

const SCALE_WORDS: &[(&str, f64)] = &[
    ("thousand", 1e3),
    ("k", 1e3),
    ("million", 1e6),
    ("billion", 1e9),
    ("trillion", 1e12),
];

/// A typed leaf of the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedValue {
    /// The value text exactly as written.
    #[serde(rename = "raw")]
    pub raw_text: String,
    /// Numeric reading of the leading number token, scaled; a fraction when `unit == "%"`.
    #[serde(rename = "value")]
    pub numeric_value: Option<f64>,
    pub unit: Option<String>,
    /// The label as written before key normalization.
    #[serde(rename = "label")]
    pub original_label: String,
}

impl ParsedValue {
    /// An unparsed string leaf.
    pub fn text(label: &str, raw: &str) -> Self {
        Self {
            raw_text: raw.to_string(),
            numeric_value: None,
            unit: None,
            original_label: label.to_string(),
        }
    }

    pub fn is_percentage(&self) -> bool {
        self.unit.as_deref() == Some(PERCENT_UNIT)
    }
}

/// Parse a value's raw text. Never fails: anything without a clean leading
/// number becomes a plain text leaf.
pub fn parse_value(label: &str, raw: &str) -> ParsedValue {
    let raw = raw.trim();
    let Some(caps) = NUMBER_PREFIX.captures(raw) else {
        return ParsedValue::text(label, raw);
    };

    let sign = if &caps[1] == "-" { -1.0 } else { 1.0 };
    let rest = caps.get(3).map_or("", |m| m.as_str());

    // "1,23,4" or "1.2.3" leave digits glued to the match; not a number we trust
    let mut rest_chars = rest.chars();
    if matches!(rest_chars.next(), Some(',' | '.'))
        && rest_chars.next().is_some_and(|c| c.is_ascii_digit())
    {
        return ParsedValue::text(label, raw);
    }

    let Ok(number) = caps[2].replace(',', "").parse::<f64>() else {
        return ParsedValue::text(label, raw);
    };
    let mut number = sign * number;
    let rest = rest.trim();

    let unit = if rest.starts_with('%') {
        number /= 100.0;
        PERCENT_UNIT.to_string()
    } else {
        let (first_word, remainder) = match rest.split_once(char::is_whitespace) {
            Some((first, remainder)) => (first, remainder.trim()),
            None => (rest, ""),
        };
        let unit_text = match scale_factor(first_word) {
            Some(factor) => {
                number *= factor;
                remainder
            }
            None => rest,
        };
        if unit_text.is_empty() {
            DEFAULT_UNIT.to_string()
        } else {
            unit_text.to_string()
        }
    };

    ParsedValue {
        raw_text: raw.to_string(),
        numeric_value: Some(number),
        unit: Some(unit),
        original_label: label.to_string(),
    }
}

fn scale_factor(word: &str) -> Option<f64> {
    let word = word.to_ascii_lowercase();
    SCALE_WORDS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, factor)| *factor)
}

/// Normalize a label or heading into a tree key: lowercase, drop everything
/// outside `[a-z ]`, join the remaining words with `_`.
pub fn normalize_key(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .collect::<String>()
        .to_ascii_lowercase();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Split a `Label: Value` line (optionally bulleted) into its trimmed parts.
///
/// Returns `None` when there is no colon, either side is empty, or the label
/// normalizes to an empty key.
pub fn split_label_value(line: &str) -> Option<(&str, &str)> {
    let line = strip_bullet(line);
    let (label, value) = line.split_once(':')?;
    let (label, value) = (label.trim(), value.trim());
    if label.is_empty() || value.is_empty() || normalize_key(label).is_empty() {
        return None;
    }
    Some((label, value))
}

/// Remove a leading `- ` or `* ` list marker.
pub fn strip_bullet(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
        .map(str::trim_start)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    // =========================================
    // parse_value tests
    // =========================================

    #[test]
    fn test_currency_with_grouping_defaults_to_units() {
        let v = parse_value("GDP", "$2,700,000,000");
        assert!(approx(v.numeric_value.unwrap(), 2_700_000_000.0));
        assert_eq!(v.unit.as_deref(), Some("units"));
        assert_eq!(v.raw_text, "$2,700,000,000");
        assert_eq!(v.original_label, "GDP");
    }

    #[test]
    fn test_scale_word_is_applied_and_dropped() {
        let v = parse_value("GDP", "2.7 billion");
        assert!(approx(v.numeric_value.unwrap(), 2_700_000_000.0));
        assert_eq!(v.unit.as_deref(), Some("units"));

        let v = parse_value("Population", "25.68 million people");
        assert!(approx(v.numeric_value.unwrap(), 25_680_000.0));
        assert_eq!(v.unit.as_deref(), Some("people"));

        let v = parse_value("Revenue", "$450 Million");
        assert!(approx(v.numeric_value.unwrap(), 450_000_000.0));
        assert_eq!(v.unit.as_deref(), Some("units"));

        let v = parse_value("Area", "520 k sq km");
        assert!(approx(v.numeric_value.unwrap(), 520_000.0));
        assert_eq!(v.unit.as_deref(), Some("sq km"));

        let v = parse_value("Debt", "1.2 trillion USD");
        assert!(approx(v.numeric_value.unwrap(), 1.2e12));
        assert_eq!(v.unit.as_deref(), Some("USD"));
    }

    #[test]
    fn test_scale_word_must_be_the_whole_first_word() {
        let v = parse_value("Roads", "5 km");
        assert!(approx(v.numeric_value.unwrap(), 5.0));
        assert_eq!(v.unit.as_deref(), Some("km"));
    }

    #[test]
    fn test_percentages_store_fractions() {
        let v = parse_value("Urban Population", "62%");
        assert!(approx(v.numeric_value.unwrap(), 0.62));
        assert_eq!(v.unit.as_deref(), Some("%"));
        assert!(v.is_percentage());

        let v = parse_value("Growth", "-0.4% per year");
        assert!(approx(v.numeric_value.unwrap(), -0.004));
        assert_eq!(v.unit.as_deref(), Some("%"));

        let v = parse_value("Rare", "0.01%");
        assert!(approx(v.numeric_value.unwrap(), 0.0001));
    }

    #[test]
    fn test_plain_units_are_kept() {
        let v = parse_value("Happiness", "6.1 out of 10");
        assert!(approx(v.numeric_value.unwrap(), 6.1));
        assert_eq!(v.unit.as_deref(), Some("out of 10"));

        let v = parse_value("Universities", "42");
        assert_eq!(v.numeric_value, Some(42.0));
        assert_eq!(v.unit.as_deref(), Some("units"));
    }

    #[test]
    fn test_approximation_marker() {
        let v = parse_value("Personnel", "~120 thousand");
        assert!(approx(v.numeric_value.unwrap(), 120_000.0));
    }

    #[test]
    fn test_text_values_have_no_number() {
        let v = parse_value("Currency", "Dollar (USD)");
        assert_eq!(v.numeric_value, None);
        assert_eq!(v.unit, None);
        assert_eq!(v.raw_text, "Dollar (USD)");
    }

    #[test]
    fn test_malformed_numbers_degrade_to_text() {
        let v = parse_value("Broken", "1,23,4 people");
        assert_eq!(v.numeric_value, None);
        assert_eq!(v.unit, None);
        assert_eq!(v.raw_text, "1,23,4 people");

        let v = parse_value("Version", "1.2.3");
        assert_eq!(v.numeric_value, None);
    }

    // =========================================
    // key normalization tests
    // =========================================

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Gross Domestic Product (GDP)"), "gross_domestic_product_gdp");
        assert_eq!(normalize_key("  Urban   Population "), "urban_population");
        assert_eq!(normalize_key("Urban-Rural Composition"), "urbanrural_composition");
        assert_eq!(normalize_key("75+ years"), "years");
        assert_eq!(normalize_key("2024"), "");
    }

    #[test]
    fn test_split_label_value() {
        assert_eq!(
            split_label_value("- Total Population: 25 million people"),
            Some(("Total Population", "25 million people"))
        );
        assert_eq!(
            split_label_value("Ratio: 3:1"),
            Some(("Ratio", "3:1"))
        );
        assert_eq!(split_label_value("- No colon here"), None);
        assert_eq!(split_label_value("- Empty:"), None);
        assert_eq!(split_label_value("- 2024: record year"), None);
    }

    #[test]
    fn test_strip_bullet() {
        assert_eq!(strip_bullet("- item"), "item");
        assert_eq!(strip_bullet("  * item"), "item");
        assert_eq!(strip_bullet("plain"), "plain");
        assert_eq!(strip_bullet("-5 degrees"), "-5 degrees");
    }
}
