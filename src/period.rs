//! Period keys (`YYYY-MM`).

use chrono::{Months, NaiveDate};

use crate::errors::TurnError;

fn parse(period: &str) -> Result<NaiveDate, TurnError> {
    NaiveDate::parse_from_str(&format!("{}-01", period.trim()), "%Y-%m-%d").map_err(|_| {
        TurnError::InvalidPeriod {
            period: period.to_string(),
        }
    })
}

/// Validate a period key and return it in canonical form.
pub fn validate_period(period: &str) -> Result<String, TurnError> {
    Ok(parse(period)?.format("%Y-%m").to_string())
}

/// The period `months` after `period`.
pub fn next_period(period: &str, months: u32) -> Result<String, TurnError> {
    let date = parse(period)?;
    let next = date
        .checked_add_months(Months::new(months))
        .ok_or_else(|| TurnError::InvalidPeriod {
            period: period.to_string(),
        })?;
    Ok(next.format("%Y-%m").to_string())
}

/// Human form used in prompts, e.g. `January 2026`.
pub fn period_label(period: &str) -> Result<String, TurnError> {
    Ok(parse(period)?.format("%B %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_period() {
        assert_eq!(next_period("2025-01", 12).unwrap(), "2026-01");
        assert_eq!(next_period("2025-11", 3).unwrap(), "2026-02");
        assert_eq!(next_period("2025-06", 0).unwrap(), "2025-06");
    }

    #[test]
    fn test_period_label() {
        assert_eq!(period_label("2026-01").unwrap(), "January 2026");
        assert_eq!(period_label("1999-12").unwrap(), "December 1999");
    }

    #[test]
    fn test_invalid_periods() {
        for bad in ["2025", "2025-13", "Jan 2025", ""] {
            assert!(
                matches!(validate_period(bad), Err(TurnError::InvalidPeriod { .. })),
                "{bad} should be rejected"
            );
        }
        assert_eq!(validate_period(" 2025-03 ").unwrap(), "2025-03");
    }
}
