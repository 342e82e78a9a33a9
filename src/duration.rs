//! Duration-spec parsing and remaining-time rendering.
//!
//! A duration spec is the human-entered text stored with every key, e.g.
//! `"30 day"` or `"1 month"`. Months add calendar months (clamping to the
//! last valid day), everything else is a fixed offset.

use chrono::{DateTime, Duration, Months, Utc};
use thiserror::Error;

/// The spec text does not parse: wrong token count, non-positive amount,
/// or an unrecognized unit.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid duration format")]
pub struct InvalidDurationFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Day,
    Hour,
    Minute,
    Week,
    Month,
}

impl DurationUnit {
    /// Uppercase initial used in generated key strings ("1D", "2W", ...).
    /// Minute and Month both map to 'M'; the stored duration text stays
    /// authoritative for expiry math.
    pub fn initial(self) -> char {
        match self {
            DurationUnit::Day => 'D',
            DurationUnit::Hour => 'H',
            DurationUnit::Minute => 'M',
            DurationUnit::Week => 'W',
            DurationUnit::Month => 'M',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationSpec {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl DurationSpec {
    /// Parse `"<positive integer> <unit>"`. The unit token matches
    /// case-insensitively when it starts with one of day/hour/minute/week/
    /// month, so "days" and "Weeks" are accepted.
    pub fn parse(spec: &str) -> Result<Self, InvalidDurationFormat> {
        let mut tokens = spec.split_whitespace();
        let amount_str = tokens.next().ok_or(InvalidDurationFormat)?;
        let unit_str = tokens.next().ok_or(InvalidDurationFormat)?;
        if tokens.next().is_some() {
            return Err(InvalidDurationFormat);
        }

        let amount: u32 = amount_str.parse().map_err(|_| InvalidDurationFormat)?;
        if amount == 0 {
            return Err(InvalidDurationFormat);
        }

        let unit_str = unit_str.to_ascii_lowercase();
        let unit = if unit_str.starts_with("day") {
            DurationUnit::Day
        } else if unit_str.starts_with("hour") {
            DurationUnit::Hour
        } else if unit_str.starts_with("minute") {
            DurationUnit::Minute
        } else if unit_str.starts_with("week") {
            DurationUnit::Week
        } else if unit_str.starts_with("month") {
            DurationUnit::Month
        } else {
            return Err(InvalidDurationFormat);
        };

        Ok(Self { amount, unit })
    }

    /// Absolute expiry for a clock starting at `now`.
    pub fn expires_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let amount = i64::from(self.amount);
        match self.unit {
            DurationUnit::Day => now + Duration::days(amount),
            DurationUnit::Hour => now + Duration::hours(amount),
            DurationUnit::Minute => now + Duration::minutes(amount),
            DurationUnit::Week => now + Duration::weeks(amount),
            DurationUnit::Month => now + Months::new(self.amount),
        }
    }
}

/// Render a remaining time-to-live as a coarse human string: the coarsest
/// nonzero unit of days, hours, minutes. Pure function, no clock access.
pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.num_seconds();
    if secs <= 0 {
        return "Expired".to_string();
    }

    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    if days > 0 {
        format!("{} days", days)
    } else if hours > 0 {
        format!("{} hours", hours)
    } else if minutes > 0 {
        format!("{} minutes", minutes)
    } else {
        "less than 1 minute".to_string()
    }
}
