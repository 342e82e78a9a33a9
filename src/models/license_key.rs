use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Timestamps are stored as RFC 3339 UTC strings with whole-second
/// precision, so lexicographic order equals chronological order and the
/// sweep can compare strings directly.
pub fn ts_to_string(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn ts_from_string(s: &str) -> chrono::format::ParseResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseKey {
    pub key: String,
    pub name: Option<String>,
    /// Original duration text as entered at issuance, e.g. "30 day".
    pub duration: String,
    /// RFC 3339 UTC; None until a deferred-expiry key is first validated.
    pub expires_at: Option<String>,
    pub hwid: Option<String>,
    pub used: bool,
    pub created_at: String,
}

impl LicenseKey {
    /// Parsed expiry. A stored timestamp that no longer parses surfaces as
    /// `CorruptedRecord` rather than being treated as absent.
    pub fn expires_at_utc(&self) -> Result<Option<DateTime<Utc>>> {
        match &self.expires_at {
            None => Ok(None),
            Some(raw) => ts_from_string(raw).map(Some).map_err(|_| {
                AppError::CorruptedRecord(format!(
                    "key {} has unparsable expires_at {:?}",
                    self.key, raw
                ))
            }),
        }
    }
}

/// Listing status, derived from the expiry at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyStatus {
    Active,
    Expired,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "Active",
            KeyStatus::Expired => "Expired",
        }
    }
}
