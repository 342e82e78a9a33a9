//! The key lifecycle state machine: Unbound -> Bound -> Expired.
//!
//! All binding decisions go through the store's conditional updates; this
//! module never does a read-then-write on the binding columns, so the
//! invariants hold across any number of server processes.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::duration::DurationSpec;
use crate::error::{AppError, Result};
use crate::models::LicenseKey;

/// Outcome of a successful validation.
#[derive(Debug)]
pub struct Validated {
    pub record: LicenseKey,
    /// Time left until expiry, measured from the validation instant.
    pub remaining: Duration,
}

/// Validate `key` for the device `hwid`, binding on first use.
///
/// `now` is passed in rather than read from the clock so expiry behavior is
/// deterministic under test. `name` is an optional display label applied
/// only if this call performs the bind.
pub fn validate(
    conn: &Connection,
    key: &str,
    hwid: &str,
    name: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Validated> {
    let mut record = queries::get_license_key(conn, key)?.ok_or(AppError::InvalidKey)?;

    // Expiry is terminal: delete so the key cannot resurrect.
    if let Some(expires_at) = record.expires_at_utc()? {
        if now >= expires_at {
            queries::delete_license_key(conn, key)?;
            return Err(AppError::KeyExpired);
        }
    } else {
        // Deferred-expiry key on its first validation: the TTL starts
        // counting now. The conditional write means concurrent first
        // validations agree on whichever value landed, so re-read.
        let spec = DurationSpec::parse(&record.duration).map_err(|_| {
            AppError::CorruptedRecord(format!(
                "key {} has unparsable duration {:?}",
                record.key, record.duration
            ))
        })?;
        queries::set_expires_if_unset(conn, key, spec.expires_from(now))?;
        record = queries::get_license_key(conn, key)?.ok_or(AppError::InvalidKey)?;
    }

    let record = if record.hwid.is_none() {
        match queries::try_bind_hwid(conn, key, hwid, name)? {
            Some(bound) => bound,
            // Lost the bind race: a concurrent request claimed the key
            // between our read and our conditional update. Single re-read,
            // then fall through to the comparison below.
            None => queries::get_license_key(conn, key)?.ok_or(AppError::InvalidKey)?,
        }
    } else {
        record
    };

    match record.hwid.as_deref() {
        Some(bound) if bound == hwid => {}
        _ => return Err(AppError::HwidMismatch),
    }

    let expires_at = record
        .expires_at_utc()?
        .ok_or_else(|| AppError::Internal(format!("key {} bound without expiry", record.key)))?;

    Ok(Validated {
        record,
        remaining: expires_at - now,
    })
}
