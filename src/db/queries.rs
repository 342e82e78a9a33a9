use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

use crate::duration::DurationSpec;
use crate::error::{AppError, Result};
use crate::keygen;
use crate::models::{ts_to_string, LicenseKey};

use super::from_row::{query_all, query_one, FromRow, LICENSE_KEY_COLS};

/// Bound on regeneration attempts when a generated key collides with an
/// existing row. The suffix space makes even one collision negligible.
const KEY_GENERATION_ATTEMPTS: u32 = 5;

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

/// Generate and insert a new license key.
///
/// `expires_at` is `Some` under the eager expiry policy and `None` when the
/// TTL is deferred to first validation. A duplicate generated key is
/// retryable, not fatal: the insert regenerates and tries again.
pub fn create_license_key(
    conn: &Connection,
    prefix: &str,
    name: &str,
    duration: &str,
    spec: &DurationSpec,
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<LicenseKey> {
    let expires_at = expires_at.map(ts_to_string);
    let created_at = ts_to_string(now);

    for _ in 0..KEY_GENERATION_ATTEMPTS {
        let key = keygen::generate_key(prefix, spec);
        let inserted = conn.execute(
            "INSERT INTO license_keys (key, name, duration, expires_at, hwid, used, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5)",
            params![&key, name, duration, &expires_at, &created_at],
        );
        match inserted {
            Ok(_) => {
                return Ok(LicenseKey {
                    key,
                    name: Some(name.to_string()),
                    duration: duration.to_string(),
                    expires_at,
                    hwid: None,
                    used: false,
                    created_at,
                });
            }
            Err(e) if is_unique_violation(&e) => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "could not generate a unique key after {} attempts",
        KEY_GENERATION_ATTEMPTS
    )))
}

pub fn get_license_key(conn: &Connection, key: &str) -> Result<Option<LicenseKey>> {
    query_one(
        conn,
        &format!("SELECT {} FROM license_keys WHERE key = ?1", LICENSE_KEY_COLS),
        &[&key],
    )
}

pub fn delete_license_key(conn: &Connection, key: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM license_keys WHERE key = ?1", params![key])?;
    Ok(deleted > 0)
}

/// All surviving keys, newest-created first.
pub fn list_license_keys(conn: &Connection) -> Result<Vec<LicenseKey>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM license_keys ORDER BY created_at DESC, key",
            LICENSE_KEY_COLS
        ),
        &[],
    )
}

/// Clear a key's binding so a new device can claim it. Leaves `expires_at`
/// untouched. Returns false if the key does not exist.
pub fn reset_license_key(conn: &Connection, key: &str) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE license_keys SET hwid = NULL, used = 0 WHERE key = ?1",
        params![key],
    )?;
    Ok(affected > 0)
}

/// Delete every key whose expiry is at or before `now`. Returns the count.
pub fn sweep_expired(conn: &Connection, now: DateTime<Utc>) -> Result<usize> {
    let deleted = conn.execute(
        "DELETE FROM license_keys WHERE expires_at IS NOT NULL AND expires_at <= ?1",
        params![ts_to_string(now)],
    )?;
    Ok(deleted)
}

/// Atomically bind `hwid` to an unbound key.
///
/// The precondition (`hwid IS NULL AND used = 0`) is checked by the store in
/// the same statement that writes, so two concurrent requests cannot both
/// bind: the loser matches no row and gets `None`. The caller re-reads and
/// compares against the winner's hwid. `name` is only written when supplied.
pub fn try_bind_hwid(
    conn: &Connection,
    key: &str,
    hwid: &str,
    name: Option<&str>,
) -> Result<Option<LicenseKey>> {
    conn.query_row(
        &format!(
            "UPDATE license_keys
             SET hwid = ?2, used = 1, name = COALESCE(?3, name)
             WHERE key = ?1 AND hwid IS NULL AND used = 0
             RETURNING {}",
            LICENSE_KEY_COLS
        ),
        params![key, hwid, name],
        LicenseKey::from_row,
    )
    .optional()
    .map_err(Into::into)
}

/// Set a deferred key's expiry, but only if it is still unset, so concurrent
/// first validations settle on a single stored value. Returns whether this
/// call was the one that wrote it.
pub fn set_expires_if_unset(
    conn: &Connection,
    key: &str,
    expires_at: DateTime<Utc>,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE license_keys SET expires_at = ?2 WHERE key = ?1 AND expires_at IS NULL",
        params![key, ts_to_string(expires_at)],
    )?;
    Ok(affected > 0)
}
