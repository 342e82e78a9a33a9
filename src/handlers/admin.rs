//! Administrative key registry: issue, delete, list, reset.
//!
//! Every operation sweeps expired keys first, so the registry never acts on
//! or reports a key past its expiry.

use axum::{extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ExpiryPolicy;
use crate::db::{queries, AppState};
use crate::duration::{self, DurationSpec};
use crate::error::{AppError, Result};
use crate::extractors::Json;
use crate::models::{KeyStatus, LicenseKey};

fn default_name() -> String {
    "default".to_string()
}

fn default_duration() -> String {
    "1 month".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AddKeyRequest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_duration")]
    pub duration: String,
}

#[derive(Debug, Serialize)]
pub struct AddKeyResponse {
    pub ok: bool,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// POST /api/add_key
pub async fn add_key(
    State(state): State<AppState>,
    Json(req): Json<AddKeyRequest>,
) -> Result<(StatusCode, Json<AddKeyResponse>)> {
    let conn = state.db.get()?;
    let now = Utc::now();
    queries::sweep_expired(&conn, now)?;

    let duration = req.duration.trim();
    let spec = DurationSpec::parse(duration)
        .map_err(|_| AppError::BadRequest("Invalid duration format".into()))?;

    let expires_at = match state.expiry_policy {
        ExpiryPolicy::Issuance => Some(spec.expires_from(now)),
        ExpiryPolicy::FirstUse => None,
    };

    let record = queries::create_license_key(
        &conn,
        &state.key_prefix,
        req.name.trim(),
        duration,
        &spec,
        expires_at,
        now,
    )?;

    tracing::info!(key = %record.key, duration = %record.duration, "issued key");

    Ok((
        StatusCode::CREATED,
        Json(AddKeyResponse {
            ok: true,
            key: record.key,
            expires_at: record.expires_at,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub ok: bool,
    pub msg: String,
}

/// POST /api/delete_key
pub async fn delete_key(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<MsgResponse>> {
    let conn = state.db.get()?;
    queries::sweep_expired(&conn, Utc::now())?;

    let key = req.key.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("Missing key".into()));
    }

    if !queries::delete_license_key(&conn, key)? {
        return Err(AppError::NotFound);
    }

    tracing::info!(key = %key, "deleted key");

    Ok(Json(MsgResponse {
        ok: true,
        msg: "Deleted".into(),
    }))
}

/// POST /api/reset_key
pub async fn reset_key(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<MsgResponse>> {
    let conn = state.db.get()?;
    queries::sweep_expired(&conn, Utc::now())?;

    let key = req.key.trim();
    if key.is_empty() {
        return Err(AppError::BadRequest("Missing key".into()));
    }

    if !queries::reset_license_key(&conn, key)? {
        return Err(AppError::NotFound);
    }

    tracing::info!(key = %key, "reset key binding");

    Ok(Json(MsgResponse {
        ok: true,
        msg: "Reset successful".into(),
    }))
}

#[derive(Debug, Serialize)]
pub struct ListedKey {
    pub key: String,
    pub name: Option<String>,
    pub duration: String,
    pub expires_at: Option<String>,
    pub remaining: String,
    pub status: &'static str,
    pub used: bool,
    pub hwid: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ListKeysResponse {
    pub ok: bool,
    pub keys: Vec<ListedKey>,
}

fn render_key(record: LicenseKey, now: DateTime<Utc>) -> ListedKey {
    // A deferred key with no expiry yet (or an unreadable timestamp) has no
    // meaningful countdown; it lists as Unknown/Active.
    let (remaining, status) = match record.expires_at_utc() {
        Ok(Some(expires_at)) => {
            let rendered = duration::format_remaining(expires_at - now);
            let status = if rendered == "Expired" {
                KeyStatus::Expired
            } else {
                KeyStatus::Active
            };
            (rendered, status)
        }
        _ => ("Unknown".to_string(), KeyStatus::Active),
    };

    ListedKey {
        key: record.key,
        name: record.name,
        duration: record.duration,
        expires_at: record.expires_at,
        remaining,
        status: status.as_str(),
        used: record.used,
        hwid: record.hwid,
        created_at: record.created_at,
    }
}

/// GET /api/list_key
pub async fn list_key(State(state): State<AppState>) -> Result<Json<ListKeysResponse>> {
    let conn = state.db.get()?;
    let now = Utc::now();
    queries::sweep_expired(&conn, now)?;

    let keys = queries::list_license_keys(&conn)?
        .into_iter()
        .map(|record| render_key(record, now))
        .collect();

    Ok(Json(ListKeysResponse { ok: true, keys }))
}
