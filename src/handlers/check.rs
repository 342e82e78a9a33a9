//! End-user validation endpoint.

use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::binding;
use crate::db::{queries, AppState};
use crate::duration;
use crate::error::{AppError, Result};
use crate::extractors::Json;

#[derive(Debug, Deserialize)]
pub struct CheckKeyRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub hwid: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckKeyResponse {
    pub ok: bool,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub remaining: String,
}

/// POST /api/check_key
pub async fn check_key(
    State(state): State<AppState>,
    Json(req): Json<CheckKeyRequest>,
) -> Result<Json<CheckKeyResponse>> {
    let conn = state.db.get()?;
    let now = Utc::now();

    let swept = queries::sweep_expired(&conn, now)?;
    if swept > 0 {
        tracing::debug!(count = swept, "swept expired keys");
    }

    let key = req.key.trim();
    let hwid = req.hwid.trim();
    if key.is_empty() || hwid.is_empty() {
        return Err(AppError::BadRequest("Missing key or hwid".into()));
    }
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let validated = binding::validate(&conn, key, hwid, name, now)?;

    let display_name = validated.record.name.as_deref().unwrap_or("Guest");
    Ok(Json(CheckKeyResponse {
        ok: true,
        msg: format!("welcome {}", display_name),
        expires_at: validated.record.expires_at.clone(),
        remaining: duration::format_remaining(validated.remaining),
    }))
}
