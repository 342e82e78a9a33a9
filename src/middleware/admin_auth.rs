use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::db::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct AdminTokenParams {
    admin_token: Option<String>,
}

/// Extract the admin token from the `X-Admin-Token` header, falling back to
/// the `admin_token` query parameter.
fn extract_admin_token(request: &Request) -> Option<String> {
    let header = request
        .headers()
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    header.or_else(|| {
        Query::<AdminTokenParams>::try_from_uri(request.uri())
            .ok()
            .and_then(|q| q.0.admin_token)
    })
}

/// Gate for the admin endpoints: the supplied token must equal the
/// configured shared secret. Comparison is constant-time.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_admin_token(&request).ok_or(AppError::Unauthorized)?;

    if !bool::from(token.as_bytes().ct_eq(state.admin_token.as_bytes())) {
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}
