//! Test utilities and fixtures for VureKeys integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;
use tower::ServiceExt;

// Re-export the main library crate
pub use vurekeys::binding;
pub use vurekeys::config::ExpiryPolicy;
pub use vurekeys::db::{init_db, queries, AppState, DbPool};
pub use vurekeys::duration::DurationSpec;
pub use vurekeys::error::AppError;
pub use vurekeys::models::{ts_to_string, LicenseKey};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an AppState over an in-memory database.
///
/// max_size(1) keeps every request on the same pooled connection, which is
/// what a `:memory:` database requires.
pub fn create_test_app_state(expiry_policy: ExpiryPolicy) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        admin_token: ADMIN_TOKEN.to_string(),
        key_prefix: "VURE".to_string(),
        expiry_policy,
    }
}

/// Create an AppState backed by a database file, for tests that need
/// several connections to one database (concurrency).
pub fn create_file_app_state(path: &str, expiry_policy: ExpiryPolicy) -> AppState {
    let pool = vurekeys::db::create_pool(path).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        admin_token: ADMIN_TOKEN.to_string(),
        key_prefix: "VURE".to_string(),
        expiry_policy,
    }
}

/// Build the full router (public + admin), as served in production.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(vurekeys::handlers::public_router())
        .merge(vurekeys::handlers::admin_router(state.clone()))
        .with_state(state)
}

/// Current time truncated to whole seconds, matching the precision of
/// stored timestamps so remaining-time arithmetic is exact.
pub fn now() -> DateTime<Utc> {
    use chrono::SubsecRound;
    Utc::now().trunc_subsecs(0)
}

pub fn days_from_now(days: i64) -> DateTime<Utc> {
    now() + Duration::days(days)
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

/// Issue a key directly through the store.
pub fn issue_key(
    conn: &Connection,
    name: &str,
    duration: &str,
    expires_at: Option<DateTime<Utc>>,
) -> LicenseKey {
    issue_key_at(conn, name, duration, expires_at, now())
}

/// Issue a key with an explicit creation time (for ordering tests).
pub fn issue_key_at(
    conn: &Connection,
    name: &str,
    duration: &str,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
) -> LicenseKey {
    let spec = DurationSpec::parse(duration).expect("valid duration spec");
    queries::create_license_key(conn, "VURE", name, duration, &spec, expires_at, created_at)
        .expect("Failed to create test key")
}

/// The binding invariant: hwid is non-null iff used is true.
pub fn assert_binding_invariant(record: &LicenseKey) {
    assert_eq!(
        record.hwid.is_some(),
        record.used,
        "hwid/used invariant violated for key {}",
        record.key
    );
}

/// Send a JSON POST and return (status, body).
pub async fn post_json(
    app: &Router,
    uri: &str,
    body: Value,
    admin_token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = admin_token {
        builder = builder.header("x-admin-token", token);
    }

    let response = app
        .clone()
        .oneshot(
            builder
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).expect("Response should be valid JSON");
    (status, json)
}

/// Send a GET and return (status, body).
pub async fn get_json(app: &Router, uri: &str, admin_token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = admin_token {
        builder = builder.header("x-admin-token", token);
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).expect("Response should be valid JSON");
    (status, json)
}
