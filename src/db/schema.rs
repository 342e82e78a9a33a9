use rusqlite::Connection;

/// Initialize the license key schema.
///
/// WAL mode so several server processes can share one database file;
/// synchronous=NORMAL is safe with WAL.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;

        -- License keys. The key string itself is the primary key.
        -- Timestamps are RFC 3339 UTC text; expires_at is NULL until a
        -- deferred-expiry key is first validated. hwid is NULL iff the key
        -- is unbound (used = 0); both columns always change together.
        CREATE TABLE IF NOT EXISTS license_keys (
            key TEXT PRIMARY KEY,
            name TEXT,
            duration TEXT NOT NULL,
            expires_at TEXT,
            hwid TEXT,
            used INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_license_keys_expires
            ON license_keys(expires_at) WHERE expires_at IS NOT NULL;
        CREATE INDEX IF NOT EXISTS idx_license_keys_created
            ON license_keys(created_at DESC);
        "#,
    )?;
    Ok(())
}
