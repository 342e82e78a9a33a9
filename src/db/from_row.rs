//! Row mapping trait and helpers for reducing boilerplate in queries.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::LicenseKey;

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub const LICENSE_KEY_COLS: &str = "key, name, duration, expires_at, hwid, used, created_at";

impl FromRow for LicenseKey {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(LicenseKey {
            key: row.get(0)?,
            name: row.get(1)?,
            duration: row.get(2)?,
            expires_at: row.get(3)?,
            hwid: row.get(4)?,
            used: row.get::<_, i32>(5)? != 0,
            created_at: row.get(6)?,
        })
    }
}
