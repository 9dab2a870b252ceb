//! Storage layer
//!
//! SQLite is the only store. Each submodule holds the SQL for one group of
//! tables; functions take a `&Connection` so they run unchanged inside a
//! `Transaction` (which derefs to a connection).
//!
//! ## Layout
//!
//! - `database`: connection setup and write transactions
//! - `schema`: table definitions and versioning
//! - `books`, `catalog`, `readers`, `loans`, `users`: per-table queries

pub mod books;
pub mod catalog;
pub mod database;
pub mod error;
pub mod loans;
pub mod readers;
pub mod schema;
pub mod users;

pub use database::Database;
pub use error::{StorageError, StorageResult};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};

use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Read a TEXT column holding a UUID
pub(crate) fn uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, format!("invalid UUID {}: {}", raw, e)))
}

pub(crate) fn opt_uuid_column(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|s| {
        Uuid::parse_str(&s).map_err(|e| conversion_error(idx, format!("invalid UUID {}: {}", s, e)))
    })
    .transpose()
}

/// Read an INTEGER column holding epoch milliseconds
pub(crate) fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| conversion_error(idx, format!("timestamp out of range: {}", millis)))
}

pub(crate) fn opt_timestamp_column(
    row: &Row,
    idx: usize,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let millis: Option<i64> = row.get(idx)?;
    millis
        .map(|m| {
            DateTime::from_timestamp_millis(m)
                .ok_or_else(|| conversion_error(idx, format!("timestamp out of range: {}", m)))
        })
        .transpose()
}

/// Read a TEXT column into an enum such as `Role` or `LoanStatus`
pub(crate) fn parsed_column<T>(row: &Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| conversion_error(idx, e))
}

pub(crate) fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Drop the sub-millisecond part a stored timestamp loses
pub(crate) fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at.trunc_subsecs(3)
}

/// Current time at stored precision
pub(crate) fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_invalid_uuid_column_is_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.query_row("SELECT 'not-a-uuid'", [], |row| uuid_column(row, 0));

        assert!(matches!(
            result,
            Err(rusqlite::Error::FromSqlConversionFailure(0, _, _))
        ));
    }

    #[test]
    fn test_timestamp_column_reads_millis() {
        let conn = Connection::open_in_memory().unwrap();
        let at = conn
            .query_row("SELECT 1700000000123", [], |row| timestamp_column(row, 0))
            .unwrap();
        assert_eq!(at.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_null_columns_read_as_none() {
        let conn = Connection::open_in_memory().unwrap();
        let (id, at) = conn
            .query_row("SELECT NULL, NULL", [], |row| {
                Ok((opt_uuid_column(row, 0)?, opt_timestamp_column(row, 1)?))
            })
            .unwrap();
        assert!(id.is_none());
        assert!(at.is_none());
    }
}
