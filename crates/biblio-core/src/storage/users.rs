//! User and session queries

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::User;
use crate::storage::error::StorageResult;
use crate::storage::{millis, parsed_column, timestamp_column, uuid_column};

const USER_COLUMNS: &str = "id, name, email, role, password_hash, created_at";

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role: parsed_column(row, 3)?,
        password_hash: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO users (id, name, email, role, password_hash, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.role.as_str(),
            user.password_hash,
            millis(user.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: Uuid) -> StorageResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
    let user = conn
        .query_row(&sql, params![id.to_string()], user_from_row)
        .optional()?;
    Ok(user)
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> StorageResult<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
    let user = conn
        .query_row(&sql, params![email], user_from_row)
        .optional()?;
    Ok(user)
}

pub fn list_users(conn: &Connection) -> StorageResult<Vec<User>> {
    let sql = format!("SELECT {} FROM users ORDER BY name, id", USER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map([], user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

/// Update name and email; role and password are not editable here
pub fn update_user(conn: &Connection, user: &User) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE users SET name = ?, email = ? WHERE id = ?",
        params![user.name, user.email, user.id.to_string()],
    )?;
    Ok(changed == 1)
}

pub fn delete_user(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}

// ==================== Sessions ====================

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        params![token, user_id.to_string(), millis(created_at), millis(expires_at)],
    )?;
    Ok(())
}

/// Look up the owner of a token that has not expired at `now`
pub fn find_session_user(
    conn: &Connection,
    token: &str,
    now: DateTime<Utc>,
) -> StorageResult<Option<User>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM users
        WHERE id = (SELECT user_id FROM sessions WHERE token = ? AND expires_at > ?)
        "#,
        USER_COLUMNS
    );
    let user = conn
        .query_row(&sql, params![token, millis(now)], user_from_row)
        .optional()?;
    Ok(user)
}

pub fn delete_session(conn: &Connection, token: &str) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM sessions WHERE token = ?", params![token])?;
    Ok(changed == 1)
}

pub fn purge_expired_sessions(conn: &Connection, now: DateTime<Utc>) -> StorageResult<usize> {
    Ok(conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?",
        params![millis(now)],
    )?)
}
