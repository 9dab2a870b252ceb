//! Book queries, including the conditional availability updates used by
//! the loan lifecycle.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::Book;
use crate::storage::error::StorageResult;
use crate::storage::{millis, opt_uuid_column, timestamp_column, uuid_column};

const BOOK_COLUMNS: &str = "id, title, author_id, published_year, category_id, quantity, available, created_at, updated_at";

fn book_from_row(row: &Row) -> rusqlite::Result<Book> {
    Ok(Book {
        id: uuid_column(row, 0)?,
        title: row.get(1)?,
        author_id: opt_uuid_column(row, 2)?,
        published_year: row.get(3)?,
        category_id: opt_uuid_column(row, 4)?,
        quantity: row.get(5)?,
        available: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

pub fn insert_book(conn: &Connection, book: &Book) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO books (id, title, author_id, published_year, category_id, quantity, available, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            book.id.to_string(),
            book.title,
            book.author_id.map(|id| id.to_string()),
            book.published_year,
            book.category_id.map(|id| id.to_string()),
            book.quantity,
            book.available,
            millis(book.created_at),
            millis(book.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_book(conn: &Connection, id: Uuid) -> StorageResult<Option<Book>> {
    let sql = format!("SELECT {} FROM books WHERE id = ?", BOOK_COLUMNS);
    let book = conn
        .query_row(&sql, params![id.to_string()], book_from_row)
        .optional()?;
    Ok(book)
}

pub fn list_books(conn: &Connection) -> StorageResult<Vec<Book>> {
    let sql = format!("SELECT {} FROM books ORDER BY title, id", BOOK_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Overwrite every column of an existing book; returns false if absent
pub fn update_book(conn: &Connection, book: &Book) -> StorageResult<bool> {
    let changed = conn.execute(
        r#"
        UPDATE books
        SET title = ?, author_id = ?, published_year = ?, category_id = ?,
            quantity = ?, available = ?, updated_at = ?
        WHERE id = ?
        "#,
        params![
            book.title,
            book.author_id.map(|id| id.to_string()),
            book.published_year,
            book.category_id.map(|id| id.to_string()),
            book.quantity,
            book.available,
            millis(book.updated_at),
            book.id.to_string(),
        ],
    )?;
    Ok(changed == 1)
}

pub fn delete_book(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM books WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}

/// Take one copy off the shelf if any is left
///
/// The check and the decrement are a single statement, so it cannot
/// observe a stale count. Returns false when the book is missing or has no
/// available copies.
pub fn take_copy(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE books SET available = available - 1, updated_at = ? WHERE id = ? AND available > 0",
        params![millis(at), id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Put one copy back; never raises `available` above `quantity`
pub fn restore_copy(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE books SET available = available + 1, updated_at = ? WHERE id = ? AND available < quantity",
        params![millis(at), id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Catalog totals: (titles, copies, available copies)
pub fn totals(conn: &Connection) -> StorageResult<(i64, i64, i64)> {
    let totals = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(quantity), 0), COALESCE(SUM(available), 0) FROM books",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(totals)
}
