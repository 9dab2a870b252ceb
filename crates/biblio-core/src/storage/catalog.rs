//! Author and category queries

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{Author, Category};
use crate::storage::error::StorageResult;
use crate::storage::uuid_column;

// ==================== Authors ====================

fn author_from_row(row: &Row) -> rusqlite::Result<Author> {
    let birth_date: Option<String> = row.get(3)?;
    let birth_date = birth_date
        .map(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
        })
        .transpose()?;

    Ok(Author {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        nationality: row.get(2)?,
        birth_date,
        biography: row.get(4)?,
    })
}

fn birth_date_text(author: &Author) -> Option<String> {
    author.birth_date.map(|d| d.format("%Y-%m-%d").to_string())
}

pub fn insert_author(conn: &Connection, author: &Author) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO authors (id, name, nationality, birth_date, biography) VALUES (?, ?, ?, ?, ?)",
        params![
            author.id.to_string(),
            author.name,
            author.nationality,
            birth_date_text(author),
            author.biography,
        ],
    )?;
    Ok(())
}

pub fn get_author(conn: &Connection, id: Uuid) -> StorageResult<Option<Author>> {
    let author = conn
        .query_row(
            "SELECT id, name, nationality, birth_date, biography FROM authors WHERE id = ?",
            params![id.to_string()],
            author_from_row,
        )
        .optional()?;
    Ok(author)
}

pub fn list_authors(conn: &Connection) -> StorageResult<Vec<Author>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, nationality, birth_date, biography FROM authors ORDER BY name, id",
    )?;
    let authors = stmt
        .query_map([], author_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(authors)
}

pub fn update_author(conn: &Connection, author: &Author) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE authors SET name = ?, nationality = ?, birth_date = ?, biography = ? WHERE id = ?",
        params![
            author.name,
            author.nationality,
            birth_date_text(author),
            author.biography,
            author.id.to_string(),
        ],
    )?;
    Ok(changed == 1)
}

pub fn delete_author(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM authors WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}

pub fn author_count(conn: &Connection) -> StorageResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM authors", [], |row| row.get(0))?)
}

// ==================== Categories ====================

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
    })
}

pub fn insert_category(conn: &Connection, category: &Category) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO categories (id, name) VALUES (?, ?)",
        params![category.id.to_string(), category.name],
    )?;
    Ok(())
}

pub fn get_category(conn: &Connection, id: Uuid) -> StorageResult<Option<Category>> {
    let category = conn
        .query_row(
            "SELECT id, name FROM categories WHERE id = ?",
            params![id.to_string()],
            category_from_row,
        )
        .optional()?;
    Ok(category)
}

pub fn list_categories(conn: &Connection) -> StorageResult<Vec<Category>> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY name, id")?;
    let categories = stmt
        .query_map([], category_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(categories)
}

pub fn update_category(conn: &Connection, category: &Category) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE categories SET name = ? WHERE id = ?",
        params![category.name, category.id.to_string()],
    )?;
    Ok(changed == 1)
}

pub fn delete_category(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM categories WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}
