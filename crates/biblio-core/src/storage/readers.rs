//! Reader queries

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::Reader;
use crate::storage::error::StorageResult;
use crate::storage::{millis, timestamp_column, uuid_column};

const READER_COLUMNS: &str = "id, name, email, phone, address, active, created_at";

fn reader_from_row(row: &Row) -> rusqlite::Result<Reader> {
    Ok(Reader {
        id: uuid_column(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
        active: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

pub fn insert_reader(conn: &Connection, reader: &Reader) -> StorageResult<()> {
    conn.execute(
        "INSERT INTO readers (id, name, email, phone, address, active, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            reader.id.to_string(),
            reader.name,
            reader.email,
            reader.phone,
            reader.address,
            reader.active,
            millis(reader.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_reader(conn: &Connection, id: Uuid) -> StorageResult<Option<Reader>> {
    let sql = format!("SELECT {} FROM readers WHERE id = ?", READER_COLUMNS);
    let reader = conn
        .query_row(&sql, params![id.to_string()], reader_from_row)
        .optional()?;
    Ok(reader)
}

pub fn list_readers(conn: &Connection) -> StorageResult<Vec<Reader>> {
    let sql = format!("SELECT {} FROM readers ORDER BY name, id", READER_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;
    let readers = stmt
        .query_map([], reader_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(readers)
}

pub fn update_reader(conn: &Connection, reader: &Reader) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE readers SET name = ?, email = ?, phone = ?, address = ?, active = ? WHERE id = ?",
        params![
            reader.name,
            reader.email,
            reader.phone,
            reader.address,
            reader.active,
            reader.id.to_string(),
        ],
    )?;
    Ok(changed == 1)
}

pub fn delete_reader(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM readers WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}

pub fn active_reader_count(conn: &Connection) -> StorageResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM readers WHERE active = 1",
        [],
        |row| row.get(0),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn test_reader_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let mut reader = Reader::new("João Silva", "joao@email.com");
        reader.phone = "(11) 98765-4321".to_string();
        insert_reader(db.connection(), &reader).unwrap();

        let loaded = get_reader(db.connection(), reader.id).unwrap().unwrap();
        assert_eq!(loaded.phone, reader.phone);
        assert!(loaded.active);
    }

    #[test]
    fn test_active_reader_count() {
        let db = Database::open_in_memory().unwrap();
        let mut inactive = Reader::new("Pedro Santos", "pedro@email.com");
        inactive.active = false;
        insert_reader(db.connection(), &inactive).unwrap();
        insert_reader(db.connection(), &Reader::new("Maria", "maria@email.com")).unwrap();

        assert_eq!(active_reader_count(db.connection()).unwrap(), 1);
        assert_eq!(list_readers(db.connection()).unwrap().len(), 2);
    }

    #[test]
    fn test_update_missing_reader() {
        let db = Database::open_in_memory().unwrap();
        let reader = Reader::new("Ghost", "ghost@email.com");
        assert!(!update_reader(db.connection(), &reader).unwrap());
        assert!(!delete_reader(db.connection(), reader.id).unwrap());
    }
}
