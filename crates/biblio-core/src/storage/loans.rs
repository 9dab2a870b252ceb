//! Loan queries
//!
//! These functions only touch the `loans` table. Keeping a book's
//! availability in step with its loans is the caller's job, inside one
//! write transaction (see `Store::issue_loan`).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::models::{Loan, LoanStatus};
use crate::storage::error::StorageResult;
use crate::storage::{millis, opt_timestamp_column, parsed_column, timestamp_column, uuid_column};

const LOAN_COLUMNS: &str = "id, book_id, reader_id, loan_date, due_date, return_date, status";

fn loan_from_row(row: &Row) -> rusqlite::Result<Loan> {
    Ok(Loan {
        id: uuid_column(row, 0)?,
        book_id: uuid_column(row, 1)?,
        reader_id: uuid_column(row, 2)?,
        loan_date: timestamp_column(row, 3)?,
        due_date: timestamp_column(row, 4)?,
        return_date: opt_timestamp_column(row, 5)?,
        status: parsed_column(row, 6)?,
    })
}

pub fn insert_loan(conn: &Connection, loan: &Loan) -> StorageResult<()> {
    conn.execute(
        r#"
        INSERT INTO loans (id, book_id, reader_id, loan_date, due_date, return_date, status)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            loan.id.to_string(),
            loan.book_id.to_string(),
            loan.reader_id.to_string(),
            millis(loan.loan_date),
            millis(loan.due_date),
            loan.return_date.map(millis),
            loan.status.as_str(),
        ],
    )?;
    Ok(())
}

pub fn get_loan(conn: &Connection, id: Uuid) -> StorageResult<Option<Loan>> {
    let sql = format!("SELECT {} FROM loans WHERE id = ?", LOAN_COLUMNS);
    let loan = conn
        .query_row(&sql, params![id.to_string()], loan_from_row)
        .optional()?;
    Ok(loan)
}

/// All loans, most recent first
pub fn list_loans(conn: &Connection) -> StorageResult<Vec<Loan>> {
    let sql = format!(
        "SELECT {} FROM loans ORDER BY loan_date DESC, id",
        LOAN_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let loans = stmt
        .query_map([], loan_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(loans)
}

pub fn recent_loans(conn: &Connection, limit: usize) -> StorageResult<Vec<Loan>> {
    let sql = format!(
        "SELECT {} FROM loans ORDER BY loan_date DESC, id LIMIT ?",
        LOAN_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let loans = stmt
        .query_map(params![limit as i64], loan_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(loans)
}

/// Close an outstanding loan; returns false if it was already returned or
/// does not exist
pub fn mark_returned(conn: &Connection, id: Uuid, at: DateTime<Utc>) -> StorageResult<bool> {
    let changed = conn.execute(
        "UPDATE loans SET return_date = ?, status = ? WHERE id = ? AND return_date IS NULL",
        params![millis(at), LoanStatus::Returned.as_str(), id.to_string()],
    )?;
    Ok(changed == 1)
}

/// Flip stored `active` loans whose due date is before `as_of` to `overdue`
pub fn mark_overdue(conn: &Connection, as_of: DateTime<Utc>) -> StorageResult<usize> {
    let changed = conn.execute(
        "UPDATE loans SET status = ? WHERE status = ? AND due_date < ?",
        params![
            LoanStatus::Overdue.as_str(),
            LoanStatus::Active.as_str(),
            millis(as_of)
        ],
    )?;
    Ok(changed)
}

pub fn delete_loan(conn: &Connection, id: Uuid) -> StorageResult<bool> {
    let changed = conn.execute("DELETE FROM loans WHERE id = ?", params![id.to_string()])?;
    Ok(changed == 1)
}

pub fn outstanding_for_book(conn: &Connection, book_id: Uuid) -> StorageResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE book_id = ? AND return_date IS NULL",
        params![book_id.to_string()],
        |row| row.get(0),
    )?)
}

pub fn outstanding_for_reader(conn: &Connection, reader_id: Uuid) -> StorageResult<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM loans WHERE reader_id = ? AND return_date IS NULL",
        params![reader_id.to_string()],
        |row| row.get(0),
    )?)
}

/// Outstanding loans as (not yet due, past due) at `as_of`
pub fn outstanding_counts(conn: &Connection, as_of: DateTime<Utc>) -> StorageResult<(i64, i64)> {
    let counts = conn.query_row(
        r#"
        SELECT
            COALESCE(SUM(CASE WHEN due_date >= ? THEN 1 ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN due_date < ? THEN 1 ELSE 0 END), 0)
        FROM loans
        WHERE return_date IS NULL
        "#,
        params![millis(as_of), millis(as_of)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(counts)
}
