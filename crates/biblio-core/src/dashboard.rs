//! Library-wide statistics

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LibraryResult;
use crate::lifecycle;
use crate::models::Loan;
use crate::storage::{books, catalog, loans, readers};
use crate::store::Store;

const RECENT_LOANS: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub titles: i64,
    /// Sum of every book's quantity
    pub total_copies: i64,
    pub available_copies: i64,
    pub authors: i64,
    pub active_readers: i64,
    /// Outstanding loans not yet past due
    pub active_loans: i64,
    pub overdue_loans: i64,
    pub recent_loans: Vec<Loan>,
}

impl Store {
    /// Snapshot of the catalog and loan counts, statuses derived at `as_of`
    pub fn dashboard(&self, as_of: DateTime<Utc>) -> LibraryResult<DashboardStats> {
        let conn = self.connection();
        let (titles, total_copies, available_copies) = books::totals(conn)?;
        let (active_loans, overdue_loans) = loans::outstanding_counts(conn, as_of)?;
        let recent_loans = loans::recent_loans(conn, RECENT_LOANS)?
            .into_iter()
            .map(|loan| lifecycle::project(loan, as_of))
            .collect();

        Ok(DashboardStats {
            titles,
            total_copies,
            available_copies,
            authors: catalog::author_count(conn)?,
            active_readers: readers::active_reader_count(conn)?,
            active_loans,
            overdue_loans,
            recent_loans,
        })
    }
}
