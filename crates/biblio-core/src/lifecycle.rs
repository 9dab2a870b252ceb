//! Loan status rules
//!
//! A loan's status is a projection of its dates: `returned` once a return
//! date is recorded, otherwise `overdue` after the due date, otherwise
//! `active`. The stored `status` column is only a cache of that projection,
//! refreshed by [`refresh_overdue_statuses`] or `Store::refresh_overdue`.

use chrono::{DateTime, Duration, Utc};

use crate::models::{Loan, LoanStatus};

/// Due date for a loan issued at `loan_date`, or `None` past the calendar's range
pub fn due_date(loan_date: DateTime<Utc>, period: Duration) -> Option<DateTime<Utc>> {
    loan_date.checked_add_signed(period)
}

/// Status of a loan with the given dates, as seen at `as_of`
pub fn display_status(
    due_date: DateTime<Utc>,
    return_date: Option<DateTime<Utc>>,
    as_of: DateTime<Utc>,
) -> LoanStatus {
    if return_date.is_some() {
        LoanStatus::Returned
    } else if as_of > due_date {
        LoanStatus::Overdue
    } else {
        LoanStatus::Active
    }
}

pub fn compute_display_status(loan: &Loan, as_of: DateTime<Utc>) -> LoanStatus {
    display_status(loan.due_date, loan.return_date, as_of)
}

/// Replace the stored status with the one derived at `as_of`
pub fn project(mut loan: Loan, as_of: DateTime<Utc>) -> Loan {
    loan.status = compute_display_status(&loan, as_of);
    loan
}

/// Mark stored-`active` loans past their due date as `overdue`
///
/// Returns how many loans changed. Running it again with the same `as_of`
/// changes nothing.
pub fn refresh_overdue_statuses(loans: &mut [Loan], as_of: DateTime<Utc>) -> usize {
    let mut changed = 0;
    for loan in loans.iter_mut() {
        if loan.status == LoanStatus::Active && loan.due_date < as_of {
            loan.status = LoanStatus::Overdue;
            changed += 1;
        }
    }
    changed
}
