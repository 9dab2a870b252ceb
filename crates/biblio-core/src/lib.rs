//! Biblio Core Library
//!
//! This crate provides the core functionality for Biblio, a small library
//! management backend: a catalog of books, authors and categories, the
//! readers who borrow from it, and the loans that move copies between the
//! two.
//!
//! # Architecture
//!
//! - **SQLite**: Source of truth for all data, accessed through `rusqlite`
//! - **Store**: The single entry point; validates input and keeps each
//!   book's available copies in step with its outstanding loans
//!
//! Loan statuses shown to callers are derived from dates at read time; the
//! stored status is only refreshed by the overdue sweep.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open_with_config(Config::load()?)?;
//!
//! let book = store.create_book(NewBook { title: "Iracema".into(), published_year: Some(1865), ..Default::default() })?;
//! let reader = store.create_reader(NewReader { name: "Ana".into(), email: "ana@email.com".into(), ..Default::default() })?;
//!
//! let loan = store.issue_loan(book.id, reader.id, Utc::now())?;
//! store.return_loan(loan.id, Utc::now())?;
//! ```
//!
//! # Modules
//!
//! - `store`: Unified storage interface (main entry point)
//! - `models`: Data structures for books, authors, readers, loans and users
//! - `lifecycle`: Loan due dates and derived statuses
//! - `auth`: Registration, password hashing and bearer tokens
//! - `capability`: Role-based permissions
//! - `dashboard`: Library-wide statistics
//! - `storage`: SQLite schema and queries
//! - `config`: Application configuration

pub mod auth;
pub mod capability;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod storage;
pub mod store;

pub use auth::{Credentials, Registration, Session};
pub use capability::{authorize, Capability};
pub use config::Config;
pub use dashboard::DashboardStats;
pub use error::{LibraryError, LibraryResult};
pub use models::{
    Author, AuthorChanges, Book, BookChanges, Category, CategoryInput, Loan, LoanStatus, NewAuthor,
    NewBook, NewLoan, NewReader, Reader, ReaderChanges, Role, User, UserChanges,
};
pub use storage::StorageError;
pub use store::Store;
