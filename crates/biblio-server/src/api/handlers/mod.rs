//! Route handlers, one module per resource

pub mod auth;
pub mod authors;
pub mod books;
pub mod categories;
pub mod dashboard;
pub mod loans;
pub mod readers;
pub mod status;
pub mod users;
