//! Data models for Biblio
//!
//! Defines the catalog entities (books, authors, categories), the people
//! who use the library (users, readers) and the loans that connect them.
//! JSON field names are camelCase to match the web client.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::storage::now_millis;

/// Role of an authenticated account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// An account that can log in to the API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Salted password hash, never serialized
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            role,
            password_hash: password_hash.into(),
            created_at: now_millis(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A book author
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub name: String,
    pub nationality: String,
    pub birth_date: Option<NaiveDate>,
    pub biography: Option<String>,
}

/// A book category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// A catalog title with a number of physical copies
///
/// `available` counts the copies not currently on loan and always stays
/// within `0..=quantity`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author_id: Option<Uuid>,
    pub published_year: i32,
    pub category_id: Option<Uuid>,
    pub quantity: i64,
    pub available: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a book with every copy available
    pub fn new(title: impl Into<String>, published_year: i32, quantity: i64) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            author_id: None,
            published_year,
            category_id: None,
            quantity,
            available: quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of copies currently out on loan
    pub fn on_loan(&self) -> i64 {
        self.quantity - self.available
    }
}

/// A library member who borrows books
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reader {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

impl Reader {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            address: String::new(),
            created_at: now_millis(),
            active: true,
        }
    }
}

/// Status of a loan
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Overdue,
    Returned,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LoanStatus::Active),
            "overdue" => Ok(LoanStatus::Overdue),
            "returned" => Ok(LoanStatus::Returned),
            other => Err(format!("unknown loan status: {}", other)),
        }
    }
}

/// A reader borrowing one copy of a book
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: Uuid,
    pub book_id: Uuid,
    pub reader_id: Uuid,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    /// Stored status; may lag behind the clock until the overdue sweep runs
    pub status: LoanStatus,
}

impl Loan {
    /// Whether the loan still holds a copy of its book
    pub fn is_outstanding(&self) -> bool {
        self.return_date.is_none()
    }
}

// ==================== Request payloads ====================

/// Fields for a new book
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBook {
    pub title: String,
    pub author_id: Option<Uuid>,
    pub published_year: Option<i32>,
    pub category_id: Option<Uuid>,
    /// Defaults to a single copy
    pub quantity: Option<i64>,
}

/// Partial update of a book; absent fields are left unchanged
///
/// `authorId` and `categoryId` distinguish an absent field (`None`) from an
/// explicit `null` (`Some(None)`), which clears the reference.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BookChanges {
    pub title: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub author_id: Option<Option<Uuid>>,
    pub published_year: Option<i32>,
    #[serde(deserialize_with = "nullable")]
    pub category_id: Option<Option<Uuid>>,
    pub quantity: Option<i64>,
}

/// A present field, possibly `null`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewAuthor {
    pub name: String,
    pub nationality: String,
    pub birth_date: Option<NaiveDate>,
    pub biography: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorChanges {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub biography: Option<String>,
}

/// Category payload, used for both create and update
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewReader {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReaderChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Request to lend a book to a reader
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewLoan {
    pub book_id: Option<Uuid>,
    pub reader_id: Option<Uuid>,
}
