//! Unified storage interface
//!
//! The `Store` owns the SQLite connection and the configuration, and is the
//! only way the rest of the system reads or changes library data. It
//! validates input, turns missing rows into `NotFound` errors and keeps
//! book availability in step with outstanding loans.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open_with_config(Config::load()?)?;
//!
//! let book = store.create_book(NewBook { title: "Iracema".into(), published_year: Some(1865), ..Default::default() })?;
//! let loan = store.issue_loan(book.id, reader.id, Utc::now())?;
//! store.return_loan(loan.id, Utc::now())?;
//! ```

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{LibraryError, LibraryResult};
use crate::lifecycle;
use crate::models::{
    Author, AuthorChanges, Book, BookChanges, Category, CategoryInput, Loan, LoanStatus, NewAuthor,
    NewBook, NewLoan, NewReader, Reader, ReaderChanges, User, UserChanges,
};
use crate::storage::{
    books, catalog, loans, now_millis, readers, truncate_to_millis, users, Database,
};

/// Unified storage interface for Biblio
pub struct Store {
    db: Database,
    config: Config,
}

impl Store {
    /// Open the store with a specific configuration
    pub fn open_with_config(config: Config) -> LibraryResult<Self> {
        let db = Database::open(&config)?;
        Ok(Self { db, config })
    }

    /// Open a store backed by an in-memory database (for testing)
    pub fn open_in_memory(config: Config) -> LibraryResult<Self> {
        let db = Database::open_in_memory()?;
        Ok(Self { db, config })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn connection(&self) -> &Connection {
        self.db.connection()
    }

    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    // ==================== Books ====================

    pub fn create_book(&mut self, input: NewBook) -> LibraryResult<Book> {
        let title = required(&input.title, "title")?;
        let published_year = input
            .published_year
            .ok_or_else(|| LibraryError::validation("publishedYear is required"))?;
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 0 {
            return Err(LibraryError::validation("quantity cannot be negative"));
        }

        ensure_references(self.connection(), input.author_id, input.category_id)?;

        let mut book = Book::new(title, published_year, quantity);
        book.author_id = input.author_id;
        book.category_id = input.category_id;
        books::insert_book(self.connection(), &book)?;

        info!(book_id = %book.id, quantity, "Created book");
        Ok(book)
    }

    pub fn get_book(&self, id: Uuid) -> LibraryResult<Book> {
        books::get_book(self.connection(), id)?.ok_or(LibraryError::not_found("Book", id))
    }

    pub fn list_books(&self) -> LibraryResult<Vec<Book>> {
        Ok(books::list_books(self.connection())?)
    }

    /// Apply a partial update
    ///
    /// Changing `quantity` shifts `available` by the same amount; the new
    /// quantity cannot drop below the number of copies out on loan.
    pub fn update_book(&mut self, id: Uuid, changes: BookChanges) -> LibraryResult<Book> {
        let tx = self.db.write_transaction()?;
        let mut book = books::get_book(&tx, id)?.ok_or(LibraryError::not_found("Book", id))?;

        if let Some(title) = changes.title {
            book.title = required(&title, "title")?;
        }
        if let Some(year) = changes.published_year {
            book.published_year = year;
        }
        if let Some(author_id) = changes.author_id {
            book.author_id = author_id;
        }
        if let Some(category_id) = changes.category_id {
            book.category_id = category_id;
        }
        if let Some(quantity) = changes.quantity {
            if quantity < 0 {
                return Err(LibraryError::validation("quantity cannot be negative"));
            }
            let on_loan = book.on_loan();
            if quantity < on_loan {
                return Err(LibraryError::Conflict(format!(
                    "quantity {} is below the {} copies currently on loan",
                    quantity, on_loan
                )));
            }
            book.quantity = quantity;
            book.available = quantity - on_loan;
        }

        ensure_references(
            &tx,
            changes.author_id.flatten(),
            changes.category_id.flatten(),
        )?;

        book.updated_at = now_millis();
        books::update_book(&tx, &book)?;
        tx.commit()?;

        info!(book_id = %book.id, "Updated book");
        Ok(book)
    }

    /// Delete a book and its returned-loan history
    pub fn delete_book(&mut self, id: Uuid) -> LibraryResult<()> {
        let tx = self.db.write_transaction()?;
        if books::get_book(&tx, id)?.is_none() {
            return Err(LibraryError::not_found("Book", id));
        }

        let outstanding = loans::outstanding_for_book(&tx, id)?;
        if outstanding > 0 {
            return Err(LibraryError::Conflict(format!(
                "Book has {} copies on loan",
                outstanding
            )));
        }

        books::delete_book(&tx, id)?;
        tx.commit()?;

        info!(book_id = %id, "Deleted book");
        Ok(())
    }

    // ==================== Authors ====================

    pub fn create_author(&mut self, input: NewAuthor) -> LibraryResult<Author> {
        let author = Author {
            id: Uuid::new_v4(),
            name: required(&input.name, "name")?,
            nationality: input.nationality.trim().to_string(),
            birth_date: input.birth_date,
            biography: input.biography,
        };
        catalog::insert_author(self.connection(), &author)?;
        info!(author_id = %author.id, "Created author");
        Ok(author)
    }

    pub fn get_author(&self, id: Uuid) -> LibraryResult<Author> {
        catalog::get_author(self.connection(), id)?.ok_or(LibraryError::not_found("Author", id))
    }

    pub fn list_authors(&self) -> LibraryResult<Vec<Author>> {
        Ok(catalog::list_authors(self.connection())?)
    }

    pub fn update_author(&mut self, id: Uuid, changes: AuthorChanges) -> LibraryResult<Author> {
        let mut author = self.get_author(id)?;
        if let Some(name) = changes.name {
            author.name = required(&name, "name")?;
        }
        if let Some(nationality) = changes.nationality {
            author.nationality = nationality.trim().to_string();
        }
        if changes.birth_date.is_some() {
            author.birth_date = changes.birth_date;
        }
        if changes.biography.is_some() {
            author.biography = changes.biography;
        }
        catalog::update_author(self.connection(), &author)?;
        Ok(author)
    }

    /// Delete an author; their books keep existing without an author
    pub fn delete_author(&mut self, id: Uuid) -> LibraryResult<()> {
        if !catalog::delete_author(self.connection(), id)? {
            return Err(LibraryError::not_found("Author", id));
        }
        info!(author_id = %id, "Deleted author");
        Ok(())
    }

    // ==================== Categories ====================

    pub fn create_category(&mut self, input: CategoryInput) -> LibraryResult<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: required(&input.name, "name")?,
        };
        catalog::insert_category(self.connection(), &category)?;
        info!(category_id = %category.id, "Created category");
        Ok(category)
    }

    pub fn get_category(&self, id: Uuid) -> LibraryResult<Category> {
        catalog::get_category(self.connection(), id)?
            .ok_or(LibraryError::not_found("Category", id))
    }

    pub fn list_categories(&self) -> LibraryResult<Vec<Category>> {
        Ok(catalog::list_categories(self.connection())?)
    }

    pub fn update_category(&mut self, id: Uuid, input: CategoryInput) -> LibraryResult<Category> {
        let category = Category {
            id,
            name: required(&input.name, "name")?,
        };
        if !catalog::update_category(self.connection(), &category)? {
            return Err(LibraryError::not_found("Category", id));
        }
        Ok(category)
    }

    pub fn delete_category(&mut self, id: Uuid) -> LibraryResult<()> {
        if !catalog::delete_category(self.connection(), id)? {
            return Err(LibraryError::not_found("Category", id));
        }
        info!(category_id = %id, "Deleted category");
        Ok(())
    }

    // ==================== Readers ====================

    pub fn create_reader(&mut self, input: NewReader) -> LibraryResult<Reader> {
        let mut reader = Reader::new(
            required(&input.name, "name")?,
            required(&input.email, "email")?,
        );
        reader.phone = input.phone.trim().to_string();
        reader.address = input.address.trim().to_string();
        reader.active = input.active.unwrap_or(true);

        readers::insert_reader(self.connection(), &reader)?;
        info!(reader_id = %reader.id, "Created reader");
        Ok(reader)
    }

    pub fn get_reader(&self, id: Uuid) -> LibraryResult<Reader> {
        readers::get_reader(self.connection(), id)?.ok_or(LibraryError::not_found("Reader", id))
    }

    pub fn list_readers(&self) -> LibraryResult<Vec<Reader>> {
        Ok(readers::list_readers(self.connection())?)
    }

    pub fn update_reader(&mut self, id: Uuid, changes: ReaderChanges) -> LibraryResult<Reader> {
        let mut reader = self.get_reader(id)?;
        if let Some(name) = changes.name {
            reader.name = required(&name, "name")?;
        }
        if let Some(email) = changes.email {
            reader.email = required(&email, "email")?;
        }
        if let Some(phone) = changes.phone {
            reader.phone = phone.trim().to_string();
        }
        if let Some(address) = changes.address {
            reader.address = address.trim().to_string();
        }
        if let Some(active) = changes.active {
            reader.active = active;
        }
        readers::update_reader(self.connection(), &reader)?;
        Ok(reader)
    }

    pub fn delete_reader(&mut self, id: Uuid) -> LibraryResult<()> {
        let tx = self.db.write_transaction()?;
        if readers::get_reader(&tx, id)?.is_none() {
            return Err(LibraryError::not_found("Reader", id));
        }

        let outstanding = loans::outstanding_for_reader(&tx, id)?;
        if outstanding > 0 {
            return Err(LibraryError::Conflict(format!(
                "Reader still has {} books on loan",
                outstanding
            )));
        }

        readers::delete_reader(&tx, id)?;
        tx.commit()?;

        info!(reader_id = %id, "Deleted reader");
        Ok(())
    }

    // ==================== Users ====================

    pub fn get_user(&self, id: Uuid) -> LibraryResult<User> {
        users::get_user(self.connection(), id)?.ok_or(LibraryError::not_found("User", id))
    }

    pub fn list_users(&self) -> LibraryResult<Vec<User>> {
        Ok(users::list_users(self.connection())?)
    }

    pub fn update_user(&mut self, id: Uuid, changes: UserChanges) -> LibraryResult<User> {
        let mut user = self.get_user(id)?;
        if let Some(name) = changes.name {
            user.name = required(&name, "name")?;
        }
        if let Some(email) = changes.email {
            let email = required(&email, "email")?.to_lowercase();
            if let Some(other) = users::find_user_by_email(self.connection(), &email)? {
                if other.id != id {
                    return Err(LibraryError::Conflict("Email already registered".to_string()));
                }
            }
            user.email = email;
        }
        users::update_user(self.connection(), &user)?;
        Ok(user)
    }

    pub fn delete_user(&mut self, id: Uuid) -> LibraryResult<()> {
        if !users::delete_user(self.connection(), id)? {
            return Err(LibraryError::not_found("User", id));
        }
        info!(user_id = %id, "Deleted user");
        Ok(())
    }

    // ==================== Loans ====================

    /// Validate a loan request payload and issue it
    pub fn create_loan(&mut self, input: NewLoan, as_of: DateTime<Utc>) -> LibraryResult<Loan> {
        let book_id = input
            .book_id
            .ok_or_else(|| LibraryError::validation("bookId is required"))?;
        let reader_id = input
            .reader_id
            .ok_or_else(|| LibraryError::validation("readerId is required"))?;
        self.issue_loan(book_id, reader_id, as_of)
    }

    /// Lend one copy of a book to a reader
    ///
    /// The availability decrement and the loan insert commit together or not
    /// at all. Fails with `BookUnavailable` when no copy is left, leaving
    /// the book untouched.
    pub fn issue_loan(
        &mut self,
        book_id: Uuid,
        reader_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> LibraryResult<Loan> {
        let as_of = truncate_to_millis(as_of);
        let due_date = lifecycle::due_date(as_of, self.config.loan_period())
            .ok_or_else(|| LibraryError::validation("loan period is out of range"))?;
        let tx = self.db.write_transaction()?;

        let reader = readers::get_reader(&tx, reader_id)?
            .ok_or(LibraryError::not_found("Reader", reader_id))?;
        if !reader.active {
            return Err(LibraryError::validation(format!(
                "Reader {} is inactive",
                reader_id
            )));
        }

        if !books::take_copy(&tx, book_id, as_of)? {
            return Err(match books::get_book(&tx, book_id)? {
                Some(_) => LibraryError::BookUnavailable(book_id),
                None => LibraryError::not_found("Book", book_id),
            });
        }

        let loan = Loan {
            id: Uuid::new_v4(),
            book_id,
            reader_id,
            loan_date: as_of,
            due_date,
            return_date: None,
            status: LoanStatus::Active,
        };
        loans::insert_loan(&tx, &loan)?;
        tx.commit()?;

        info!(loan_id = %loan.id, book_id = %book_id, reader_id = %reader_id, "Issued loan");
        Ok(loan)
    }

    /// Close a loan and put its copy back on the shelf
    pub fn return_loan(&mut self, loan_id: Uuid, as_of: DateTime<Utc>) -> LibraryResult<Loan> {
        let as_of = truncate_to_millis(as_of);
        let tx = self.db.write_transaction()?;

        let mut loan = loans::get_loan(&tx, loan_id)?.ok_or(LibraryError::LoanNotFound(loan_id))?;
        if loan.return_date.is_some() || !loans::mark_returned(&tx, loan_id, as_of)? {
            return Err(LibraryError::AlreadyReturned(loan_id));
        }

        if !books::restore_copy(&tx, loan.book_id, as_of)? {
            warn!(
                loan_id = %loan_id,
                book_id = %loan.book_id,
                "Book already has every copy available; availability left unchanged"
            );
        }
        tx.commit()?;

        loan.return_date = Some(as_of);
        loan.status = LoanStatus::Returned;

        info!(loan_id = %loan_id, book_id = %loan.book_id, "Returned loan");
        Ok(loan)
    }

    /// Get a loan with its status derived at `as_of`
    pub fn get_loan(&self, id: Uuid, as_of: DateTime<Utc>) -> LibraryResult<Loan> {
        let loan = loans::get_loan(self.connection(), id)?.ok_or(LibraryError::LoanNotFound(id))?;
        Ok(lifecycle::project(loan, as_of))
    }

    /// All loans, most recent first, with statuses derived at `as_of`
    pub fn list_loans(&self, as_of: DateTime<Utc>) -> LibraryResult<Vec<Loan>> {
        let loans = loans::list_loans(self.connection())?;
        Ok(loans
            .into_iter()
            .map(|loan| lifecycle::project(loan, as_of))
            .collect())
    }

    /// Remove a loan record, restoring availability if it was outstanding
    pub fn delete_loan(&mut self, id: Uuid) -> LibraryResult<()> {
        let tx = self.db.write_transaction()?;
        let loan = loans::get_loan(&tx, id)?.ok_or(LibraryError::LoanNotFound(id))?;

        loans::delete_loan(&tx, id)?;
        if loan.is_outstanding() {
            books::restore_copy(&tx, loan.book_id, Utc::now())?;
        }
        tx.commit()?;

        info!(loan_id = %id, outstanding = loan.is_outstanding(), "Deleted loan");
        Ok(())
    }

    /// Persist `overdue` for stored-active loans past due at `as_of`
    pub fn refresh_overdue(&mut self, as_of: DateTime<Utc>) -> LibraryResult<usize> {
        let changed = loans::mark_overdue(self.connection(), as_of)?;
        if changed > 0 {
            info!(changed, "Marked loans overdue");
        }
        Ok(changed)
    }
}

/// Trimmed, non-empty value of a required text field
pub(crate) fn required(value: &str, field: &str) -> LibraryResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(LibraryError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

fn ensure_references(
    conn: &Connection,
    author_id: Option<Uuid>,
    category_id: Option<Uuid>,
) -> LibraryResult<()> {
    if let Some(id) = author_id {
        if catalog::get_author(conn, id)?.is_none() {
            return Err(LibraryError::not_found("Author", id));
        }
    }
    if let Some(id) = category_id {
        if catalog::get_category(conn, id)?.is_none() {
            return Err(LibraryError::not_found("Category", id));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn test_store() -> Store {
        Store::open_in_memory(Config::default()).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn add_book(store: &mut Store, quantity: i64) -> Book {
        store
            .create_book(NewBook {
                title: "Dom Casmurro".to_string(),
                published_year: Some(1899),
                quantity: Some(quantity),
                ..Default::default()
            })
            .unwrap()
    }

    fn add_reader(store: &mut Store) -> Reader {
        store
            .create_reader(NewReader {
                name: "João Silva".to_string(),
                email: "joao@email.com".to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    // ==================== Catalog ====================

    #[test]
    fn test_create_book_requires_title_and_year() {
        let mut store = test_store();

        let missing_title = store.create_book(NewBook {
            title: "   ".to_string(),
            published_year: Some(2000),
            ..Default::default()
        });
        assert!(matches!(missing_title, Err(LibraryError::Validation(_))));

        let missing_year = store.create_book(NewBook {
            title: "Title".to_string(),
            ..Default::default()
        });
        assert!(matches!(missing_year, Err(LibraryError::Validation(_))));
    }

    #[test]
    fn test_create_book_defaults_to_one_copy() {
        let mut store = test_store();
        let book = store
            .create_book(NewBook {
                title: "Iracema".to_string(),
                published_year: Some(1865),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(book.quantity, 1);
        assert_eq!(book.available, 1);
    }

    #[test]
    fn test_create_book_rejects_unknown_author() {
        let mut store = test_store();
        let result = store.create_book(NewBook {
            title: "Orphan".to_string(),
            published_year: Some(2000),
            author_id: Some(Uuid::new_v4()),
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(LibraryError::NotFound { entity: "Author", .. })
        ));
    }

    #[test]
    fn test_update_book_quantity_shifts_availability() {
        let mut store = test_store();
        let book = add_book(&mut store, 3);
        let reader = add_reader(&mut store);
        store.issue_loan(book.id, reader.id, now()).unwrap();

        let updated = store
            .update_book(
                book.id,
                BookChanges {
                    quantity: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.quantity, 5);
        assert_eq!(updated.available, 4);

        let shrunk = store
            .update_book(
                book.id,
                BookChanges {
                    quantity: Some(1),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(shrunk.available, 0);

        let below = store.update_book(
            book.id,
            BookChanges {
                quantity: Some(0),
                ..Default::default()
            },
        );
        assert!(matches!(below, Err(LibraryError::Conflict(_))));
    }

    #[test]
    fn test_delete_book_with_outstanding_loan_conflicts() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);
        let loan = store.issue_loan(book.id, reader.id, now()).unwrap();

        assert!(matches!(
            store.delete_book(book.id),
            Err(LibraryError::Conflict(_))
        ));

        store.return_loan(loan.id, now()).unwrap();
        store.delete_book(book.id).unwrap();
        assert!(matches!(
            store.get_book(book.id),
            Err(LibraryError::NotFound { .. })
        ));
        assert!(matches!(
            store.get_loan(loan.id, now()),
            Err(LibraryError::LoanNotFound(_))
        ));
    }

    #[test]
    fn test_delete_reader_with_outstanding_loan_conflicts() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);
        store.issue_loan(book.id, reader.id, now()).unwrap();

        assert!(matches!(
            store.delete_reader(reader.id),
            Err(LibraryError::Conflict(_))
        ));
    }

    #[test]
    fn test_category_update_requires_name() {
        let mut store = test_store();
        let category = store
            .create_category(CategoryInput {
                name: "Poesia".to_string(),
            })
            .unwrap();

        let result = store.update_category(category.id, CategoryInput::default());
        assert!(matches!(result, Err(LibraryError::Validation(_))));

        let missing = store.update_category(
            Uuid::new_v4(),
            CategoryInput {
                name: "X".to_string(),
            },
        );
        assert!(matches!(missing, Err(LibraryError::NotFound { .. })));
    }

    #[test]
    fn test_author_partial_update() {
        let mut store = test_store();
        let author = store
            .create_author(NewAuthor {
                name: "Clarice Lispector".to_string(),
                nationality: "Brazilian".to_string(),
                ..Default::default()
            })
            .unwrap();

        let updated = store
            .update_author(
                author.id,
                AuthorChanges {
                    biography: Some("Writer".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, "Clarice Lispector");
        assert_eq!(updated.biography.as_deref(), Some("Writer"));
    }

    #[test]
    fn test_update_book_clears_author_only_when_null() {
        let mut store = test_store();
        let author = store
            .create_author(NewAuthor {
                name: "Machado de Assis".to_string(),
                nationality: "Brazilian".to_string(),
                ..Default::default()
            })
            .unwrap();
        let book = add_book(&mut store, 1);

        let linked = store
            .update_book(
                book.id,
                BookChanges {
                    author_id: Some(Some(author.id)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(linked.author_id, Some(author.id));

        let untouched = store
            .update_book(
                book.id,
                BookChanges {
                    title: Some("Dom Casmurro (2nd ed.)".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(untouched.author_id, Some(author.id));

        let cleared = store
            .update_book(
                book.id,
                BookChanges {
                    author_id: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.author_id, None);
        assert_eq!(store.get_book(book.id).unwrap().author_id, None);
    }

    #[test]
    fn test_returned_book_matches_stored_row() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        assert_eq!(store.get_book(book.id).unwrap(), book);

        let updated = store
            .update_book(
                book.id,
                BookChanges {
                    quantity: Some(4),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(store.get_book(book.id).unwrap(), updated);
    }

    // ==================== Loans ====================

    #[test]
    fn test_returned_loans_match_stored_rows() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);
        let as_of = Utc::now();

        let issued = store.issue_loan(book.id, reader.id, as_of).unwrap();
        assert_eq!(store.get_loan(issued.id, as_of).unwrap(), issued);

        let returned = store.return_loan(issued.id, as_of).unwrap();
        assert_eq!(store.get_loan(issued.id, as_of).unwrap(), returned);
    }

    #[test]
    fn test_out_of_range_loan_period_is_rejected() {
        let config = Config {
            loan_period_days: 200_000_000,
            ..Config::default()
        };
        let mut store = Store::open_in_memory(config).unwrap();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);

        let result = store.issue_loan(book.id, reader.id, now());
        assert!(matches!(result, Err(LibraryError::Validation(_))));
        assert_eq!(store.get_book(book.id).unwrap().available, 1);
        assert!(store.list_loans(now()).unwrap().is_empty());
    }

    #[test]
    fn test_issue_and_return_scenario() {
        let mut store = test_store();
        let book = add_book(&mut store, 3);
        let reader = add_reader(&mut store);

        let loan = store.issue_loan(book.id, reader.id, now()).unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.due_date, now() + Duration::days(14));
        assert_eq!(store.get_book(book.id).unwrap().available, 2);

        let later = now() + Duration::days(15);
        assert_eq!(
            store.get_loan(loan.id, later).unwrap().status,
            LoanStatus::Overdue
        );

        let returned = store.return_loan(loan.id, later).unwrap();
        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.return_date, Some(later));
        assert_eq!(store.get_book(book.id).unwrap().available, 3);

        let again = store.return_loan(loan.id, later);
        assert!(matches!(again, Err(LibraryError::AlreadyReturned(_))));
        assert_eq!(store.get_book(book.id).unwrap().available, 3);
    }

    #[test]
    fn test_issue_on_empty_book_leaves_state_unchanged() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);
        store.issue_loan(book.id, reader.id, now()).unwrap();

        let result = store.issue_loan(book.id, reader.id, now());
        assert!(matches!(result, Err(LibraryError::BookUnavailable(id)) if id == book.id));
        assert_eq!(store.get_book(book.id).unwrap().available, 0);
        assert_eq!(store.list_loans(now()).unwrap().len(), 1);
    }

    #[test]
    fn test_issue_with_zero_quantity_book() {
        let mut store = test_store();
        let book = add_book(&mut store, 0);
        let reader = add_reader(&mut store);

        let result = store.issue_loan(book.id, reader.id, now());
        assert!(matches!(result, Err(LibraryError::BookUnavailable(_))));
        assert!(store.list_loans(now()).unwrap().is_empty());
    }

    #[test]
    fn test_issue_for_missing_book_or_reader() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);

        assert!(matches!(
            store.issue_loan(Uuid::new_v4(), reader.id, now()),
            Err(LibraryError::NotFound { entity: "Book", .. })
        ));
        assert!(matches!(
            store.issue_loan(book.id, Uuid::new_v4(), now()),
            Err(LibraryError::NotFound { entity: "Reader", .. })
        ));
        assert_eq!(store.get_book(book.id).unwrap().available, 1);
    }

    #[test]
    fn test_inactive_reader_cannot_borrow() {
        let mut store = test_store();
        let book = add_book(&mut store, 1);
        let reader = add_reader(&mut store);
        store
            .update_reader(
                reader.id,
                ReaderChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let result = store.issue_loan(book.id, reader.id, now());
        assert!(matches!(result, Err(LibraryError::Validation(_))));
        assert_eq!(store.get_book(book.id).unwrap().available, 1);
    }

    #[test]
    fn test_create_loan_requires_ids() {
        let mut store = test_store();
        let result = store.create_loan(NewLoan::default(), now());
        assert!(matches!(result, Err(LibraryError::Validation(_))));
    }

    #[test]
    fn test_return_missing_loan() {
        let mut store = test_store();
        let result = store.return_loan(Uuid::new_v4(), now());
        assert!(matches!(result, Err(LibraryError::LoanNotFound(_))));
    }

    #[test]
    fn test_delete_outstanding_loan_restores_copy() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        let reader = add_reader(&mut store);
        let loan = store.issue_loan(book.id, reader.id, now()).unwrap();

        store.delete_loan(loan.id).unwrap();
        assert_eq!(store.get_book(book.id).unwrap().available, 2);
        assert!(matches!(
            store.delete_loan(loan.id),
            Err(LibraryError::LoanNotFound(_))
        ));
    }

    #[test]
    fn test_delete_returned_loan_keeps_availability() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        let reader = add_reader(&mut store);
        let loan = store.issue_loan(book.id, reader.id, now()).unwrap();
        store.return_loan(loan.id, now()).unwrap();

        store.delete_loan(loan.id).unwrap();
        assert_eq!(store.get_book(book.id).unwrap().available, 2);
    }

    #[test]
    fn test_refresh_overdue_persists_status() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        let reader = add_reader(&mut store);
        let loan = store.issue_loan(book.id, reader.id, now()).unwrap();

        let later = now() + Duration::days(20);
        assert_eq!(store.refresh_overdue(now()).unwrap(), 0);
        assert_eq!(store.refresh_overdue(later).unwrap(), 1);
        assert_eq!(store.refresh_overdue(later).unwrap(), 0);

        // Stored status is now overdue even before projection
        let stored = loans::get_loan(store.connection(), loan.id).unwrap().unwrap();
        assert_eq!(stored.status, LoanStatus::Overdue);

        store.return_loan(loan.id, later).unwrap();
        assert_eq!(
            store.get_loan(loan.id, later).unwrap().status,
            LoanStatus::Returned
        );
    }

    #[test]
    fn test_list_loans_projects_status() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        let reader = add_reader(&mut store);
        store.issue_loan(book.id, reader.id, now()).unwrap();
        store
            .issue_loan(book.id, reader.id, now() + Duration::days(10))
            .unwrap();

        let statuses: Vec<LoanStatus> = store
            .list_loans(now() + Duration::days(16))
            .unwrap()
            .into_iter()
            .map(|l| l.status)
            .collect();
        assert_eq!(statuses, vec![LoanStatus::Active, LoanStatus::Overdue]);
    }

    #[test]
    fn test_availability_stays_within_bounds() {
        let mut store = test_store();
        let book = add_book(&mut store, 2);
        let reader = add_reader(&mut store);

        let mut issued = Vec::new();
        for _ in 0..4 {
            if let Ok(loan) = store.issue_loan(book.id, reader.id, now()) {
                issued.push(loan);
            }
            let b = store.get_book(book.id).unwrap();
            assert!(b.available >= 0 && b.available <= b.quantity);
        }
        assert_eq!(issued.len(), 2);

        for loan in issued {
            store.return_loan(loan.id, now()).unwrap();
            let b = store.get_book(book.id).unwrap();
            assert!(b.available >= 0 && b.available <= b.quantity);
        }
        assert_eq!(store.get_book(book.id).unwrap().available, 2);
    }

    #[test]
    fn test_concurrent_issues_succeed_min_of_requests_and_copies() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let (book, reader) = {
            let mut store = Store::open_with_config(config.clone()).unwrap();
            (add_book(&mut store, 3), add_reader(&mut store))
        };

        let requests = 8;
        let barrier = Arc::new(Barrier::new(requests));
        let handles: Vec<_> = (0..requests)
            .map(|_| {
                let mut store = Store::open_with_config(config.clone()).unwrap();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.issue_loan(book.id, reader.id, Utc::now())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        let unavailable = results
            .iter()
            .filter(|r| matches!(r, Err(LibraryError::BookUnavailable(_))))
            .count();

        assert_eq!(succeeded, 3);
        assert_eq!(unavailable, requests - 3);

        let store = Store::open_with_config(config).unwrap();
        assert_eq!(store.get_book(book.id).unwrap().available, 0);
        assert_eq!(store.list_loans(Utc::now()).unwrap().len(), 3);
    }
}
