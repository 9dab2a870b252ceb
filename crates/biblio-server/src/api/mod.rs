//! REST API for Biblio
//!
//! Provides HTTP endpoints for:
//! - Registration, login and bearer-token sessions
//! - Catalog management (books, authors, categories)
//! - Readers, users and loans
//! - Dashboard statistics and health

pub mod error;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use biblio_core::{LibraryError, LibraryResult, Store};

use crate::api::error::ApiResult;

/// Shared state for API handlers
pub struct ApiState {
    /// The single store; every request takes the lock for its duration
    pub store: Arc<Mutex<Store>>,
}

impl ApiState {
    pub fn new(store: Store) -> Self {
        Self::shared(Arc::new(Mutex::new(store)))
    }

    /// State around a store that other tasks also hold
    pub fn shared(store: Arc<Mutex<Store>>) -> Self {
        Self { store }
    }

    /// Run store work on the blocking pool while holding the lock
    ///
    /// For calls that may sit on SQLite's busy timeout or hash passwords.
    pub async fn blocking<T, F>(&self, work: F) -> ApiResult<T>
    where
        F: FnOnce(&mut Store) -> LibraryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let mut store = Arc::clone(&self.store).lock_owned().await;
        let result = tokio::task::spawn_blocking(move || work(&mut store))
            .await
            .map_err(|e| LibraryError::Internal(format!("Store task failed: {}", e)))?;
        Ok(result?)
    }
}

/// Build the API router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status/health
        .route("/api/health", get(handlers::status::health))
        // Accounts
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout))
        .route("/api/me", get(handlers::auth::me))
        // Books
        .route(
            "/api/books",
            get(handlers::books::list_books).post(handlers::books::create_book),
        )
        .route(
            "/api/books/:id",
            get(handlers::books::get_book)
                .put(handlers::books::update_book)
                .patch(handlers::books::update_book)
                .delete(handlers::books::delete_book),
        )
        // Authors
        .route(
            "/api/authors",
            get(handlers::authors::list_authors).post(handlers::authors::create_author),
        )
        .route(
            "/api/authors/:id",
            get(handlers::authors::get_author)
                .put(handlers::authors::update_author)
                .patch(handlers::authors::update_author)
                .delete(handlers::authors::delete_author),
        )
        // Categories
        .route(
            "/api/categories",
            get(handlers::categories::list_categories).post(handlers::categories::create_category),
        )
        .route(
            "/api/categories/:id",
            get(handlers::categories::get_category)
                .put(handlers::categories::update_category)
                .patch(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        // Readers
        .route(
            "/api/readers",
            get(handlers::readers::list_readers).post(handlers::readers::create_reader),
        )
        .route(
            "/api/readers/:id",
            get(handlers::readers::get_reader)
                .put(handlers::readers::update_reader)
                .patch(handlers::readers::update_reader)
                .delete(handlers::readers::delete_reader),
        )
        // Users
        .route("/api/users", get(handlers::users::list_users))
        .route(
            "/api/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        // Loans
        .route(
            "/api/loans",
            get(handlers::loans::list_loans).post(handlers::loans::create_loan),
        )
        // Static segment wins over /:id
        .route(
            "/api/loans/refresh-overdue",
            post(handlers::loans::refresh_overdue),
        )
        .route(
            "/api/loans/:id",
            get(handlers::loans::get_loan)
                .put(handlers::loans::update_loan)
                .patch(handlers::loans::update_loan)
                .delete(handlers::loans::delete_loan),
        )
        .route("/api/loans/:id/return", post(handlers::loans::return_loan))
        // Dashboard
        .route("/api/dashboard", get(handlers::dashboard::stats))
        // Middleware
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(())
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        if !status.is_success() {
                            tracing::warn!(
                                status = %status,
                                latency_ms = latency.as_millis(),
                                "request failed"
                            );
                        }
                    },
                ),
        )
        .with_state(state)
}

/// Start the API server
pub async fn serve(state: Arc<ApiState>, bind_addr: &str) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    tracing::info!("Biblio API listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use biblio_core::{Config, NewReader};

    fn state() -> ApiState {
        ApiState::new(Store::open_in_memory(Config::default()).unwrap())
    }

    #[tokio::test]
    async fn test_blocking_runs_store_work() {
        let state = state();
        let reader = state
            .blocking(|store| {
                store.create_reader(NewReader {
                    name: "Ana".to_string(),
                    email: "ana@email.com".to_string(),
                    ..Default::default()
                })
            })
            .await
            .unwrap();

        let store = state.store.lock().await;
        assert_eq!(store.get_reader(reader.id).unwrap().name, "Ana");
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal_and_releases_lock() {
        let state = state();
        let result: ApiResult<()> = state
            .blocking(|_store| -> LibraryResult<()> { panic!("boom") })
            .await;
        assert!(matches!(result, Err(ApiError(LibraryError::Internal(_)))));

        let readers = state.blocking(|store| store.list_readers()).await.unwrap();
        assert!(readers.is_empty());
    }
}
