//! Book handlers
//!
//! Reads need a valid token; writes need `ManageCatalog`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use biblio_core::{Book, BookChanges, Capability, NewBook};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

pub async fn list_books(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Book>>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_books()?))
}

pub async fn get_book(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Book>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_book(id)?))
}

pub async fn create_book(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    JsonBody(input): JsonBody<NewBook>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    let book = store.create_book(input)?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// PUT and PATCH both apply only the fields present in the body
pub async fn update_book(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(changes): JsonBody<BookChanges>,
) -> ApiResult<Json<Book>> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    Ok(Json(store.update_book(id, changes)?))
}

pub async fn delete_book(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    store.delete_book(id)?;
    Ok(StatusCode::NO_CONTENT)
}
