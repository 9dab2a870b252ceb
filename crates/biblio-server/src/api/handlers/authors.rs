use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use biblio_core::{Author, AuthorChanges, Capability, NewAuthor};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

pub async fn list_authors(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Author>>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_authors()?))
}

pub async fn get_author(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Author>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_author(id)?))
}

pub async fn create_author(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    JsonBody(input): JsonBody<NewAuthor>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    let author = store.create_author(input)?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn update_author(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(changes): JsonBody<AuthorChanges>,
) -> ApiResult<Json<Author>> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    Ok(Json(store.update_author(id, changes)?))
}

/// Books by this author stay in the catalog without an author
pub async fn delete_author(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    store.delete_author(id)?;
    Ok(StatusCode::NO_CONTENT)
}
