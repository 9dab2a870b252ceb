//! Reader handlers
//!
//! Readers are library patrons, not login accounts; managing them is part
//! of managing the catalog.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use biblio_core::{Capability, NewReader, Reader, ReaderChanges};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

pub async fn list_readers(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Reader>>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_readers()?))
}

pub async fn get_reader(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Reader>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_reader(id)?))
}

pub async fn create_reader(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    JsonBody(input): JsonBody<NewReader>,
) -> ApiResult<(StatusCode, Json<Reader>)> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    let reader = store.create_reader(input)?;
    Ok((StatusCode::CREATED, Json(reader)))
}

pub async fn update_reader(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(changes): JsonBody<ReaderChanges>,
) -> ApiResult<Json<Reader>> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    Ok(Json(store.update_reader(id, changes)?))
}

pub async fn delete_reader(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    store.delete_reader(id)?;
    Ok(StatusCode::NO_CONTENT)
}
