use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use biblio_core::{Capability, Category, CategoryInput};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

pub async fn list_categories(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_categories()?))
}

pub async fn get_category(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Category>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_category(id)?))
}

pub async fn create_category(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    JsonBody(input): JsonBody<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    let category = store.create_category(input)?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(input): JsonBody<CategoryInput>,
) -> ApiResult<Json<Category>> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    Ok(Json(store.update_category(id, input)?))
}

pub async fn delete_category(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageCatalog)?;
    let mut store = state.store.lock().await;
    store.delete_category(id)?;
    Ok(StatusCode::NO_CONTENT)
}
