//! User account handlers; all require `ManageUsers`

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use biblio_core::{Capability, User, UserChanges};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

pub async fn list_users(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<User>>> {
    auth.require(Capability::ManageUsers)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_users()?))
}

pub async fn get_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<User>> {
    auth.require(Capability::ManageUsers)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_user(id)?))
}

pub async fn update_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(changes): JsonBody<UserChanges>,
) -> ApiResult<Json<User>> {
    auth.require(Capability::ManageUsers)?;
    let mut store = state.store.lock().await;
    Ok(Json(store.update_user(id, changes)?))
}

pub async fn delete_user(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageUsers)?;
    let mut store = state.store.lock().await;
    store.delete_user(id)?;
    Ok(StatusCode::NO_CONTENT)
}
