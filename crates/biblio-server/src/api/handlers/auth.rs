//! Account handlers

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use biblio_core::{Credentials, Registration, Session, User};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, JsonBody};
use crate::api::ApiState;

pub async fn register(
    State(state): State<Arc<ApiState>>,
    JsonBody(registration): JsonBody<Registration>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state
        .blocking(move |store| store.register(registration))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<Arc<ApiState>>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> ApiResult<Json<Session>> {
    let session = state
        .blocking(move |store| store.authenticate(credentials, Utc::now()))
        .await?;
    Ok(Json(session))
}

pub async fn logout(State(state): State<Arc<ApiState>>, auth: AuthUser) -> ApiResult<StatusCode> {
    let mut store = state.store.lock().await;
    store.logout(&auth.token)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}
