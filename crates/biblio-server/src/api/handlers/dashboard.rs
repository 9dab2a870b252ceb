use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use biblio_core::{Capability, DashboardStats};

use crate::api::error::ApiResult;
use crate::api::extract::AuthUser;
use crate::api::ApiState;

pub async fn stats(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<DashboardStats>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.dashboard(Utc::now())?))
}
