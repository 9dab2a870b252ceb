//! Loan handlers
//!
//! Any authenticated user may issue and return loans. Statuses in every
//! response are derived at request time.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use biblio_core::{Capability, LibraryError, Loan, NewLoan};

use crate::api::error::ApiResult;
use crate::api::extract::{AuthUser, EntityId, JsonBody};
use crate::api::ApiState;

/// Body of `PUT`/`PATCH /api/loans/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoanUpdate {
    pub returned: Option<bool>,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub updated: usize,
}

pub async fn list_loans(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<Loan>>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.list_loans(Utc::now())?))
}

pub async fn get_loan(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Loan>> {
    auth.require(Capability::ReadCatalog)?;
    let store = state.store.lock().await;
    Ok(Json(store.get_loan(id, Utc::now())?))
}

pub async fn create_loan(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    JsonBody(input): JsonBody<NewLoan>,
) -> ApiResult<(StatusCode, Json<Loan>)> {
    auth.require(Capability::ManageLoans)?;
    let loan = state
        .blocking(move |store| store.create_loan(input, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// Only `{"returned": true}` is accepted; it returns the loan
pub async fn update_loan(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
    JsonBody(update): JsonBody<LoanUpdate>,
) -> ApiResult<Json<Loan>> {
    auth.require(Capability::ManageLoans)?;
    if update.returned != Some(true) {
        return Err(LibraryError::validation("Only {\"returned\": true} is supported").into());
    }
    let loan = state
        .blocking(move |store| store.return_loan(id, Utc::now()))
        .await?;
    Ok(Json(loan))
}

pub async fn return_loan(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<Json<Loan>> {
    auth.require(Capability::ManageLoans)?;
    let loan = state
        .blocking(move |store| store.return_loan(id, Utc::now()))
        .await?;
    Ok(Json(loan))
}

pub async fn delete_loan(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
    EntityId(id): EntityId,
) -> ApiResult<StatusCode> {
    auth.require(Capability::ManageLoans)?;
    let mut store = state.store.lock().await;
    store.delete_loan(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_overdue(
    State(state): State<Arc<ApiState>>,
    auth: AuthUser,
) -> ApiResult<Json<RefreshResponse>> {
    auth.require(Capability::SweepOverdue)?;
    let mut store = state.store.lock().await;
    let updated = store.refresh_overdue(Utc::now())?;
    Ok(Json(RefreshResponse { updated }))
}
