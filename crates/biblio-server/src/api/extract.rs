//! Request extractors
//!
//! `AuthUser` resolves the bearer token, `EntityId` parses the `:id` path
//! segment and `JsonBody` parses the request body. All three reject with
//! the API's JSON error shape.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use biblio_core::{authorize, Capability, LibraryError, User};

use crate::api::error::{ApiError, ApiResult};
use crate::api::ApiState;

/// The authenticated caller
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    /// Reject with 403 unless the caller's role grants `capability`
    pub fn require(&self, capability: Capability) -> ApiResult<()> {
        authorize(&self.user, capability)?;
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<Arc<ApiState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ApiState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| LibraryError::Unauthorized("Missing bearer token".to_string()))?;

        let store = state.store.lock().await;
        let user = store.verify_token(&token, Utc::now())?;

        Ok(AuthUser { user, token })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// UUID from the `:id` path segment
pub struct EntityId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await?;
        Ok(EntityId(id))
    }
}

/// JSON request body; malformed input is a 400
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
