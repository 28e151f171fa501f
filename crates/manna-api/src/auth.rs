//! Bearer-token session extractors.
//!
//! The token is resolved through [`RemoteStore::user_for_token`], so the same
//! extractor works against either backend.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{header, request::Parts},
};
use manna_core::{
  Error,
  store::{AuthUser, RemoteStore},
};

use crate::{AppState, error::ApiError};

/// The signed-in caller. Rejects with 401 when the token is missing or
/// unknown.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthUser);

fn bearer(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

async fn resolve<S: RemoteStore>(token: &str, state: &AppState<S>) -> Result<CurrentUser, ApiError> {
  let user = state
    .services
    .store()
    .user_for_token(token)
    .await
    .map_err(Error::remote)?
    .ok_or(ApiError::Unauthorized)?;
  tracing::debug!(user = %user.id, "request authenticated");
  Ok(CurrentUser(user))
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: RemoteStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, ApiError> {
    let token = bearer(parts).ok_or(ApiError::Unauthorized)?;
    resolve(token, state).await
  }
}

/// Anonymous when no `Authorization` header is sent; a header with a bad
/// token is still a 401.
impl<S> OptionalFromRequestParts<AppState<S>> for CurrentUser
where
  S: RemoteStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Option<Self>, ApiError> {
    if !parts.headers.contains_key(header::AUTHORIZATION) {
      return Ok(None);
    }
    let token = bearer(parts).ok_or(ApiError::Unauthorized)?;
    resolve(token, state).await.map(Some)
  }
}
