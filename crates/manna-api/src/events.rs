//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Optional `?tag=` |
//! | `GET`    | `/events/{id}` | 404 if not found |
//! | `POST`   | `/events/{id}/like` | Auth; one like per user |
//! | `DELETE` | `/events/{id}/like` | Auth |
//! | `GET`    | `/events/{id}/comments` | Oldest first |
//! | `POST`   | `/events/{id}/comments` | Auth. Body: `{"content":"..."}` |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use manna_core::{
  event::{Event, EventComment},
  store::RemoteStore,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, CurrentUser, Envelope, created, error::ApiError, fetched, found, ok};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub tag: Option<String>,
}

/// `GET /events[?tag=<tag>]`
pub async fn list<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Json<Envelope<Vec<Event>>> {
  fetched(state.services.events.list(params.tag.as_deref()).await)
}

/// `GET /events/{id}`
pub async fn get_one<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Event>>, ApiError> {
  found(&format!("event {id} not found"), state.services.events.get(id).await)
}

/// `POST /events/{id}/like`
pub async fn like<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let likes = state.services.events.like(id, user.id).await?;
  Ok(ok(json!({ "likes": likes })))
}

/// `DELETE /events/{id}/like`
pub async fn unlike<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let likes = state.services.events.unlike(id, user.id).await?;
  Ok(ok(json!({ "likes": likes })))
}

/// `GET /events/{id}/comments`
pub async fn comments<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Json<Envelope<Vec<EventComment>>> {
  fetched(state.services.events.comments(id).await)
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentBody {
  #[serde(default, alias = "body")]
  pub content: String,
}

/// `POST /events/{id}/comments`
pub async fn add_comment<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  body: Result<Json<CommentBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let comment = state
    .services
    .events
    .add_comment(id, user.id, &body.content)
    .await?;
  Ok(created(comment))
}
