//! Handlers for friends, friend requests and notifications. All require a
//! session.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/friends` | Friendships involving the caller |
//! | `GET`  | `/friend-requests` | `{incoming, outgoing}`, pending only |
//! | `POST` | `/friend-requests` | Body: `{"receiver_id":"...","message":"..."}` |
//! | `POST` | `/friend-requests/{id}/accept` | Receiver only |
//! | `POST` | `/friend-requests/{id}/reject` | Receiver only |
//! | `GET`  | `/notifications` | Optional `?unread_only=true` |
//! | `POST` | `/notifications/{id}/read` | |
//! | `POST` | `/notifications/read-all` | |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use manna_core::{
  Error,
  notification::Notification,
  social::{FriendRequest, Friendship},
  store::RemoteStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{AppState, CurrentUser, Envelope, created, error::ApiError, fetched, ok};

// ─── Friends ─────────────────────────────────────────────────────────────────

/// `GET /friends`
pub async fn friends<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Json<Envelope<Vec<Friendship>>> {
  fetched(state.services.friends.friends(user.id).await)
}

#[derive(Debug, Serialize)]
pub struct Requests {
  pub incoming: Vec<FriendRequest>,
  pub outgoing: Vec<FriendRequest>,
}

/// `GET /friend-requests`
pub async fn requests<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Json<Envelope<Requests>> {
  let friends = &state.services.friends;
  let (incoming, outgoing) = tokio::join!(friends.incoming(user.id), friends.outgoing(user.id));
  Json(Envelope {
    success:  true,
    fallback: incoming.is_fallback() || outgoing.is_fallback(),
    data:     Requests {
      incoming: incoming.into_inner(),
      outgoing: outgoing.into_inner(),
    },
  })
}

#[derive(Debug, Default, Deserialize)]
pub struct SendBody {
  pub receiver_id: Option<Uuid>,
  pub message:     Option<String>,
}

/// `POST /friend-requests`
pub async fn send_request<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<SendBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let receiver = body
    .receiver_id
    .ok_or_else(|| Error::MissingFields(vec!["receiver_id"]))?;
  let request = state
    .services
    .friends
    .send_request(user.id, receiver, body.message)
    .await?;
  Ok(created(request))
}

/// `POST /friend-requests/{id}/accept`
pub async fn accept<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Friendship>>, ApiError> {
  Ok(ok(state.services.friends.accept(id, user.id).await?))
}

/// `POST /friend-requests/{id}/reject`
pub async fn reject<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<FriendRequest>>, ApiError> {
  Ok(ok(state.services.friends.reject(id, user.id).await?))
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NotificationParams {
  #[serde(default)]
  pub unread_only: bool,
}

/// `GET /notifications[?unread_only=true]`
pub async fn notifications<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<NotificationParams>,
) -> Json<Envelope<Vec<Notification>>> {
  fetched(
    state
      .services
      .notifications
      .list(user.id, params.unread_only)
      .await,
  )
}

/// `POST /notifications/{id}/read`
pub async fn mark_read<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Notification>>, ApiError> {
  Ok(ok(state.services.notifications.mark_read(id, user.id).await?))
}

/// `POST /notifications/read-all`
pub async fn mark_all_read<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let updated = state.services.notifications.mark_all_read(user.id).await?;
  Ok(ok(json!({ "updated": updated })))
}
