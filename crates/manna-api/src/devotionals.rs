//! Handlers for `/devotionals` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/devotionals` | Public only, newest first; `?limit=` |
//! | `POST`   | `/devotionals` | Auth. Requires `title`, `verse`, `verse_text`, `content` |
//! | `GET`    | `/devotionals/today` | `?date=YYYY-MM-DD`, default today (UTC) |
//! | `GET`    | `/devotionals/{id}` | Private ones only for their author |
//! | `PATCH`  | `/devotionals/{id}` | Author only |
//! | `DELETE` | `/devotionals/{id}` | Author only |
//! | `POST`   | `/devotionals/{id}/like` | Auth |
//! | `POST`   | `/devotionals/{id}/share` | Auth |
//! | `GET`    | `/me/devotionals` | Auth. The caller's own, private included |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use chrono::NaiveDate;
use manna_core::{
  Fetched,
  devotional::{Devotional, DevotionalPatch, NewDevotional, Scripture, Visibility},
  store::RemoteStore,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AppState, CurrentUser, Envelope, created, day_or_today, error::ApiError, fetched, found, ok,
};

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /devotionals[?limit=<n>]`
pub async fn list<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Json<Envelope<Vec<Devotional>>> {
  fetched(state.services.devotionals.list_public(params.limit).await)
}

#[derive(Debug, Deserialize)]
pub struct DayParams {
  pub date: Option<NaiveDate>,
}

/// `GET /devotionals/today[?date=<date>]`
pub async fn today<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<DayParams>,
) -> Result<Json<Envelope<Devotional>>, ApiError> {
  let date = day_or_today(params.date);
  found(
    "no devotional available",
    state.services.devotionals.devotional_of_day(date).await,
  )
}

/// `GET /devotionals/{id}`
///
/// A live read also counts a view; failing to count it does not fail the
/// read.
pub async fn get_one<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  viewer: Option<CurrentUser>,
) -> Result<Json<Envelope<Devotional>>, ApiError> {
  let viewer = viewer.map(|CurrentUser(u)| u.id);
  let devotionals = &state.services.devotionals;
  let fetched = devotionals.get(id, viewer).await;
  if matches!(fetched, Fetched::Live(Some(_)))
    && let Err(e) = devotionals.record_view(id, viewer).await
  {
    tracing::warn!(%id, error = %e, "could not record devotional view");
  }
  found(&format!("devotional {id} not found"), fetched)
}

/// `GET /me/devotionals`
pub async fn mine<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Json<Envelope<Vec<Devotional>>> {
  fetched(state.services.devotionals.list_by_author(user.id).await)
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// Request body for `POST /devotionals`, in remote-column spelling.
///
/// Every field is optional at the JSON level so that absent required fields
/// are reported together as a 400 rather than rejected one at a time.
#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  pub title:       Option<String>,
  pub verse:       Option<String>,
  pub verse_text:  Option<String>,
  pub content:     Option<String>,
  pub prayer:      Option<String>,
  pub application: Option<String>,
  pub reflection:  Option<String>,
  #[serde(default)]
  pub is_public:   bool,
  #[serde(default)]
  pub tags:        Vec<String>,
}

impl From<CreateBody> for NewDevotional {
  fn from(b: CreateBody) -> Self {
    Self {
      title:       b.title.unwrap_or_default(),
      verse:       Scripture {
        reference: b.verse.unwrap_or_default(),
        text:      b.verse_text.unwrap_or_default(),
      },
      content:     b.content.unwrap_or_default(),
      prayer:      b.prayer,
      application: b.application,
      reflection:  b.reflection,
      visibility:  Visibility::from_public_flag(b.is_public),
      tags:        b.tags,
    }
  }
}

/// `POST /devotionals`
pub async fn create<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let devotional = state.services.devotionals.create(user.id, body.into()).await?;
  Ok(created(devotional))
}

/// `PATCH /devotionals/{id}`
pub async fn update<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
  body: Result<Json<DevotionalPatch>, JsonRejection>,
) -> Result<Json<Envelope<Devotional>>, ApiError> {
  let Json(patch) = body?;
  Ok(ok(state.services.devotionals.update(id, user.id, patch).await?))
}

/// `DELETE /devotionals/{id}`
pub async fn remove<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
  state.services.devotionals.delete(id, user.id).await?;
  Ok(ok(json!({ "id": id })))
}

/// `POST /devotionals/{id}/like`
pub async fn like<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
  let likes = state.services.devotionals.like(id, user.id).await?;
  Ok(ok(json!({ "likes": likes })))
}

/// `POST /devotionals/{id}/share`
pub async fn share<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<serde_json::Value>>, ApiError> {
  let shares = state.services.devotionals.share(id, user.id).await?;
  Ok(ok(json!({ "shares": shares })))
}
