//! Handlers for `/reading-plans` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/reading-plans` | Optional `?difficulty=beginner\|intermediate\|advanced` |
//! | `POST` | `/reading-plans` | Auth. Requires `title`, `description`, `duration` |
//! | `GET`  | `/reading-plans/{id}` | 404 if not found |
//! | `POST` | `/reading-plans/{id}/start` | Auth; idempotent |
//! | `POST` | `/reading-plans/{id}/days/{day}/complete` | Auth |
//! | `GET`  | `/me/reading-plans` | Auth; the caller's enrolments |

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use manna_core::{
  plan::{Difficulty, NewReadingPlan, PlanDay, ReadingPlan, UserReadingPlan},
  store::RemoteStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, CurrentUser, Envelope, created, error::ApiError, fetched, found, ok};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub difficulty: Option<Difficulty>,
}

/// `GET /reading-plans[?difficulty=<level>]`
pub async fn list<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Json<Envelope<Vec<ReadingPlan>>> {
  fetched(state.services.plans.list(params.difficulty).await)
}

/// `GET /reading-plans/{id}`
pub async fn get_one<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<ReadingPlan>>, ApiError> {
  found(
    &format!("reading plan {id} not found"),
    state.services.plans.get(id).await,
  )
}

/// `GET /me/reading-plans`
pub async fn mine<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Json<Envelope<Vec<UserReadingPlan>>> {
  fetched(state.services.plans.user_plans(user.id).await)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  pub title:       Option<String>,
  pub description: Option<String>,
  pub duration:    Option<u32>,
  #[serde(default)]
  pub difficulty:  Difficulty,
  #[serde(default, alias = "readings")]
  pub days:        Vec<PlanDay>,
}

impl From<CreateBody> for NewReadingPlan {
  fn from(b: CreateBody) -> Self {
    Self {
      title:         b.title.unwrap_or_default(),
      description:   b.description.unwrap_or_default(),
      duration_days: b.duration.unwrap_or_default(),
      difficulty:    b.difficulty,
      days:          b.days,
    }
  }
}

/// `POST /reading-plans`
pub async fn create<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let plan = state.services.plans.create(user.id, body.into()).await?;
  Ok(created(plan))
}

/// `POST /reading-plans/{id}/start`
pub async fn start<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<UserReadingPlan>>, ApiError> {
  Ok(ok(state.services.plans.start(user.id, id).await?))
}

/// `POST /reading-plans/{id}/days/{day}/complete`
pub async fn complete_day<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path((id, day)): Path<(Uuid, u32)>,
) -> Result<Json<Envelope<UserReadingPlan>>, ApiError> {
  Ok(ok(state.services.plans.complete_day(user.id, id, day).await?))
}
