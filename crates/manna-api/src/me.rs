//! The signed-in user's aggregate, points, achievements and referrals,
//! plus the two unauthenticated singletons (verse of the day, client
//! configuration).

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  response::IntoResponse,
};
use chrono::NaiveDate;
use manna_core::{
  Error,
  profile::{Achievement, DailyClaim},
  store::RemoteStore,
};
use manna_services::{context::UserData, verses};
use manna_store_rest::PublicClientConfig;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, CurrentUser, Envelope, created, day_or_today, error::ApiError, fetched, ok};

/// `GET /client-config`
///
/// The public URL and restricted key; the elevated key is never part of
/// [`AppState`].
pub async fn client_config<S: RemoteStore>(
  State(state): State<AppState<S>>,
) -> Result<Json<Envelope<PublicClientConfig>>, ApiError> {
  state
    .client
    .map(ok)
    .ok_or_else(|| ApiError::NotFound("no client configuration on this server".into()))
}

#[derive(Debug, Deserialize)]
pub struct DayParams {
  pub date: Option<NaiveDate>,
}

/// `GET /verse-of-the-day[?date=<date>]`
pub async fn verse_of_the_day(
  Query(params): Query<DayParams>,
) -> Result<Json<Envelope<verses::Verse>>, ApiError> {
  verses::verse_of_day(day_or_today(params.date))
    .map(ok)
    .ok_or_else(|| ApiError::NotFound("no verses bundled".into()))
}

/// `GET /me`
pub async fn me<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Json<Envelope<UserData>> {
  let services = &state.services;
  let (profile, achievements, unread) = tokio::join!(
    services.points.profile(user.id),
    services.points.achievements(user.id),
    services.notifications.unread_count(user.id),
  );
  let fallback = profile.is_fallback() || achievements.is_fallback() || unread.is_fallback();
  let profile = profile.into_inner();
  Json(Envelope {
    success: true,
    fallback,
    data: UserData {
      level: profile.level(),
      profile,
      achievements: achievements.into_inner(),
      unread: unread.into_inner(),
    },
  })
}

/// `POST /points/daily`
pub async fn claim_daily<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<DailyClaim>>, ApiError> {
  Ok(ok(state.services.points.claim_daily(user.id).await?))
}

/// `GET /achievements`
pub async fn achievements<S: RemoteStore>(
  State(state): State<AppState<S>>,
) -> Json<Envelope<Vec<Achievement>>> {
  fetched(state.services.points.catalog().await)
}

/// `POST /achievements/{key}/unlock`
///
/// `data.unlocked` is `false` when the caller already had it.
pub async fn unlock_achievement<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Path(key): Path<String>,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let points = &state.services.points;
  let known = points.catalog().await.into_inner();
  let Some(achievement) = known.into_iter().find(|a| a.key == key) else {
    return Err(ApiError::NotFound(format!("achievement {key:?} not found")));
  };
  let unlocked = points.unlock_achievement(user.id, &key).await?;
  Ok(ok(json!({ "key": achievement.key, "unlocked": unlocked })))
}

/// `POST /referrals/code`
pub async fn referral_code<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Envelope<Value>>, ApiError> {
  let code = state.services.referrals.create_code(user.id).await?;
  Ok(ok(json!({ "code": code })))
}

#[derive(Debug, Default, Deserialize)]
pub struct SignupBody {
  pub code: Option<String>,
}

/// `POST /referrals/signup`
pub async fn referral_signup<S: RemoteStore>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  body: Result<Json<SignupBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(body) = body?;
  let code = body
    .code
    .filter(|c| !c.trim().is_empty())
    .ok_or_else(|| Error::MissingFields(vec!["code"]))?;
  let referral = state
    .services
    .referrals
    .record_signup(&code, user.id)
    .await?;
  Ok(created(referral))
}
