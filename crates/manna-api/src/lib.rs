//! JSON REST API for Manna.
//!
//! Exposes an axum [`Router`] backed by any [`RemoteStore`]. Successful
//! responses are wrapped as `{"success": true, "data": ...}`; reads served
//! from the bundled datasets add `"fallback": true`. Auth is a bearer token
//! resolved by the store; TLS and transport are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", manna_api::api_router(AppState::new(store.clone())))
//! ```

pub mod auth;
pub mod channels;
pub mod devotionals;
pub mod error;
pub mod events;
pub mod me;
pub mod plans;
pub mod social;

use std::sync::Arc;

use axum::{
  Json, Router,
  http::StatusCode,
  routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use manna_core::{Fetched, store::RemoteStore};
use manna_services::Services;
use manna_store_rest::PublicClientConfig;
use serde::Serialize;

pub use auth::CurrentUser;
pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub services: Services<S>,
  /// Handed to clients by `GET /client-config`. Only ever the public tier.
  pub client:   Option<PublicClientConfig>,
}

impl<S: RemoteStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      services: Services::new(store),
      client:   None,
    }
  }

  pub fn with_client_config(mut self, client: PublicClientConfig) -> Self {
    self.client = Some(client);
    self
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      services: self.services.clone(),
      client:   self.client.clone(),
    }
  }
}

// ─── Envelope ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success:  bool,
  pub data:     T,
  #[serde(skip_serializing_if = "std::ops::Not::not")]
  pub fallback: bool,
}

pub(crate) fn ok<T>(data: T) -> Json<Envelope<T>> {
  Json(Envelope {
    success: true,
    data,
    fallback: false,
  })
}

pub(crate) fn created<T>(data: T) -> (StatusCode, Json<Envelope<T>>) { (StatusCode::CREATED, ok(data)) }

pub(crate) fn fetched<T>(f: Fetched<T>) -> Json<Envelope<T>> {
  let fallback = f.is_fallback();
  Json(Envelope {
    success: true,
    data: f.into_inner(),
    fallback,
  })
}

/// Like [`fetched`], but an absent value is a 404.
pub(crate) fn found<T>(
  what: &str,
  f: Fetched<Option<T>>,
) -> Result<Json<Envelope<T>>, ApiError> {
  let fallback = f.is_fallback();
  let data = f
    .into_inner()
    .ok_or_else(|| ApiError::NotFound(what.to_owned()))?;
  Ok(Json(Envelope {
    success: true,
    data,
    fallback,
  }))
}

/// `date`, or today in UTC.
pub(crate) fn day_or_today(date: Option<NaiveDate>) -> NaiveDate {
  date.unwrap_or_else(|| Utc::now().date_naive())
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: RemoteStore + 'static,
{
  Router::new()
    .route("/client-config", get(me::client_config::<S>))
    .route("/verse-of-the-day", get(me::verse_of_the_day))
    // Devotionals
    .route("/devotionals", get(devotionals::list::<S>).post(devotionals::create::<S>))
    .route("/devotionals/today", get(devotionals::today::<S>))
    .route(
      "/devotionals/{id}",
      get(devotionals::get_one::<S>)
        .patch(devotionals::update::<S>)
        .delete(devotionals::remove::<S>),
    )
    .route("/devotionals/{id}/like", post(devotionals::like::<S>))
    .route("/devotionals/{id}/share", post(devotionals::share::<S>))
    // Reading plans
    .route("/reading-plans", get(plans::list::<S>).post(plans::create::<S>))
    .route("/reading-plans/{id}", get(plans::get_one::<S>))
    .route("/reading-plans/{id}/start", post(plans::start::<S>))
    .route("/reading-plans/{id}/days/{day}/complete", post(plans::complete_day::<S>))
    // Events
    .route("/events", get(events::list::<S>))
    .route("/events/{id}", get(events::get_one::<S>))
    .route("/events/{id}/like", post(events::like::<S>).delete(events::unlike::<S>))
    .route(
      "/events/{id}/comments",
      get(events::comments::<S>).post(events::add_comment::<S>),
    )
    // Channels
    .route("/channels", get(channels::list::<S>))
    .route("/channels/{id}", get(channels::get_one::<S>))
    // Friends and notifications
    .route("/friends", get(social::friends::<S>))
    .route(
      "/friend-requests",
      get(social::requests::<S>).post(social::send_request::<S>),
    )
    .route("/friend-requests/{id}/accept", post(social::accept::<S>))
    .route("/friend-requests/{id}/reject", post(social::reject::<S>))
    .route("/notifications", get(social::notifications::<S>))
    .route("/notifications/read-all", post(social::mark_all_read::<S>))
    .route("/notifications/{id}/read", post(social::mark_read::<S>))
    // The signed-in user
    .route("/me", get(me::me::<S>))
    .route("/me/reading-plans", get(plans::mine::<S>))
    .route("/me/devotionals", get(devotionals::mine::<S>))
    .route("/achievements", get(me::achievements::<S>))
    .route("/achievements/{key}/unlock", post(me::unlock_achievement::<S>))
    .route("/points/daily", post(me::claim_daily::<S>))
    .route("/referrals/code", post(me::referral_code::<S>))
    .route("/referrals/signup", post(me::referral_signup::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
