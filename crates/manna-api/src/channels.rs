//! Handlers for `/channels` endpoints. Read-only.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use manna_core::{
  channel::{Channel, ChannelStatus},
  store::RemoteStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Envelope, error::ApiError, fetched, found};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:   Option<ChannelStatus>,
  pub category: Option<String>,
}

/// `GET /channels[?status=<status>][&category=<category>]`
pub async fn list<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Json<Envelope<Vec<Channel>>> {
  fetched(
    state
      .services
      .channels
      .list(params.status, params.category.as_deref())
      .await,
  )
}

/// `GET /channels/{id}`
pub async fn get_one<S: RemoteStore>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Channel>>, ApiError> {
  found(&format!("channel {id} not found"), state.services.channels.get(id).await)
}
