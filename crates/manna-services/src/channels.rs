//! Broadcast channels. Read-only.

use manna_core::{
  Error, Fetched, Result,
  channel::{Channel, ChannelStatus},
  fetch_with_fallback,
  store::{Query, RemoteStore},
};
use uuid::Uuid;

use crate::{
  rows::{self, CHANNELS, ChannelRow},
  seed, service,
};

service!(
  /// Reads the `channels` table.
  ChannelService
);

impl<S: RemoteStore> ChannelService<S> {
  async fn select(&self, query: &Query) -> Result<Vec<Channel>> {
    let rows = self
      .store
      .select(CHANNELS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<ChannelRow, _>(CHANNELS, rows)
  }

  pub async fn list(
    &self,
    status: Option<ChannelStatus>,
    category: Option<&str>,
  ) -> Fetched<Vec<Channel>> {
    let mut query = Query::new().order_by("start_time", false);
    if let Some(s) = status {
      query = query.eq("status", s);
    }
    if let Some(c) = category {
      query = query.eq("category", c);
    }
    fetch_with_fallback(CHANNELS, self.select(&query), || seed::CHANNELS.clone()).await
  }

  pub async fn get(&self, id: Uuid) -> Fetched<Option<Channel>> {
    fetch_with_fallback(
      CHANNELS,
      async { Ok::<_, Error>(self.select(&Query::by_id(id)).await?.pop()) },
      || seed::CHANNELS.iter().find(|c| c.id == id).cloned(),
    )
    .await
  }
}
