//! Events, their likes and their comments.

use chrono::Utc;
use manna_core::{
  Error, Fetched, Result,
  event::{Event, EventComment},
  fallback::write_failed,
  fetch_with_fallback,
  store::{Query, RemoteStore},
};
use uuid::Uuid;

use crate::{
  counter, failed_write,
  rows::{self, EVENT_COMMENTS, EVENT_LIKES, EVENTS, EventCommentRow, EventLikeRow, EventRow},
  seed, service,
};

const ENTITY: &str = "events";

service!(
  /// `events` plus the per-user `event_likes` and `event_comments` tables.
  EventService
);

impl<S: RemoteStore> EventService<S> {
  async fn select(&self, query: &Query) -> Result<Vec<Event>> {
    let rows = self
      .store
      .select(EVENTS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<EventRow, _>(EVENTS, rows)
  }

  async fn likes(&self, event: Uuid) -> Result<u32> {
    self
      .select(&Query::by_id(event))
      .await
      .map_err(|e| write_failed(ENTITY, e))?
      .pop()
      .map(|e| e.engagement.likes)
      .ok_or(Error::NotFound { entity: ENTITY, id: event })
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  /// Events by start time, optionally only those carrying `tag`.
  pub async fn list(&self, tag: Option<&str>) -> Fetched<Vec<Event>> {
    let query = Query::new().order_by("start_time", false);
    let call = async {
      let mut events = self.select(&query).await?;
      if let Some(tag) = tag {
        events.retain(|e| e.has_tag(tag));
      }
      Ok::<_, Error>(events)
    };
    fetch_with_fallback(ENTITY, call, || seed::EVENTS.clone()).await
  }

  pub async fn get(&self, id: Uuid) -> Fetched<Option<Event>> {
    fetch_with_fallback(
      ENTITY,
      async { Ok::<_, Error>(self.select(&Query::by_id(id)).await?.pop()) },
      || seed::EVENTS.iter().find(|e| e.id == id).cloned(),
    )
    .await
  }

  /// Comments on `event`, oldest first.
  pub async fn comments(&self, event: Uuid) -> Fetched<Vec<EventComment>> {
    let call = async {
      let rows = self
        .store
        .select(
          EVENT_COMMENTS,
          &Query::new().eq("event_id", event).order_by("created_at", false),
        )
        .await
        .map_err(Error::remote)?;
      rows::decode_all::<EventCommentRow, _>(EVENT_COMMENTS, rows)
    };
    fetch_with_fallback(EVENT_COMMENTS, call, Vec::new).await
  }

  // ─── Writes ───────────────────────────────────────────────────────────────

  /// Like `event` as `user`. Each user counts once; returns the like count.
  pub async fn like(&self, event: Uuid, user: Uuid) -> Result<u32> {
    let mine = Query::new().eq("event_id", event).eq("user_id", user);
    let existing = self
      .store
      .select(EVENT_LIKES, &mine)
      .await
      .map_err(failed_write(EVENT_LIKES))?;
    if !existing.is_empty() {
      return self.likes(event).await;
    }
    // Fail before recording a like against a missing event.
    self.likes(event).await?;

    let row = rows::encode(&EventLikeRow {
      id: Uuid::new_v4(),
      event_id: event,
      user_id: user,
      created_at: Utc::now(),
    })?;
    self
      .store
      .insert(EVENT_LIKES, row)
      .await
      .map_err(failed_write(EVENT_LIKES))?;
    counter::bump(&*self.store, EVENTS, "likes", event, 1)
      .await
      .map_err(|e| write_failed(ENTITY, e))
  }

  /// Withdraw `user`'s like; returns the like count.
  pub async fn unlike(&self, event: Uuid, user: Uuid) -> Result<u32> {
    let mine = Query::new().eq("event_id", event).eq("user_id", user);
    let removed = self
      .store
      .delete(EVENT_LIKES, &mine)
      .await
      .map_err(failed_write(EVENT_LIKES))?;
    if removed.is_empty() {
      return self.likes(event).await;
    }
    counter::bump(&*self.store, EVENTS, "likes", event, -1)
      .await
      .map_err(|e| write_failed(ENTITY, e))
  }

  pub async fn add_comment(&self, event: Uuid, user: Uuid, body: &str) -> Result<EventComment> {
    let body = body.trim();
    if body.is_empty() {
      return Err(Error::MissingFields(vec!["content"]));
    }
    self.likes(event).await?;

    let row = rows::encode(&EventCommentRow {
      id:         Uuid::new_v4(),
      event_id:   event,
      user_id:    user,
      content:    body.to_owned(),
      created_at: Utc::now(),
    })?;
    let stored = self
      .store
      .insert(EVENT_COMMENTS, row)
      .await
      .map_err(failed_write(EVENT_COMMENTS))?;

    // The comment stands even if the count lags behind.
    if let Err(e) = counter::bump(&*self.store, EVENTS, "comments", event, 1).await {
      tracing::warn!(%event, error = %e, "failed to update comment count");
    }
    Ok(rows::decode::<EventCommentRow>(EVENT_COMMENTS, stored)?.into())
  }
}
