//! In-app notifications.

use chrono::Utc;
use manna_core::{
  Error, Fetched, Result, fetch_with_fallback,
  notification::{NewNotification, Notification},
  store::{Query, RemoteStore, Row},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  failed_write,
  rows::{self, NOTIFICATIONS, NotificationRow},
  service,
};

service!(
  /// Reads and writes the `notifications` table.
  NotificationService
);

fn read_patch() -> Row {
  let mut patch = Row::new();
  patch.insert("read".into(), json!(true));
  patch
}

impl<S: RemoteStore> NotificationService<S> {
  async fn select(&self, query: &Query) -> Result<Vec<Notification>> {
    let rows = self
      .store
      .select(NOTIFICATIONS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<NotificationRow, _>(NOTIFICATIONS, rows)
  }

  /// `user`'s notifications, newest first.
  pub async fn list(&self, user: Uuid, unread_only: bool) -> Fetched<Vec<Notification>> {
    let mut query = Query::new().eq("user_id", user);
    if unread_only {
      query = query.eq("read", false);
    }
    let query = query.order_by("created_at", true);
    fetch_with_fallback(NOTIFICATIONS, self.select(&query), Vec::new).await
  }

  pub async fn unread_count(&self, user: Uuid) -> Fetched<usize> {
    self.list(user, true).await.map(|list| list.len())
  }

  pub async fn create(&self, new: NewNotification) -> Result<Notification> {
    let row = rows::encode(&NotificationRow {
      id:         Uuid::new_v4(),
      user_id:    new.user_id,
      kind:       new.kind,
      title:      new.title,
      message:    new.message,
      data:       new.data,
      read:       false,
      created_at: Utc::now(),
    })?;
    let stored = self
      .store
      .insert(NOTIFICATIONS, row)
      .await
      .map_err(failed_write(NOTIFICATIONS))?;
    Ok(rows::decode::<NotificationRow>(NOTIFICATIONS, stored)?.into())
  }

  /// Create a notification as a side effect of another write. Failures are
  /// logged and dropped.
  pub(crate) async fn notify(&self, new: NewNotification) {
    let (user, kind) = (new.user_id, new.kind);
    if let Err(e) = self.create(new).await {
      tracing::warn!(%user, ?kind, error = %e, "notification not delivered");
    }
  }

  pub async fn mark_read(&self, id: Uuid, user: Uuid) -> Result<Notification> {
    let query = Query::by_id(id).eq("user_id", user);
    let row = self
      .store
      .update(NOTIFICATIONS, &query, read_patch())
      .await
      .map_err(failed_write(NOTIFICATIONS))?
      .pop()
      .ok_or(Error::NotFound {
        entity: NOTIFICATIONS,
        id,
      })?;
    Ok(rows::decode::<NotificationRow>(NOTIFICATIONS, row)?.into())
  }

  /// Mark everything of `user`'s read; returns how many changed.
  pub async fn mark_all_read(&self, user: Uuid) -> Result<usize> {
    let query = Query::new().eq("user_id", user).eq("read", false);
    let changed = self
      .store
      .update(NOTIFICATIONS, &query, read_patch())
      .await
      .map_err(failed_write(NOTIFICATIONS))?;
    Ok(changed.len())
  }
}
