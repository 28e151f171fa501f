//! Devotionals: public feed, authoring, engagement and the devotional of the
//! day.

use chrono::{NaiveDate, Utc};
use manna_core::{
  Error, Fetched, Result,
  daily::pick_for_day,
  devotional::{Devotional, DevotionalPatch, Engagement, NewDevotional},
  fallback::write_failed,
  fetch_with_fallback,
  store::{Query, RemoteStore, Row},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  counter, failed_write,
  rows::{self, DEVOTIONALS, DevotionalRow},
  seed, service,
};

const ENTITY: &str = "devotionals";

service!(
  /// Reads and writes the `devotionals` table.
  DevotionalService
);

fn bundled(id: Uuid) -> Option<Devotional> { seed::DEVOTIONALS.iter().find(|d| d.id == id).cloned() }

impl<S: RemoteStore> DevotionalService<S> {
  async fn select(&self, query: &Query) -> Result<Vec<Devotional>> {
    let rows = self
      .store
      .select(DEVOTIONALS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<DevotionalRow, _>(DEVOTIONALS, rows)
  }

  /// Load one devotional for a write path. Failures are not masked.
  async fn load(&self, id: Uuid) -> Result<Devotional> {
    self
      .select(&Query::by_id(id))
      .await
      .map_err(|e| match e {
        Error::Remote(_) => write_failed(ENTITY, e),
        other => other,
      })?
      .pop()
      .ok_or(Error::NotFound { entity: ENTITY, id })
  }

  /// Load a devotional `viewer` may read; anything else is not found.
  async fn load_visible(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Devotional> {
    let dev = self.load(id).await?;
    if !dev.is_visible_to(viewer) {
      return Err(Error::NotFound { entity: ENTITY, id });
    }
    Ok(dev)
  }

  async fn load_owned(&self, id: Uuid, owner: Uuid) -> Result<Devotional> {
    let dev = self.load(id).await?;
    if !dev.is_owned_by(owner) {
      return Err(Error::Forbidden(format!("devotional {id} belongs to another user")));
    }
    Ok(dev)
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  /// Public devotionals, newest first.
  pub async fn list_public(&self, limit: Option<usize>) -> Fetched<Vec<Devotional>> {
    let mut query = Query::new().eq("is_public", true).order_by("created_at", true);
    if let Some(n) = limit {
      query = query.limit(n);
    }
    fetch_with_fallback(ENTITY, self.select(&query), || seed::DEVOTIONALS.clone()).await
  }

  /// Everything `author` has written, private entries included.
  pub async fn list_by_author(&self, author: Uuid) -> Fetched<Vec<Devotional>> {
    let query = Query::new()
      .eq("user_id", author)
      .order_by("created_at", true);
    fetch_with_fallback(ENTITY, self.select(&query), Vec::new).await
  }

  /// One devotional, if it exists and `viewer` may read it.
  pub async fn get(&self, id: Uuid, viewer: Option<Uuid>) -> Fetched<Option<Devotional>> {
    let query = Query::by_id(id);
    fetch_with_fallback(ENTITY, self.select(&query), || bundled(id).into_iter().collect())
      .await
      .map(|found| found.into_iter().find(|d| d.is_visible_to(viewer)))
  }

  /// The devotional every reader sees on `date`.
  ///
  /// Picks from the public devotionals in creation order. When the remote
  /// store holds none, the bundled set is used.
  pub async fn devotional_of_day(&self, date: NaiveDate) -> Fetched<Option<Devotional>> {
    let query = Query::new().eq("is_public", true).order_by("created_at", false);
    let fetched = fetch_with_fallback(ENTITY, self.select(&query), || seed::DEVOTIONALS.clone()).await;
    match fetched {
      Fetched::Live(list) if list.is_empty() => {
        Fetched::Fallback(pick_for_day(date, &seed::DEVOTIONALS).cloned())
      }
      other => other.map(|list| pick_for_day(date, &list).cloned()),
    }
  }

  // ─── Writes ───────────────────────────────────────────────────────────────

  /// Create a devotional owned by `author`. Blank required fields are
  /// rejected before anything is written.
  pub async fn create(&self, author: Uuid, draft: NewDevotional) -> Result<Devotional> {
    draft.validate()?;

    let dev = Devotional {
      id:          Uuid::new_v4(),
      author_id:   Some(author),
      author_name: None,
      title:       draft.title.trim().to_owned(),
      verse:       draft.verse,
      content:     draft.content,
      prayer:      draft.prayer,
      application: draft.application,
      reflection:  draft.reflection,
      visibility:  draft.visibility,
      engagement:  Engagement::default(),
      tags:        draft.tags,
      created_at:  Utc::now(),
      updated_at:  None,
    };
    let row = rows::encode(&DevotionalRow::from(&dev))?;
    let stored = self
      .store
      .insert(DEVOTIONALS, row)
      .await
      .map_err(failed_write(ENTITY))?;

    tracing::info!(id = %dev.id, %author, "devotional created");
    Ok(rows::decode::<DevotionalRow>(DEVOTIONALS, stored)?.into())
  }

  /// Apply `patch` to a devotional owned by `owner`.
  pub async fn update(&self, id: Uuid, owner: Uuid, patch: DevotionalPatch) -> Result<Devotional> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
      return Err(Error::MissingFields(vec!["title"]));
    }
    self.load_owned(id, owner).await?;

    let mut row = Row::new();
    let text_fields = [
      ("title", patch.title),
      ("content", patch.content),
      ("prayer", patch.prayer),
      ("application", patch.application),
      ("reflection", patch.reflection),
    ];
    for (column, value) in text_fields {
      if let Some(v) = value {
        row.insert(column.to_owned(), json!(v));
      }
    }
    if let Some(v) = patch.visibility {
      row.insert("is_public".to_owned(), json!(v.is_public()));
    }
    row.insert("updated_at".to_owned(), json!(Utc::now()));

    let query = Query::by_id(id).eq("user_id", owner);
    let updated = self
      .store
      .update(DEVOTIONALS, &query, row)
      .await
      .map_err(failed_write(ENTITY))?
      .pop()
      .ok_or(Error::NotFound { entity: ENTITY, id })?;
    Ok(rows::decode::<DevotionalRow>(DEVOTIONALS, updated)?.into())
  }

  /// Delete a devotional owned by `owner`.
  pub async fn delete(&self, id: Uuid, owner: Uuid) -> Result<()> {
    self.load_owned(id, owner).await?;
    let query = Query::by_id(id).eq("user_id", owner);
    let removed = self
      .store
      .delete(DEVOTIONALS, &query)
      .await
      .map_err(failed_write(ENTITY))?;
    if removed.is_empty() {
      return Err(Error::NotFound { entity: ENTITY, id });
    }
    tracing::info!(%id, "devotional deleted");
    Ok(())
  }

  async fn bump(&self, id: Uuid, viewer: Option<Uuid>, column: &'static str) -> Result<u32> {
    self.load_visible(id, viewer).await?;
    counter::bump(&*self.store, DEVOTIONALS, column, id, 1)
      .await
      .map_err(|e| write_failed(ENTITY, e))
  }

  /// Increment the like counter; returns the new count. Devotionals `user`
  /// cannot read are not found.
  pub async fn like(&self, id: Uuid, user: Uuid) -> Result<u32> { self.bump(id, Some(user), "likes").await }

  pub async fn share(&self, id: Uuid, user: Uuid) -> Result<u32> { self.bump(id, Some(user), "shares").await }

  pub async fn record_view(&self, id: Uuid, viewer: Option<Uuid>) -> Result<u32> {
    self.bump(id, viewer, "views").await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use manna_core::devotional::{Scripture, Visibility};

  use super::*;
  use crate::testing::{self, FailingStore, assert_offline, user};

  fn draft(title: &str) -> NewDevotional {
    NewDevotional {
      title:       title.into(),
      verse:       Scripture {
        reference: "John 3:16".into(),
        text:      "For God so loved the world".into(),
      },
      content:     "Reflection".into(),
      prayer:      None,
      application: None,
      reflection:  None,
      visibility:  Visibility::Public,
      tags:        vec![],
    }
  }

  async fn live() -> DevotionalService<manna_store_sqlite::SqliteStore> {
    DevotionalService::new(Arc::new(testing::sqlite().await))
  }

  #[tokio::test]
  async fn create_then_read_back() {
    let svc = live().await;
    let created = svc.create(user(1), draft("Morning")).await.unwrap();

    assert_eq!(created.author_id, Some(user(1)));
    assert_eq!(created.verse.reference, "John 3:16");

    let got = svc.get(created.id, None).await;
    assert!(!got.is_fallback());
    assert_eq!(got.into_inner(), Some(created));
  }

  #[tokio::test]
  async fn blank_required_fields_persist_nothing() {
    let svc = live().await;
    let mut d = draft("T");
    d.verse.text = " ".into();

    let err = svc.create(user(1), d).await.unwrap_err();
    assert!(matches!(err, Error::MissingFields(ref f) if f == &vec!["verse_text"]));

    let all = svc.store.select(DEVOTIONALS, &Query::new()).await.unwrap();
    assert!(all.is_empty());
  }

  #[tokio::test]
  async fn private_devotionals_only_reach_their_author() {
    let svc = live().await;
    let mut d = draft("Secret");
    d.visibility = Visibility::Private;
    let created = svc.create(user(1), d).await.unwrap();

    assert!(svc.get(created.id, Some(user(1))).await.into_inner().is_some());
    assert!(svc.get(created.id, Some(user(2))).await.into_inner().is_none());
    assert!(svc.get(created.id, None).await.into_inner().is_none());

    let feed = svc.list_public(None).await.into_inner();
    assert!(feed.iter().all(|d| d.id != created.id));
    assert_eq!(svc.list_by_author(user(1)).await.into_inner().len(), 1);
  }

  #[tokio::test]
  async fn only_the_owner_may_edit_or_delete() {
    let svc = live().await;
    let created = svc.create(user(1), draft("Mine")).await.unwrap();

    let patch = DevotionalPatch {
      title: Some("Edited".into()),
      ..Default::default()
    };
    let err = svc.update(created.id, user(2), patch.clone()).await.unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));

    let updated = svc.update(created.id, user(1), patch).await.unwrap();
    assert_eq!(updated.title, "Edited");
    assert!(updated.updated_at.is_some());
    assert_eq!(updated.verse, created.verse);

    assert!(matches!(
      svc.delete(created.id, user(2)).await,
      Err(Error::Forbidden(_))
    ));
    svc.delete(created.id, user(1)).await.unwrap();
    assert!(matches!(
      svc.delete(created.id, user(1)).await,
      Err(Error::NotFound { .. })
    ));
  }

  #[tokio::test]
  async fn engagement_counters_accumulate() {
    let svc = live().await;
    let created = svc.create(user(1), draft("Liked")).await.unwrap();

    svc.like(created.id, user(2)).await.unwrap();
    assert_eq!(svc.like(created.id, user(3)).await.unwrap(), 2);
    assert_eq!(svc.record_view(created.id, None).await.unwrap(), 1);

    let got = svc.get(created.id, None).await.into_inner().unwrap();
    assert_eq!(got.engagement.likes, 2);
    assert_eq!(got.engagement.views, 1);
    assert_eq!(got.engagement.shares, 0);
  }

  #[tokio::test]
  async fn strangers_cannot_engage_with_private_devotionals() {
    let svc = live().await;
    let mut d = draft("Secret");
    d.visibility = Visibility::Private;
    let created = svc.create(user(1), d).await.unwrap();

    assert!(matches!(
      svc.like(created.id, user(2)).await,
      Err(Error::NotFound { .. })
    ));
    assert!(matches!(
      svc.share(created.id, user(2)).await,
      Err(Error::NotFound { .. })
    ));
    assert!(matches!(
      svc.record_view(created.id, None).await,
      Err(Error::NotFound { .. })
    ));
    assert_eq!(svc.like(created.id, user(1)).await.unwrap(), 1);

    let got = svc.get(created.id, Some(user(1))).await.into_inner().unwrap();
    assert_eq!(got.engagement.likes, 1);
    assert_eq!(got.engagement.shares, 0);
    assert_eq!(got.engagement.views, 0);
  }

  #[tokio::test]
  async fn null_columns_in_live_rows_read_as_defaults() {
    let svc = live().await;
    let created = svc.create(user(1), draft("Sparse")).await.unwrap();
    let mut patch = Row::new();
    patch.insert("views".into(), serde_json::Value::Null);
    patch.insert("tags".into(), serde_json::Value::Null);
    svc.store.update(DEVOTIONALS, &Query::by_id(created.id), patch).await.unwrap();

    let feed = svc.list_public(None).await;
    assert!(!feed.is_fallback());
    let feed = feed.into_inner();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].engagement.views, 0);
    assert!(feed[0].tags.is_empty());
  }

  #[tokio::test]
  async fn devotional_of_day_is_stable_for_a_date() {
    let svc = live().await;
    for n in 0..3 {
      svc.create(user(1), draft(&format!("D{n}"))).await.unwrap();
    }
    let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();

    let a = svc.devotional_of_day(date).await;
    let b = svc.devotional_of_day(date).await;
    assert!(!a.is_fallback());
    assert_eq!(a, b);
  }

  #[tokio::test]
  async fn empty_store_picks_from_bundled_set() {
    let svc = live().await;
    let date = NaiveDate::from_ymd_opt(2024, 5, 17).unwrap();
    let got = svc.devotional_of_day(date).await;
    assert!(got.is_fallback());
    assert_eq!(
      got.into_inner().as_ref(),
      pick_for_day(date, &seed::DEVOTIONALS)
    );
  }

  // ─── Offline backend ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn failed_reads_serve_bundled_dataset() {
    let svc = DevotionalService::new(Arc::new(FailingStore));

    let feed = svc.list_public(Some(2)).await;
    assert_eq!(feed, Fetched::Fallback(seed::DEVOTIONALS.clone()));

    let known = seed::DEVOTIONALS[0].id;
    assert_eq!(
      svc.get(known, None).await,
      Fetched::Fallback(Some(seed::DEVOTIONALS[0].clone()))
    );
    assert_eq!(svc.get(Uuid::new_v4(), None).await, Fetched::Fallback(None));

    assert_eq!(svc.list_by_author(user(1)).await, Fetched::Fallback(vec![]));
  }

  #[tokio::test]
  async fn failed_writes_surface_the_backend_error() {
    let svc = DevotionalService::new(Arc::new(FailingStore));

    assert_offline(&svc.create(user(1), draft("T")).await.unwrap_err());
    assert_offline(&svc.like(Uuid::new_v4(), user(1)).await.unwrap_err());
    assert_offline(&svc.delete(Uuid::new_v4(), user(1)).await.unwrap_err());
  }
}
