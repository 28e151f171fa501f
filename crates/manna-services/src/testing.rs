//! Test doubles shared by the service tests.

use std::sync::Arc;

use manna_core::store::{AuthUser, Query, RemoteStore, Row};
use manna_store_sqlite::SqliteStore;
use serde_json::Value;
use tokio::sync::Semaphore;
use uuid::Uuid;

pub async fn sqlite() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A user id that is stable across a test.
pub fn user(n: u128) -> Uuid { Uuid::from_u128(0xabc0_0000 + n) }

pub fn auth(n: u128) -> AuthUser {
  AuthUser {
    id:    user(n),
    email: Some(format!("user{n}@example.com")),
  }
}

// ─── FailingStore ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("backend offline")]
pub struct Offline;

/// A store where every call fails.
pub struct FailingStore;

impl RemoteStore for FailingStore {
  type Error = Offline;

  async fn select(&self, _: &str, _: &Query) -> Result<Vec<Row>, Offline> { Err(Offline) }

  async fn insert(&self, _: &str, _: Row) -> Result<Row, Offline> { Err(Offline) }

  async fn update(&self, _: &str, _: &Query, _: Row) -> Result<Vec<Row>, Offline> { Err(Offline) }

  async fn delete(&self, _: &str, _: &Query) -> Result<Vec<Row>, Offline> { Err(Offline) }

  async fn rpc(&self, _: &str, _: Value) -> Result<Value, Offline> { Err(Offline) }

  async fn user_for_token(&self, _: &str) -> Result<Option<AuthUser>, Offline> { Err(Offline) }
}

/// Assert that `err` is a remote error whose source is [`Offline`].
pub fn assert_offline(err: &manna_core::Error) {
  use std::error::Error as _;
  assert!(
    matches!(err, manna_core::Error::Remote(_)),
    "expected a remote error, got {err:?}"
  );
  assert!(
    err.source().is_some_and(|s| s.is::<Offline>()),
    "source should be the backend error"
  );
}

// ─── GatedStore ──────────────────────────────────────────────────────────────

/// Wraps a [`SqliteStore`]; every `select` waits for a permit on `gate`.
pub struct GatedStore {
  pub inner: SqliteStore,
  pub gate:  Arc<Semaphore>,
}

impl RemoteStore for GatedStore {
  type Error = manna_store_sqlite::Error;

  async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, Self::Error> {
    let _permit = self.gate.acquire().await;
    self.inner.select(table, query).await
  }

  async fn insert(&self, table: &str, row: Row) -> Result<Row, Self::Error> {
    self.inner.insert(table, row).await
  }

  async fn update(&self, table: &str, query: &Query, patch: Row) -> Result<Vec<Row>, Self::Error> {
    self.inner.update(table, query, patch).await
  }

  async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Row>, Self::Error> {
    self.inner.delete(table, query).await
  }

  async fn rpc(&self, name: &str, args: Value) -> Result<Value, Self::Error> {
    self.inner.rpc(name, args).await
  }

  async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, Self::Error> {
    self.inner.user_for_token(token).await
  }
}
