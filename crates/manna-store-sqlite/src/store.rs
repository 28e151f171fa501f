//! [`SqliteStore`], the SQLite implementation of [`RemoteStore`].

use std::path::Path;

use chrono::Utc;
use manna_core::store::{AuthUser, Query, RemoteStore, Row, validate_identifier};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{Compiled, compile_select, decode_row, encode_row, merge},
  schema::SCHEMA,
};

/// Convert a store error raised inside a connection closure.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

/// Run a compiled select on a raw connection.
fn select_raw(
  conn: &rusqlite::Connection,
  compiled: &Compiled,
) -> rusqlite::Result<Vec<(i64, String)>> {
  let mut stmt = conn.prepare(&compiled.sql)?;
  stmt
    .query_map(rusqlite::params_from_iter(compiled.params.iter()), |r| {
      Ok((r.get(0)?, r.get(1)?))
    })?
    .collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Manna backend stored in a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) async fn select_rows(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    let compiled = compile_select(table, query)?;
    let raws = self
      .conn
      .call(move |conn| Ok(select_raw(conn, &compiled)?))
      .await?;
    raws.iter().map(|(_, data)| decode_row(data)).collect()
  }

  pub(crate) async fn insert_row(&self, table: &str, mut row: Row) -> Result<Row> {
    validate_identifier(table)?;

    let id = match row.get("id").and_then(Value::as_str) {
      Some(id) => id.to_owned(),
      None => {
        let id = Uuid::new_v4().to_string();
        row.insert("id".into(), Value::String(id.clone()));
        id
      }
    };
    if !row.contains_key("created_at") {
      row.insert("created_at".into(), serde_json::to_value(Utc::now())?);
    }

    let data = encode_row(&row)?;
    let tbl = table.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO records (tbl, id, data) VALUES (?1, ?2, ?3)",
          rusqlite::params![tbl, id, data],
        )?;
        Ok(())
      })
      .await?;
    Ok(row)
  }

  /// Read-merge-write every matching row inside one transaction.
  pub(crate) async fn update_rows(&self, table: &str, query: &Query, patch: Row) -> Result<Vec<Row>> {
    let compiled = compile_select(table, query)?;
    let rows = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raws = select_raw(&tx, &compiled)?;
        let mut updated = Vec::with_capacity(raws.len());
        for (rowid, data) in raws {
          let mut row = decode_row(&data).map_err(other)?;
          // The primary key never changes through a patch.
          let id = row.get("id").cloned();
          merge(&mut row, &patch);
          if let Some(id) = id {
            row.insert("id".into(), id);
          }
          tx.execute(
            "UPDATE records SET data = ?1 WHERE rowid = ?2",
            rusqlite::params![encode_row(&row).map_err(other)?, rowid],
          )?;
          updated.push(row);
        }
        tx.commit()?;
        Ok(updated)
      })
      .await?;
    Ok(rows)
  }

  async fn delete_rows(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    let compiled = compile_select(table, query)?;
    let raws = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raws = select_raw(&tx, &compiled)?;
        for (rowid, _) in &raws {
          tx.execute("DELETE FROM records WHERE rowid = ?1", [rowid])?;
        }
        tx.commit()?;
        Ok(raws)
      })
      .await?;
    raws.iter().map(|(_, data)| decode_row(data)).collect()
  }
}

// ─── RemoteStore impl ────────────────────────────────────────────────────────

impl RemoteStore for SqliteStore {
  type Error = Error;

  async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    tracing::debug!(table, "sqlite select");
    self.select_rows(table, query).await
  }

  async fn insert(&self, table: &str, row: Row) -> Result<Row> {
    tracing::debug!(table, "sqlite insert");
    self.insert_row(table, row).await
  }

  async fn update(&self, table: &str, query: &Query, patch: Row) -> Result<Vec<Row>> {
    tracing::debug!(table, "sqlite update");
    self.update_rows(table, query, patch).await
  }

  async fn delete(&self, table: &str, query: &Query) -> Result<Vec<Row>> {
    tracing::debug!(table, "sqlite delete");
    self.delete_rows(table, query).await
  }

  async fn rpc(&self, name: &str, args: Value) -> Result<Value> {
    tracing::debug!(procedure = name, "sqlite rpc");
    self.call_procedure(name, args).await
  }

  async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>> {
    self.lookup_session(token).await
  }
}
