//! Optimistic counter updates.
//!
//! A counter is read, then written back with a filter on its old value. If
//! another writer got there first the filter matches nothing and the bump is
//! retried against the fresh value.

use manna_core::{
  Error, Result,
  store::{Query, RemoteStore, Row},
};
use serde_json::{Value, json};
use uuid::Uuid;

const MAX_ATTEMPTS: usize = 5;

/// Add `delta` to `column` of row `id` in `table` and return the new value.
/// The result never drops below zero.
pub(crate) async fn bump<S: RemoteStore>(
  store: &S,
  table: &'static str,
  column: &'static str,
  id: Uuid,
  delta: i64,
) -> Result<u32> {
  for attempt in 0..MAX_ATTEMPTS {
    let row = store
      .select(table, &Query::by_id(id))
      .await
      .map_err(Error::remote)?
      .pop()
      .ok_or(Error::NotFound { entity: table, id })?;

    let old = row.get(column).cloned().unwrap_or(Value::Null);
    let current = old.as_i64().unwrap_or(0);
    let next = current.saturating_add(delta).max(0);
    if next == current && !old.is_null() {
      return Ok(clamp(next));
    }

    let guard = match old {
      Value::Null => Query::by_id(id).is_null(column),
      value => Query::by_id(id).eq(column, value),
    };
    let mut patch = Row::new();
    patch.insert(column.to_owned(), json!(next));

    let written = store
      .update(table, &guard, patch)
      .await
      .map_err(Error::remote)?;
    if !written.is_empty() {
      return Ok(clamp(next));
    }
    tracing::debug!(table, column, %id, attempt, "counter moved underneath us; retrying");
  }
  Err(Error::Contention { table, column, id })
}

fn clamp(n: i64) -> u32 { u32::try_from(n).unwrap_or(u32::MAX) }
