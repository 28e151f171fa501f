//! Fallback-on-read, throw-on-write.
//!
//! Reads that fail are logged and answered from a bundled seed dataset, so
//! views never see a failed read. Writes that fail are logged and returned to
//! the caller unchanged; a write is never reported as successful unless the
//! remote store accepted it.

use std::{fmt::Display, future::Future};

use serde::Serialize;

use crate::Error;

/// The outcome of a read: either what the remote store returned, or the
/// bundled dataset served in its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "data", rename_all = "lowercase")]
pub enum Fetched<T> {
  Live(T),
  Fallback(T),
}

impl<T> Fetched<T> {
  pub fn into_inner(self) -> T {
    match self {
      Fetched::Live(v) | Fetched::Fallback(v) => v,
    }
  }

  pub fn as_inner(&self) -> &T {
    match self {
      Fetched::Live(v) | Fetched::Fallback(v) => v,
    }
  }

  pub fn is_fallback(&self) -> bool { matches!(self, Fetched::Fallback(_)) }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
    match self {
      Fetched::Live(v) => Fetched::Live(f(v)),
      Fetched::Fallback(v) => Fetched::Fallback(f(v)),
    }
  }
}

/// Run `call`; on error, log it and return `fallback()` instead.
///
/// `entity` names the dataset in the log line.
pub async fn fetch_with_fallback<T, E, Fut, F>(
  entity: &'static str,
  call: Fut,
  fallback: F,
) -> Fetched<T>
where
  Fut: Future<Output = Result<T, E>>,
  E: Display,
  F: FnOnce() -> T,
{
  match call.await {
    Ok(value) => Fetched::Live(value),
    Err(e) => {
      tracing::warn!(entity, error = %e, "remote read failed; serving fallback dataset");
      Fetched::Fallback(fallback())
    }
  }
}

/// Log a failed write and hand it back to the caller.
pub fn write_failed(entity: &'static str, err: Error) -> Error {
  tracing::error!(entity, error = %err, "remote write failed");
  err
}
