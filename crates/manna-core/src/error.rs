//! Error types for `manna-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// The remote store rejected a call. The backend's own error is kept as
  /// the source so callers can inspect it.
  #[error("remote store error: {0}")]
  Remote(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("not authenticated")]
  Unauthenticated,

  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("missing required fields: {}", .0.join(", "))]
  MissingFields(Vec<&'static str>),

  #[error("invalid input: {0}")]
  Invalid(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("counter {column} on {table}/{id} kept changing under us")]
  Contention {
    table:  &'static str,
    column: &'static str,
    id:     Uuid,
  },

  #[error("malformed {table} row: {source}")]
  Decode {
    table:  &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid column name: {0:?}")]
  InvalidColumn(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a backend error, keeping it reachable through `source()`.
  pub fn remote<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Remote(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
