//! Error type for `manna-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] manna_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("rows must be JSON objects")]
  NotAnObject,

  #[error("unknown procedure: {0}")]
  UnknownProcedure(String),

  #[error("bad arguments for {procedure}: {reason}")]
  BadArguments {
    procedure: &'static str,
    reason:    String,
  },

  /// A conditional write lost to a concurrent writer too many times.
  #[error("write contention on {0}")]
  Contention(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
