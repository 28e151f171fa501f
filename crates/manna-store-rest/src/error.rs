//! Error type for `manna-store-rest`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing environment variable {0}")]
  MissingEnv(&'static str),

  #[error("invalid base url {0:?}")]
  InvalidUrl(String),

  #[error("core error: {0}")]
  Core(#[from] manna_core::Error),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The backend answered with a non-success status.
  #[error("{method} {path} → {status}: {body}")]
  Status {
    method: &'static str,
    path:   String,
    status: u16,
    body:   String,
  },

  #[error("unexpected response from {0}")]
  Shape(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
