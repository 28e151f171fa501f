//! Process-wide state holders.
//!
//! Each context owns a [`tokio::sync::watch`] channel; views subscribe to
//! it and re-render on change. Contexts are constructed explicitly and
//! passed to whatever needs them.

pub mod auth;
pub mod theme;
pub mod user_data;

pub use auth::{AuthContext, Session};
pub use theme::{Theme, ThemeContext};
pub use user_data::{UserData, UserDataContext};

use manna_core::Fetched;
use serde::Serialize;

/// Lifecycle of one fetch published by a context.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum LoadState<T> {
  /// Nothing requested yet, or the subject (e.g. the signed-in user) went
  /// away.
  Idle,
  Loading,
  Ready(T),
  /// At least one part of the value came from the bundled datasets.
  Fallback(T),
}

impl<T> LoadState<T> {
  pub fn value(&self) -> Option<&T> {
    match self {
      LoadState::Ready(v) | LoadState::Fallback(v) => Some(v),
      LoadState::Idle | LoadState::Loading => None,
    }
  }

  pub fn is_loading(&self) -> bool { matches!(self, LoadState::Loading) }
}

impl<T> From<Fetched<T>> for LoadState<T> {
  fn from(f: Fetched<T>) -> Self {
    match f {
      Fetched::Live(v) => LoadState::Ready(v),
      Fetched::Fallback(v) => LoadState::Fallback(v),
    }
  }
}
