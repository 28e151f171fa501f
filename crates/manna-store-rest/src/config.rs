//! Connection configuration and the two credential tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const ENV_URL: &str = "MANNA_REMOTE_URL";
pub const ENV_ANON_KEY: &str = "MANNA_ANON_KEY";
pub const ENV_SERVICE_KEY: &str = "MANNA_SERVICE_KEY";

fn non_empty_env(name: &'static str) -> Result<String> {
  std::env::var(name)
    .ok()
    .filter(|v| !v.trim().is_empty())
    .ok_or(Error::MissingEnv(name))
}

/// Base URL plus the restricted key. This is the only configuration shape
/// that may be handed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicClientConfig {
  pub url:      String,
  pub anon_key: String,
}

impl PublicClientConfig {
  pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self> {
    let url = url.into().trim_end_matches('/').to_owned();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
      return Err(Error::InvalidUrl(url));
    }
    let anon_key = anon_key.into();
    if anon_key.trim().is_empty() {
      return Err(Error::MissingEnv(ENV_ANON_KEY));
    }
    Ok(Self { url, anon_key })
  }

  /// Read `MANNA_REMOTE_URL` and `MANNA_ANON_KEY`. Either one missing is an
  /// error; callers treat it as fatal at startup.
  pub fn from_env() -> Result<Self> {
    Self::new(non_empty_env(ENV_URL)?, non_empty_env(ENV_ANON_KEY)?)
  }
}

/// The elevated, server-only key.
///
/// Not `Serialize`; `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ServiceKey(String);

impl ServiceKey {
  pub fn new(secret: impl Into<String>) -> Self { Self(secret.into()) }

  /// Read `MANNA_SERVICE_KEY`; `None` when unset.
  pub fn from_env() -> Option<Self> { non_empty_env(ENV_SERVICE_KEY).ok().map(Self) }

  pub(crate) fn expose(&self) -> &str { &self.0 }
}

impl fmt::Debug for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("ServiceKey(<redacted>)") }
}

impl fmt::Display for ServiceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("<redacted>") }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn service_key_never_prints() {
    let key = ServiceKey::new("super-secret");
    assert!(!format!("{key:?}").contains("super-secret"));
    assert!(!format!("{key}").contains("super-secret"));
  }

  #[test]
  fn public_config_normalises_url() {
    let cfg = PublicClientConfig::new("https://db.example.com/", "anon").unwrap();
    assert_eq!(cfg.url, "https://db.example.com");
  }

  #[test]
  fn public_config_rejects_bad_input() {
    assert!(matches!(
      PublicClientConfig::new("db.example.com", "anon"),
      Err(Error::InvalidUrl(_))
    ));
    assert!(matches!(
      PublicClientConfig::new("https://db.example.com", " "),
      Err(Error::MissingEnv(ENV_ANON_KEY))
    ));
  }
}
