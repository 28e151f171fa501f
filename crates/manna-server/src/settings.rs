//! Server configuration: `config.toml` layered under `MANNA_*` variables.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  /// The hosted backend, reached with the credentials in the environment.
  Rest,
  /// A local SQLite file.
  Sqlite,
}

/// Runtime server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub backend:    Backend,
  pub store_path: PathBuf,
}

impl ServerConfig {
  fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
    Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8787)?
      .set_default("backend", "sqlite")?
      .set_default("store_path", "~/.local/share/manna/manna.db")
  }

  /// Read `path` (optional) and then the environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::builder()?
      .add_source(File::from(path).required(false))
      .add_source(Environment::with_prefix("MANNA"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~` expanded.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
