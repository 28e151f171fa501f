//! The CLI's TOML preferences file.
//!
//! One file holds the connection settings, the saved access token and the
//! theme. The theme key belongs to [`ThemeContext`], which rewrites it in
//! place; this module preserves whatever keys it does not own.
//!
//! [`ThemeContext`]: manna_services::context::ThemeContext

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default location: `$XDG_CONFIG_HOME/manna/config.toml`, falling back to
/// `~/.config/manna/config.toml`.
pub fn default_path() -> PathBuf {
  let base = std::env::var_os("XDG_CONFIG_HOME")
    .map(PathBuf::from)
    .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
    .unwrap_or_else(|| PathBuf::from("."));
  base.join("manna").join("config.toml")
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Prefs {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub anon_key:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub access_token: Option<String>,
  #[serde(flatten)]
  rest:             toml::Table,
}

impl Prefs {
  /// Read `path`; a missing file is empty preferences.
  pub fn load(path: &Path) -> Result<Self> {
    match std::fs::read_to_string(path) {
      Ok(raw) => toml::from_str(&raw).with_context(|| format!("parsing {}", path.display())),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
      Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
  }

  pub fn save(&self, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
      std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let raw = toml::to_string(self).context("encoding preferences")?;
    std::fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
  }
}
