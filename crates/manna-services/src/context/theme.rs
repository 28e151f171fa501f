//! Theme preference, persisted to a TOML file.
//!
//! The file may hold other settings; keys this module does not own are
//! preserved when the theme is written back.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  Light,
  Dark,
  #[default]
  System,
}

impl Theme {
  /// Light and dark swap; `System` becomes light.
  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark | Theme::System => Theme::Light,
    }
  }
}

#[derive(Debug, Error)]
pub enum PersistError {
  #[error("preferences I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("preferences file is not valid TOML: {0}")]
  Corrupt(#[from] toml::de::Error),
  #[error("could not encode preferences: {0}")]
  Encode(#[from] toml::ser::Error),
}

const THEME_KEY: &str = "theme";

/// The whole preferences file as a table; a missing file is empty.
async fn read_table(path: &Path) -> Result<toml::Table, PersistError> {
  match tokio::fs::read_to_string(path).await {
    Ok(raw) => Ok(raw.parse::<toml::Table>()?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(toml::Table::new()),
    Err(e) => Err(e.into()),
  }
}

fn theme_in(table: &toml::Table) -> Option<Theme> {
  table.get(THEME_KEY)?.clone().try_into().ok()
}

async fn read_theme(path: &Path) -> Theme {
  match read_table(path).await {
    Ok(table) => theme_in(&table).unwrap_or_else(|| {
      if table.contains_key(THEME_KEY) {
        tracing::warn!(path = %path.display(), "unrecognised theme; using default");
      }
      Theme::default()
    }),
    Err(e) => {
      tracing::warn!(path = %path.display(), error = %e, "cannot read preferences; using defaults");
      Theme::default()
    }
  }
}

/// Holds the current [`Theme`] and writes every change to disk.
pub struct ThemeContext {
  path: PathBuf,
  tx:   watch::Sender<Theme>,
}

impl ThemeContext {
  /// Load the preference stored at `path`. A missing or unreadable file
  /// yields the default theme.
  pub async fn load(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let (tx, _) = watch::channel(read_theme(&path).await);
    Self { path, tx }
  }

  pub fn current(&self) -> Theme { *self.tx.borrow() }

  pub fn subscribe(&self) -> watch::Receiver<Theme> { self.tx.subscribe() }

  /// Publish `theme` and persist it.
  ///
  /// Only the `theme` key is rewritten. A file that is not valid TOML is
  /// left alone and reported as [`PersistError::Corrupt`]. Subscribers see
  /// the new theme even if writing the file fails.
  pub async fn set(&self, theme: Theme) -> Result<(), PersistError> {
    self.tx.send_replace(theme);

    let mut table = read_table(&self.path).await?;
    table.insert(THEME_KEY.to_owned(), toml::Value::try_from(theme)?);
    let encoded = toml::to_string(&table)?;
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&self.path, encoded).await?;
    tracing::debug!(?theme, path = %self.path.display(), "theme saved");
    Ok(())
  }

  pub async fn toggle(&self) -> Result<Theme, PersistError> {
    let next = self.current().toggled();
    self.set(next).await?;
    Ok(next)
  }
}
