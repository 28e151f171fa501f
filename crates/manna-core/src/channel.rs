//! Broadcast channels. Purely descriptive; there is no client write path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelStatus {
  Live,
  Upcoming,
  Recorded,
  Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
  pub id:            Uuid,
  pub name:          String,
  pub description:   String,
  pub status:        ChannelStatus,
  pub category:      String,
  pub starts_at:     Option<DateTime<Utc>>,
  pub thumbnail_url: Option<String>,
  pub viewers:       u32,
}
