//! Events (videos, live sessions, articles) and their comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::devotional::Engagement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
  Video,
  Live,
  Article,
  Audio,
  #[serde(other)]
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
  pub id:          Uuid,
  pub title:       String,
  pub description: String,
  #[serde(rename = "type")]
  pub kind:        EventKind,
  pub media_url:   Option<String>,
  pub starts_at:   DateTime<Utc>,
  pub ends_at:     Option<DateTime<Utc>>,
  pub tags:        Vec<String>,
  pub creator_id:  Option<Uuid>,
  pub engagement:  Engagement,
  pub created_at:  DateTime<Utc>,
}

impl Event {
  pub fn has_tag(&self, tag: &str) -> bool {
    self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventComment {
  pub id:         Uuid,
  pub event_id:   Uuid,
  pub user_id:    Uuid,
  pub body:       String,
  pub created_at: DateTime<Utc>,
}
