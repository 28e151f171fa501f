//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  FriendRequest,
  FriendAccepted,
  PointsAwarded,
  PointsSpent,
  AchievementUnlocked,
  PostLike,
  PostComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub id:         Uuid,
  pub user_id:    Uuid,
  #[serde(rename = "type")]
  pub kind:       NotificationKind,
  pub title:      String,
  pub message:    String,
  /// Opaque payload interpreted by the view that renders the notification.
  pub data:       Value,
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNotification {
  pub user_id: Uuid,
  #[serde(rename = "type")]
  pub kind:    NotificationKind,
  pub title:   String,
  pub message: String,
  #[serde(default)]
  pub data:    Value,
}
