//! Friend requests and friendships.
//!
//! A request's `status` is its only mutable field. A [`Friendship`] row is
//! written once a request is accepted; it is symmetric, so lookups must check
//! both `(user_a, user_b)` orders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  Pending,
  Accepted,
  Rejected,
}

impl RequestStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      RequestStatus::Pending => "pending",
      RequestStatus::Accepted => "accepted",
      RequestStatus::Rejected => "rejected",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
  pub id:          Uuid,
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub status:      RequestStatus,
  pub message:     Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
  pub id:         Uuid,
  pub user_a:     Uuid,
  pub user_b:     Uuid,
  pub created_at: DateTime<Utc>,
}

impl Friendship {
  pub fn involves(&self, user: Uuid) -> bool { self.user_a == user || self.user_b == user }

  /// The other side of the friendship, if `me` is part of it.
  pub fn other(&self, me: Uuid) -> Option<Uuid> {
    if self.user_a == me {
      Some(self.user_b)
    } else if self.user_b == me {
      Some(self.user_a)
    } else {
      None
    }
  }
}
