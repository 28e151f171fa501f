//! Referral codes linking a new user to the user who invited them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points granted to the referrer when a referral completes.
pub const REFERRAL_POINTS: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
  Pending,
  Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
  pub id:           Uuid,
  pub referrer_id:  Uuid,
  pub referred_id:  Option<Uuid>,
  pub code:         String,
  pub status:       ReferralStatus,
  pub created_at:   DateTime<Utc>,
  pub completed_at: Option<DateTime<Utc>>,
}
