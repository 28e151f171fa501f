//! Points, levels, streaks and achievements.
//!
//! Awarding is done by remote procedures; these are the shapes read back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const POINTS_PER_LEVEL: u32 = 100;

/// Points granted by the daily login procedure.
pub const DAILY_LOGIN_POINTS: u32 = 10;

pub fn level_for_points(points: u32) -> u32 { 1 + points / POINTS_PER_LEVEL }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub user_id:             Uuid,
  pub display_name:        Option<String>,
  pub points:              u32,
  pub streak:              u32,
  pub last_login_bonus_on: Option<NaiveDate>,
}

impl Profile {
  /// The profile shown before anything has been recorded for `user_id`.
  pub fn empty(user_id: Uuid) -> Self {
    Self {
      user_id,
      display_name: None,
      points: 0,
      streak: 0,
      last_login_bonus_on: None,
    }
  }

  pub fn level(&self) -> u32 { level_for_points(self.points) }

  /// Points still needed to reach the next level.
  pub fn points_to_next_level(&self) -> u32 {
    POINTS_PER_LEVEL - self.points % POINTS_PER_LEVEL
  }
}

/// An entry in the achievement catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
  pub key:         String,
  pub title:       String,
  pub description: String,
  pub points:      u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
  #[serde(flatten)]
  pub achievement: Achievement,
  pub unlocked_at: DateTime<Utc>,
}

/// Result of the daily login procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyClaim {
  /// `false` if the bonus was already claimed today.
  pub awarded:        bool,
  pub points_awarded: u32,
  pub total_points:   u32,
  pub streak:         u32,
}
