//! Reading plans and per-user progress against them.
//!
//! A [`ReadingPlan`] is a template. A [`UserReadingPlan`] records how far one
//! user has got through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

/// One day's reading inside a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDay {
  pub day:        u32,
  pub title:      String,
  pub passages:   Vec<String>,
  #[serde(default)]
  pub devotional: Option<String>,
  #[serde(default)]
  pub completed:  bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingPlan {
  pub id:            Uuid,
  pub author_id:     Option<Uuid>,
  pub title:         String,
  pub description:   String,
  pub duration_days: u32,
  pub difficulty:    Difficulty,
  /// Ordered by `day`.
  pub days:          Vec<PlanDay>,
  pub participants:  u32,
  pub rating:        f32,
  pub created_at:    DateTime<Utc>,
}

impl ReadingPlan {
  /// A copy of this plan with the first `completed_days` days marked done.
  pub fn with_progress(&self, completed_days: u32) -> ReadingPlan {
    let mut plan = self.clone();
    for d in &mut plan.days {
      d.completed = d.day <= completed_days;
    }
    plan
  }
}

/// Input for creating a reading plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReadingPlan {
  pub title:         String,
  pub description:   String,
  pub duration_days: u32,
  #[serde(default)]
  pub difficulty:    Difficulty,
  #[serde(default)]
  pub days:          Vec<PlanDay>,
}

impl NewReadingPlan {
  pub fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if self.title.trim().is_empty() {
      missing.push("title");
    }
    if self.description.trim().is_empty() {
      missing.push("description");
    }
    if self.duration_days == 0 {
      missing.push("duration");
    }
    missing
  }

  pub fn validate(&self) -> Result<()> {
    let missing = self.missing_fields();
    if !missing.is_empty() {
      return Err(Error::MissingFields(missing));
    }
    if let Some(d) = self
      .days
      .iter()
      .find(|d| d.day == 0 || d.day > self.duration_days)
    {
      return Err(Error::Invalid(format!(
        "day {} is outside 1..={}",
        d.day, self.duration_days
      )));
    }
    Ok(())
  }
}

/// A user's enrolment in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserReadingPlan {
  pub id:             Uuid,
  pub user_id:        Uuid,
  pub plan_id:        Uuid,
  pub completed_days: u32,
  pub started_at:     DateTime<Utc>,
  pub completed_at:   Option<DateTime<Utc>>,
}

impl UserReadingPlan {
  /// Fraction of the plan completed, in `0.0..=1.0`.
  pub fn progress(&self, duration_days: u32) -> f32 {
    if duration_days == 0 {
      return 0.0;
    }
    (self.completed_days.min(duration_days) as f32) / duration_days as f32
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(n: u32) -> PlanDay {
    PlanDay {
      day:        n,
      title:      format!("Day {n}"),
      passages:   vec![format!("Psalm {n}")],
      devotional: None,
      completed:  false,
    }
  }

  #[test]
  fn zero_duration_is_missing() {
    let p = NewReadingPlan {
      title:         "Psalms".into(),
      description:   "A month in the psalms".into(),
      duration_days: 0,
      difficulty:    Difficulty::Beginner,
      days:          vec![],
    };
    assert_eq!(p.missing_fields(), vec!["duration"]);
  }

  #[test]
  fn days_beyond_duration_are_rejected() {
    let p = NewReadingPlan {
      title:         "Psalms".into(),
      description:   "d".into(),
      duration_days: 2,
      difficulty:    Difficulty::Beginner,
      days:          vec![day(1), day(3)],
    };
    assert!(matches!(p.validate(), Err(Error::Invalid(_))));
  }

  #[test]
  fn progress_marks_prefix_of_days() {
    let plan = ReadingPlan {
      id:            Uuid::nil(),
      author_id:     None,
      title:         "t".into(),
      description:   "d".into(),
      duration_days: 3,
      difficulty:    Difficulty::Beginner,
      days:          vec![day(1), day(2), day(3)],
      participants:  0,
      rating:        0.0,
      created_at:    Utc::now(),
    };
    let marked = plan.with_progress(2);
    let flags: Vec<bool> = marked.days.iter().map(|d| d.completed).collect();
    assert_eq!(flags, vec![true, true, false]);
  }

  #[test]
  fn progress_fraction_is_clamped() {
    let up = UserReadingPlan {
      id:             Uuid::nil(),
      user_id:        Uuid::nil(),
      plan_id:        Uuid::nil(),
      completed_days: 9,
      started_at:     Utc::now(),
      completed_at:   None,
    };
    assert_eq!(up.progress(3), 1.0);
    assert_eq!(up.progress(0), 0.0);
  }
}
