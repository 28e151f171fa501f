//! Server-side procedures, implemented natively for the local backend.
//!
//! | Name | Arguments | Result |
//! |------|-----------|--------|
//! | `award_daily_login_points` | `{user_id}` | [`DailyClaim`] |
//! | `award_points` | `{user_id, amount, reason}` | `{total_points}` |
//! | `unlock_achievement` | `{user_id, achievement_key}` | `{unlocked, points_awarded}` |
//!
//! Point balances are updated with a conditional write on the previous
//! balance, so two concurrent awards never overwrite each other.

use chrono::{NaiveDate, Utc};
use manna_core::{
  profile::{DAILY_LOGIN_POINTS, DailyClaim},
  store::{Query, Row},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, Result, SqliteStore};

const MAX_ATTEMPTS: usize = 5;

fn object(v: Value) -> Row {
  match v {
    Value::Object(m) => m,
    _ => Row::new(),
  }
}

fn arg_uuid(procedure: &'static str, args: &Value, key: &str) -> Result<Uuid> {
  let raw = args
    .get(key)
    .and_then(Value::as_str)
    .ok_or_else(|| Error::BadArguments {
      procedure,
      reason: format!("missing {key}"),
    })?;
  Ok(Uuid::parse_str(raw)?)
}

fn arg_str<'a>(procedure: &'static str, args: &'a Value, key: &str) -> Result<&'a str> {
  args
    .get(key)
    .and_then(Value::as_str)
    .ok_or_else(|| Error::BadArguments {
      procedure,
      reason: format!("missing {key}"),
    })
}

fn u32_field(row: &Row, key: &str) -> u32 {
  row
    .get(key)
    .and_then(Value::as_u64)
    .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX))
}

impl SqliteStore {
  pub(crate) async fn call_procedure(&self, name: &str, args: Value) -> Result<Value> {
    match name {
      "award_daily_login_points" => self.award_daily_login_points(&args).await,
      "award_points" => self.award_points(&args).await,
      "unlock_achievement" => self.unlock_achievement(&args).await,
      other => Err(Error::UnknownProcedure(other.to_owned())),
    }
  }

  async fn load_or_create_profile(&self, user: Uuid) -> Result<Row> {
    let query = Query::by_id(user);
    if let Some(row) = self.select_rows("profiles", &query).await?.pop() {
      return Ok(row);
    }
    let fresh = object(json!({
      "id": user,
      "display_name": null,
      "points": 0,
      "streak": 0,
      "last_login_bonus_on": null,
    }));
    match self.insert_row("profiles", fresh).await {
      Ok(row) => Ok(row),
      // Lost a race with another creator; use theirs.
      Err(e) => self.select_rows("profiles", &query).await?.pop().ok_or(e),
    }
  }

  async fn notify(
    &self,
    user: Uuid,
    kind: &str,
    title: &str,
    message: String,
    data: Value,
  ) -> Result<()> {
    let row = object(json!({
      "user_id": user,
      "type": kind,
      "title": title,
      "message": message,
      "data": data,
      "read": false,
    }));
    self.insert_row("notifications", row).await?;
    Ok(())
  }

  /// Add `amount` to the user's balance; returns the new balance.
  async fn add_points(&self, user: Uuid, amount: u32) -> Result<u32> {
    for _ in 0..MAX_ATTEMPTS {
      let profile = self.load_or_create_profile(user).await?;
      let points = u32_field(&profile, "points");
      let total = points.saturating_add(amount);
      let guard = Query::by_id(user).eq("points", points);
      let patch = object(json!({ "points": total }));
      if !self.update_rows("profiles", &guard, patch).await?.is_empty() {
        return Ok(total);
      }
    }
    Err(Error::Contention("profiles"))
  }

  async fn award_daily_login_points(&self, args: &Value) -> Result<Value> {
    const PROC: &str = "award_daily_login_points";
    let user = arg_uuid(PROC, args, "user_id")?;
    let today = Utc::now().date_naive();

    for _ in 0..MAX_ATTEMPTS {
      let profile = self.load_or_create_profile(user).await?;
      let points = u32_field(&profile, "points");
      let streak = u32_field(&profile, "streak");
      let last_raw = profile
        .get("last_login_bonus_on")
        .and_then(Value::as_str)
        .map(str::to_owned);
      let last: Option<NaiveDate> = last_raw.as_deref().and_then(|s| s.parse().ok());

      if last == Some(today) {
        return Ok(serde_json::to_value(DailyClaim {
          awarded: false,
          points_awarded: 0,
          total_points: points,
          streak,
        })?);
      }

      let streak = if last.and_then(|d| d.succ_opt()) == Some(today) {
        streak + 1
      } else {
        1
      };
      let total = points.saturating_add(DAILY_LOGIN_POINTS);

      let guard = Query::by_id(user).eq("points", points);
      let guard = match &last_raw {
        Some(s) => guard.eq("last_login_bonus_on", s),
        None => guard.is_null("last_login_bonus_on"),
      };
      let patch = object(json!({
        "points": total,
        "streak": streak,
        "last_login_bonus_on": today.to_string(),
      }));
      if self.update_rows("profiles", &guard, patch).await?.is_empty() {
        continue;
      }

      self
        .notify(
          user,
          "points_awarded",
          "Daily bonus",
          format!("You earned {DAILY_LOGIN_POINTS} points for showing up today."),
          json!({ "points": DAILY_LOGIN_POINTS, "reason": "daily_login" }),
        )
        .await?;

      return Ok(serde_json::to_value(DailyClaim {
        awarded: true,
        points_awarded: DAILY_LOGIN_POINTS,
        total_points: total,
        streak,
      })?);
    }
    Err(Error::Contention("profiles"))
  }

  async fn award_points(&self, args: &Value) -> Result<Value> {
    const PROC: &str = "award_points";
    let user = arg_uuid(PROC, args, "user_id")?;
    let reason = arg_str(PROC, args, "reason")?.to_owned();
    let amount = args
      .get("amount")
      .and_then(Value::as_u64)
      .and_then(|a| u32::try_from(a).ok())
      .filter(|a| *a > 0)
      .ok_or_else(|| Error::BadArguments {
        procedure: PROC,
        reason:    "amount must be a positive integer".into(),
      })?;

    let total = self.add_points(user, amount).await?;
    self
      .notify(
        user,
        "points_awarded",
        "Points awarded",
        format!("You earned {amount} points."),
        json!({ "points": amount, "reason": reason }),
      )
      .await?;
    Ok(json!({ "total_points": total }))
  }

  async fn unlock_achievement(&self, args: &Value) -> Result<Value> {
    const PROC: &str = "unlock_achievement";
    let user = arg_uuid(PROC, args, "user_id")?;
    let key = arg_str(PROC, args, "achievement_key")?.to_owned();

    let achievement = self
      .select_rows("achievements", &Query::new().eq("key", &key))
      .await?
      .pop()
      .ok_or_else(|| Error::BadArguments {
        procedure: PROC,
        reason:    format!("unknown achievement {key:?}"),
      })?;

    let already = Query::new().eq("user_id", user).eq("achievement_key", &key);
    if !self.select_rows("user_achievements", &already).await?.is_empty() {
      return Ok(json!({ "unlocked": false, "points_awarded": 0 }));
    }

    let points = u32_field(&achievement, "points");
    let title = achievement
      .get("title")
      .and_then(Value::as_str)
      .unwrap_or(&key)
      .to_owned();
    self
      .insert_row(
        "user_achievements",
        object(json!({
          "user_id": user,
          "achievement_key": key,
          "achievement_id": achievement.get("id"),
          "unlocked_at": Utc::now(),
        })),
      )
      .await?;

    if points > 0 {
      self.add_points(user, points).await?;
    }
    self
      .notify(
        user,
        "achievement_unlocked",
        "Achievement unlocked",
        format!("You unlocked \"{title}\"."),
        json!({ "achievement_key": key, "points": points }),
      )
      .await?;

    Ok(json!({ "unlocked": true, "points_awarded": points }))
  }
}
