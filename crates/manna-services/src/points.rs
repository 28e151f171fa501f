//! Points, streaks and achievements.
//!
//! Balances are only changed by remote procedures; this service reads the
//! results and invokes the procedures by name.

use std::collections::HashMap;

use manna_core::{
  Error, Fetched, Result,
  fallback::write_failed,
  fetch_with_fallback,
  profile::{Achievement, DailyClaim, Profile, UnlockedAchievement},
  store::{Query, RemoteStore},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  failed_write,
  rows::{self, ACHIEVEMENTS, AchievementRow, PROFILES, ProfileRow, USER_ACHIEVEMENTS, UserAchievementRow},
  seed, service,
};

pub const DAILY_LOGIN_PROCEDURE: &str = "award_daily_login_points";
pub const AWARD_POINTS_PROCEDURE: &str = "award_points";
pub const UNLOCK_PROCEDURE: &str = "unlock_achievement";

service!(
  /// `profiles`, the achievement catalog, and the point procedures.
  PointsService
);

impl<S: RemoteStore> PointsService<S> {
  async fn catalog_live(&self) -> Result<Vec<Achievement>> {
    let rows = self
      .store
      .select(ACHIEVEMENTS, &Query::new())
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<AchievementRow, _>(ACHIEVEMENTS, rows)
  }

  /// `user`'s profile. A user with no profile row yet gets an empty one.
  pub async fn profile(&self, user: Uuid) -> Fetched<Profile> {
    let call = async {
      let row = self
        .store
        .select(PROFILES, &Query::by_id(user))
        .await
        .map_err(Error::remote)?
        .pop();
      match row {
        Some(row) => Ok(rows::decode::<ProfileRow>(PROFILES, row)?.into()),
        None => Ok::<_, Error>(Profile::empty(user)),
      }
    };
    fetch_with_fallback(PROFILES, call, || Profile::empty(user)).await
  }

  /// The achievement catalog.
  pub async fn catalog(&self) -> Fetched<Vec<Achievement>> {
    fetch_with_fallback(ACHIEVEMENTS, self.catalog_live(), || seed::ACHIEVEMENTS.clone()).await
  }

  /// Achievements `user` has unlocked, most recent first.
  pub async fn achievements(&self, user: Uuid) -> Fetched<Vec<UnlockedAchievement>> {
    let call = async {
      let rows = self
        .store
        .select(
          USER_ACHIEVEMENTS,
          &Query::new().eq("user_id", user).order_by("unlocked_at", true),
        )
        .await
        .map_err(Error::remote)?;
      let unlocked: Vec<UserAchievementRow> = rows
        .into_iter()
        .map(|r| rows::decode(USER_ACHIEVEMENTS, r))
        .collect::<Result<_>>()?;
      if unlocked.is_empty() {
        return Ok::<_, Error>(Vec::new());
      }

      let catalog: HashMap<String, Achievement> = seed::ACHIEVEMENTS
        .iter()
        .chain(self.catalog_live().await?.iter())
        .map(|a| (a.key.clone(), a.clone()))
        .collect();
      Ok::<_, Error>(
        unlocked
          .into_iter()
          .filter_map(|u| {
            let achievement = catalog.get(&u.achievement_key).cloned().or_else(|| {
              tracing::warn!(key = %u.achievement_key, "unlocked achievement missing from catalog");
              None
            })?;
            Some(UnlockedAchievement {
              achievement,
              unlocked_at: u.unlocked_at,
            })
          })
          .collect(),
      )
    };
    fetch_with_fallback(USER_ACHIEVEMENTS, call, Vec::new).await
  }

  /// Claim today's login bonus. Claiming twice in a day awards nothing the
  /// second time.
  pub async fn claim_daily(&self, user: Uuid) -> Result<DailyClaim> {
    let out = self
      .store
      .rpc(DAILY_LOGIN_PROCEDURE, json!({ "user_id": user }))
      .await
      .map_err(failed_write(PROFILES))?;
    serde_json::from_value(out).map_err(|e| write_failed(PROFILES, e.into()))
  }

  /// Grant `amount` points to `user`; returns the new balance.
  pub async fn award(&self, user: Uuid, amount: u32, reason: &str) -> Result<u32> {
    let out = self
      .store
      .rpc(
        AWARD_POINTS_PROCEDURE,
        json!({ "user_id": user, "amount": amount, "reason": reason }),
      )
      .await
      .map_err(failed_write(PROFILES))?;
    out
      .get("total_points")
      .and_then(|v| v.as_u64())
      .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
      .ok_or_else(|| {
        let err = Error::Invalid(format!("unexpected {AWARD_POINTS_PROCEDURE} result: {out}"));
        write_failed(PROFILES, err)
      })
  }

  /// Unlock `key` for `user`. Returns `false` if it was already unlocked.
  pub async fn unlock_achievement(&self, user: Uuid, key: &str) -> Result<bool> {
    let out = self
      .store
      .rpc(
        UNLOCK_PROCEDURE,
        json!({ "user_id": user, "achievement_key": key }),
      )
      .await
      .map_err(failed_write(USER_ACHIEVEMENTS))?;
    Ok(out.get("unlocked").and_then(|v| v.as_bool()).unwrap_or(false))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use manna_store_sqlite::SqliteStore;

  use super::*;
  use crate::testing::{self, FailingStore, assert_offline, user};

  async fn seeded() -> PointsService<SqliteStore> {
    let store = testing::sqlite().await;
    seed::install(&store).await.unwrap();
    PointsService::new(Arc::new(store))
  }

  #[tokio::test]
  async fn new_users_start_empty() {
    let svc = seeded().await;
    let p = svc.profile(user(1)).await;
    assert!(!p.is_fallback());
    assert_eq!(p.into_inner(), Profile::empty(user(1)));
  }

  #[tokio::test]
  async fn daily_claim_updates_profile() {
    let svc = seeded().await;
    let first = svc.claim_daily(user(1)).await.unwrap();
    assert!(first.awarded);
    let second = svc.claim_daily(user(1)).await.unwrap();
    assert!(!second.awarded);

    let p = svc.profile(user(1)).await.into_inner();
    assert_eq!(p.points, first.total_points);
    assert_eq!(p.streak, 1);
    assert!(p.last_login_bonus_on.is_some());
  }

  #[tokio::test]
  async fn unlocked_achievements_join_the_catalog() {
    let svc = seeded().await;
    assert!(svc.unlock_achievement(user(1), "first_devotional").await.unwrap());
    assert!(!svc.unlock_achievement(user(1), "first_devotional").await.unwrap());

    let unlocked = svc.achievements(user(1)).await.into_inner();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0].achievement.title, "First Words");
    assert_eq!(svc.profile(user(1)).await.into_inner().points, 25);
  }

  #[tokio::test]
  async fn award_returns_balance() {
    let svc = seeded().await;
    assert_eq!(svc.award(user(1), 30, "referral").await.unwrap(), 30);
    assert_eq!(svc.award(user(1), 5, "bonus").await.unwrap(), 35);
  }

  #[tokio::test]
  async fn offline_profile_is_empty_and_claims_fail() {
    let svc = PointsService::new(Arc::new(FailingStore));
    assert_eq!(
      svc.profile(user(1)).await,
      Fetched::Fallback(Profile::empty(user(1)))
    );
    assert_eq!(
      svc.catalog().await,
      Fetched::Fallback(seed::ACHIEVEMENTS.clone())
    );
    assert_offline(&svc.claim_daily(user(1)).await.unwrap_err());
    assert_offline(&svc.unlock_achievement(user(1), "x").await.unwrap_err());
  }
}
