//! Referral codes and the referrals they produce.
//!
//! Each user owns one code. A new user who signs up with it gets a pending
//! referral; on their first sign-in the referral is completed exactly once
//! and the referrer is credited.

use chrono::Utc;
use manna_core::{
  Error, Result,
  referral::{REFERRAL_POINTS, Referral, ReferralStatus},
  store::{Query, RemoteStore, Row},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  PointsService, failed_write,
  rows::{self, REFERRAL_CODES, REFERRALS, ReferralCodeRow, ReferralRow},
  service,
};

const CODE_LEN: usize = 8;

service!(
  /// `referral_codes` and `referrals`.
  ReferralService
);

fn fresh_code() -> String {
  Uuid::new_v4().simple().to_string()[..CODE_LEN].to_ascii_uppercase()
}

impl<S: RemoteStore> ReferralService<S> {
  async fn code_rows(&self, query: &Query) -> Result<Vec<ReferralCodeRow>> {
    self
      .store
      .select(REFERRAL_CODES, query)
      .await
      .map_err(failed_write(REFERRAL_CODES))?
      .into_iter()
      .map(|r| rows::decode(REFERRAL_CODES, r))
      .collect()
  }

  async fn referrals(&self, query: &Query) -> Result<Vec<Referral>> {
    let rows = self
      .store
      .select(REFERRALS, query)
      .await
      .map_err(failed_write(REFERRALS))?;
    rows::decode_all::<ReferralRow, _>(REFERRALS, rows)
  }

  /// `user`'s referral code, created on first use.
  pub async fn create_code(&self, user: Uuid) -> Result<String> {
    if let Some(existing) = self
      .code_rows(&Query::new().eq("user_id", user))
      .await?
      .pop()
    {
      return Ok(existing.code);
    }
    let row = rows::encode(&ReferralCodeRow {
      id:         Uuid::new_v4(),
      user_id:    user,
      code:       fresh_code(),
      created_at: Utc::now(),
    })?;
    let stored = self
      .store
      .insert(REFERRAL_CODES, row)
      .await
      .map_err(failed_write(REFERRAL_CODES))?;
    Ok(rows::decode::<ReferralCodeRow>(REFERRAL_CODES, stored)?.code)
  }

  /// Record that `referred` signed up using `code`.
  pub async fn record_signup(&self, code: &str, referred: Uuid) -> Result<Referral> {
    let code = code.trim().to_ascii_uppercase();
    let owner = self
      .code_rows(&Query::new().eq("code", &code))
      .await?
      .pop()
      .ok_or_else(|| Error::Invalid(format!("unknown referral code {code:?}")))?;
    if owner.user_id == referred {
      return Err(Error::Invalid("cannot refer yourself".into()));
    }
    if !self
      .referrals(&Query::new().eq("referred_id", referred))
      .await?
      .is_empty()
    {
      return Err(Error::Conflict("user was already referred".into()));
    }

    let row = rows::encode(&ReferralRow {
      id: Uuid::new_v4(),
      referrer_id: owner.user_id,
      referred_id: Some(referred),
      code,
      status: ReferralStatus::Pending,
      created_at: Utc::now(),
      completed_at: None,
    })?;
    let stored = self
      .store
      .insert(REFERRALS, row)
      .await
      .map_err(failed_write(REFERRALS))?;
    Ok(rows::decode::<ReferralRow>(REFERRALS, stored)?.into())
  }

  /// Complete `user`'s pending referral, if any, and credit the referrer.
  ///
  /// The status change is conditional on the row still being pending, so
  /// concurrent sign-ins credit the referrer once. Crediting is best-effort.
  pub async fn resolve_pending(&self, user: Uuid) -> Result<Option<Referral>> {
    let pending = Query::new()
      .eq("referred_id", user)
      .eq("status", ReferralStatus::Pending);
    let Some(referral) = self.referrals(&pending).await?.pop() else {
      return Ok(None);
    };

    let mut patch = Row::new();
    patch.insert("status".into(), json!(ReferralStatus::Completed));
    patch.insert("completed_at".into(), json!(Utc::now()));
    let guard = Query::by_id(referral.id).eq("status", ReferralStatus::Pending);
    let Some(row) = self
      .store
      .update(REFERRALS, &guard, patch)
      .await
      .map_err(failed_write(REFERRALS))?
      .pop()
    else {
      tracing::debug!(%user, "referral already completed elsewhere");
      return Ok(None);
    };
    let completed: Referral = rows::decode::<ReferralRow>(REFERRALS, row)?.into();

    let points = PointsService::new(self.store.clone());
    if let Err(e) = points
      .award(completed.referrer_id, REFERRAL_POINTS, "referral")
      .await
    {
      tracing::warn!(referrer = %completed.referrer_id, error = %e, "referral bonus not awarded");
    }
    tracing::info!(referrer = %completed.referrer_id, referred = %user, "referral completed");
    Ok(Some(completed))
  }
}
