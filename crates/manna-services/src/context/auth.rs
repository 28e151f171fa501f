//! The signed-in session.

use std::sync::Arc;

use manna_core::{
  Error, Result,
  store::{AuthUser, RemoteStore},
};
use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};

use crate::{PointsService, ReferralService};

/// A resolved session: who is signed in, and the token that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub user:         AuthUser,
  pub access_token: String,
}

/// Holds the current [`Session`] and runs the sign-in side effects.
pub struct AuthContext<S> {
  store:     Arc<S>,
  tx:        watch::Sender<Option<Session>>,
  points:    PointsService<S>,
  referrals: ReferralService<S>,
}

impl<S: RemoteStore + 'static> AuthContext<S> {
  pub fn new(store: Arc<S>) -> Self {
    let (tx, _) = watch::channel(None);
    Self {
      points: PointsService::new(store.clone()),
      referrals: ReferralService::new(store.clone()),
      store,
      tx,
    }
  }

  /// Resolve `token` against the store and sign in with it.
  ///
  /// An unknown token is [`Error::Unauthenticated`]; a store failure is
  /// returned as-is. Neither is masked.
  pub async fn sign_in_with_token(&self, token: &str) -> Result<(Session, JoinHandle<()>)> {
    let user = self
      .store
      .user_for_token(token)
      .await
      .map_err(Error::remote)?
      .ok_or(Error::Unauthenticated)?;
    let session = Session {
      user,
      access_token: token.to_owned(),
    };
    let side_effects = self.sign_in(session.clone());
    Ok((session, side_effects))
  }

  /// Publish `session`, then award the daily bonus and resolve any pending
  /// referral in the background.
  ///
  /// The returned handle completes when both side effects have run. Their
  /// failures are logged and never reach the caller.
  pub fn sign_in(&self, session: Session) -> JoinHandle<()> {
    let user = session.user.id;
    tracing::info!(%user, "signed in");
    self.tx.send_replace(Some(session));

    let points = self.points.clone();
    let referrals = self.referrals.clone();
    tokio::spawn(async move {
      match points.claim_daily(user).await {
        Ok(claim) if claim.awarded => {
          tracing::info!(%user, streak = claim.streak, total = claim.total_points, "daily bonus awarded");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(%user, error = %e, "daily bonus failed"),
      }
      if let Err(e) = referrals.resolve_pending(user).await {
        tracing::warn!(%user, error = %e, "referral resolution failed");
      }
    })
  }

  pub fn sign_out(&self) {
    if let Some(prev) = self.tx.send_replace(None) {
      tracing::info!(user = %prev.user.id, "signed out");
    }
  }

  pub fn current(&self) -> Option<Session> { self.tx.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<Option<Session>> { self.tx.subscribe() }
}
