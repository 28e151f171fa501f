//! Points, level, achievements and unread count for the signed-in user.
//!
//! A refresh is stamped with a generation number when it starts. Its result
//! is published only if no newer refresh, sign-out or close has happened in
//! the meantime and the same user is still signed in.

use std::sync::{Arc, Mutex, PoisonError};

use manna_core::{
  Fetched,
  profile::{Profile, UnlockedAchievement},
  store::RemoteStore,
};
use serde::Serialize;
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use super::{AuthContext, LoadState, Session};
use crate::{NotificationService, PointsService};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserData {
  pub profile:      Profile,
  pub level:        u32,
  pub achievements: Vec<UnlockedAchievement>,
  pub unread:       usize,
}

struct Generation {
  current: u64,
  closed:  bool,
}

pub struct UserDataContext<S> {
  auth:          watch::Receiver<Option<Session>>,
  points:        PointsService<S>,
  notifications: NotificationService<S>,
  generation:    Mutex<Generation>,
  tx:            watch::Sender<LoadState<UserData>>,
}

impl<S: RemoteStore + 'static> UserDataContext<S> {
  pub fn new(store: Arc<S>, auth: &AuthContext<S>) -> Self {
    let (tx, _) = watch::channel(LoadState::Idle);
    Self {
      auth: auth.subscribe(),
      points: PointsService::new(store.clone()),
      notifications: NotificationService::new(store),
      generation: Mutex::new(Generation {
        current: 0,
        closed:  false,
      }),
      tx,
    }
  }

  fn signed_in_user(&self) -> Option<Uuid> { self.auth.borrow().as_ref().map(|s| s.user.id) }

  /// Start a new generation, invalidating any refresh in flight.
  fn begin(&self) -> Option<u64> {
    let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
    if generation.closed {
      return None;
    }
    generation.current += 1;
    Some(generation.current)
  }

  /// Publish `state` if `stamp` is still the latest generation.
  fn publish(&self, stamp: u64, state: LoadState<UserData>) -> bool {
    let generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
    if generation.closed || generation.current != stamp {
      return false;
    }
    self.tx.send_replace(state);
    true
  }

  /// Re-fetch everything for the signed-in user.
  ///
  /// Returns `false` when the result was discarded as stale or the context
  /// is closed.
  pub async fn refresh(&self) -> bool {
    let Some(stamp) = self.begin() else {
      return false;
    };
    let Some(user) = self.signed_in_user() else {
      return self.publish(stamp, LoadState::Idle);
    };
    self.publish(stamp, LoadState::Loading);

    let (profile, achievements, unread) = tokio::join!(
      self.points.profile(user),
      self.points.achievements(user),
      self.notifications.unread_count(user),
    );

    if self.signed_in_user() != Some(user) {
      tracing::debug!(%user, "user changed during refresh; discarding");
      self.publish(stamp, LoadState::Idle);
      return false;
    }

    let degraded = profile.is_fallback() || achievements.is_fallback() || unread.is_fallback();
    let profile = profile.into_inner();
    let data = UserData {
      level: profile.level(),
      profile,
      achievements: achievements.into_inner(),
      unread: unread.into_inner(),
    };
    let state = if degraded {
      LoadState::from(Fetched::Fallback(data))
    } else {
      LoadState::from(Fetched::Live(data))
    };

    let published = self.publish(stamp, state);
    if !published {
      tracing::debug!(%user, stamp, "stale refresh discarded");
    }
    published
  }

  /// Drop any data and invalidate refreshes in flight, e.g. on sign-out.
  pub fn clear(&self) {
    if let Some(stamp) = self.begin() {
      self.publish(stamp, LoadState::Idle);
    }
  }

  /// Stop publishing. Refreshes in flight are discarded.
  pub fn close(&self) {
    let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
    generation.closed = true;
    generation.current += 1;
  }

  pub fn current(&self) -> LoadState<UserData> { self.tx.borrow().clone() }

  pub fn subscribe(&self) -> watch::Receiver<LoadState<UserData>> { self.tx.subscribe() }

  /// Refresh whenever the signed-in session changes, until closed.
  pub fn follow_auth(self: &Arc<Self>) -> JoinHandle<()> {
    let this = Arc::clone(self);
    let mut auth = this.auth.clone();
    tokio::spawn(async move {
      while auth.changed().await.is_ok() {
        let signed_in = auth.borrow_and_update().is_some();
        if signed_in {
          if !this.refresh().await && this.is_closed() {
            break;
          }
        } else {
          this.clear();
        }
        if this.is_closed() {
          break;
        }
      }
    })
  }

  fn is_closed(&self) -> bool {
    self
      .generation
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .closed
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use tokio::sync::Semaphore;

  use super::*;
  use crate::testing::{self, FailingStore, GatedStore, auth, user};

  fn session(n: u128) -> Session {
    Session {
      user:         auth(n),
      access_token: format!("token-{n}"),
    }
  }

  #[tokio::test]
  async fn refresh_without_user_is_idle() {
    let store = Arc::new(testing::sqlite().await);
    let auth_ctx = AuthContext::new(store.clone());
    let ctx = UserDataContext::new(store, &auth_ctx);

    assert!(ctx.refresh().await);
    assert_eq!(ctx.current(), LoadState::Idle);
  }

  #[tokio::test]
  async fn refresh_reflects_claimed_points() {
    let store = Arc::new(testing::sqlite().await);
    let auth_ctx = AuthContext::new(store.clone());
    let ctx = UserDataContext::new(store, &auth_ctx);

    auth_ctx.sign_in(session(1)).await.unwrap();
    assert!(ctx.refresh().await);

    let LoadState::Ready(data) = ctx.current() else {
      panic!("expected ready state, got {:?}", ctx.current());
    };
    assert_eq!(data.profile.points, 10);
    assert_eq!(data.level, 1);
    assert_eq!(data.unread, 1, "the daily bonus notification");
  }

  #[tokio::test]
  async fn offline_refresh_is_fallback() {
    let store = Arc::new(FailingStore);
    let auth_ctx = AuthContext::new(store.clone());
    let ctx = UserDataContext::new(store, &auth_ctx);

    auth_ctx.sign_in(session(1)).await.unwrap();
    assert!(ctx.refresh().await);
    let state = ctx.current();
    assert!(matches!(state, LoadState::Fallback(_)));
    assert_eq!(state.value().unwrap().profile, Profile::empty(user(1)));
  }

  #[tokio::test]
  async fn slow_refresh_after_sign_out_is_discarded() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(GatedStore {
      inner: testing::sqlite().await,
      gate:  gate.clone(),
    });
    let auth_ctx = AuthContext::new(store.clone());
    // Let the sign-in side effects through, then close the gate.
    gate.add_permits(64);
    auth_ctx.sign_in(session(1)).await.unwrap();
    gate.acquire_many(64).await.unwrap().forget();

    let ctx = Arc::new(UserDataContext::new(store, &auth_ctx));
    let mut rx = ctx.subscribe();

    let pending = tokio::spawn({
      let ctx = ctx.clone();
      async move { ctx.refresh().await }
    });
    rx.wait_for(|s| s.is_loading()).await.unwrap();

    auth_ctx.sign_out();
    ctx.clear();
    gate.add_permits(16);

    assert!(!pending.await.unwrap(), "stale result must be discarded");
    assert_eq!(ctx.current(), LoadState::Idle);
  }

  #[tokio::test]
  async fn sign_out_mid_refresh_settles_on_idle() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(GatedStore {
      inner: testing::sqlite().await,
      gate:  gate.clone(),
    });
    let auth_ctx = AuthContext::new(store.clone());
    gate.add_permits(64);
    auth_ctx.sign_in(session(1)).await.unwrap();
    gate.acquire_many(64).await.unwrap().forget();

    let ctx = Arc::new(UserDataContext::new(store, &auth_ctx));
    let mut rx = ctx.subscribe();
    let pending = tokio::spawn({
      let ctx = ctx.clone();
      async move { ctx.refresh().await }
    });
    rx.wait_for(|s| s.is_loading()).await.unwrap();

    auth_ctx.sign_out();
    gate.add_permits(16);

    assert!(!pending.await.unwrap());
    assert_eq!(ctx.current(), LoadState::Idle);
  }

  #[tokio::test]
  async fn closed_context_publishes_nothing() {
    let store = Arc::new(testing::sqlite().await);
    let auth_ctx = AuthContext::new(store.clone());
    let ctx = UserDataContext::new(store, &auth_ctx);
    auth_ctx.sign_in(session(1)).await.unwrap();

    ctx.close();
    assert!(!ctx.refresh().await);
    assert_eq!(ctx.current(), LoadState::Idle);
  }

  #[tokio::test]
  async fn follows_sign_in_and_out() {
    let store = Arc::new(testing::sqlite().await);
    let auth_ctx = AuthContext::new(store.clone());
    let ctx = Arc::new(UserDataContext::new(store, &auth_ctx));
    let mut rx = ctx.subscribe();
    let follower = ctx.follow_auth();

    auth_ctx.sign_in(session(2)).await.unwrap();
    tokio::time::timeout(
      Duration::from_secs(5),
      rx.wait_for(|s| matches!(s, LoadState::Ready(_))),
    )
    .await
    .unwrap()
    .unwrap();

    auth_ctx.sign_out();
    tokio::time::timeout(
      Duration::from_secs(5),
      rx.wait_for(|s| *s == LoadState::Idle),
    )
    .await
    .unwrap()
    .unwrap();

    ctx.close();
    follower.abort();
  }
}
