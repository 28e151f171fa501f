//! Friend requests and friendships.
//!
//! A friendship row is only ever written by [`FriendService::accept`], after
//! the request's status moved from pending to accepted. Friendships are
//! stored once, so every lookup checks both column orders.

use chrono::Utc;
use manna_core::{
  Error, Fetched, Result,
  fallback::write_failed,
  fetch_with_fallback,
  notification::{NewNotification, NotificationKind},
  social::{FriendRequest, Friendship, RequestStatus},
  store::{Query, RemoteStore, Row},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
  NotificationService, failed_write,
  rows::{self, FRIEND_REQUESTS, FRIENDSHIPS, FriendRequestRow, FriendshipRow},
  service,
};

service!(
  /// `friend_requests` and `friendships`.
  FriendService
);

/// Matches a friendship between `a` and `b` stored in either order.
fn pair(a: Uuid, b: Uuid) -> Query {
  Query::new()
    .or_group(vec![("user1_id", json!(a)), ("user2_id", json!(b))])
    .or_group(vec![("user1_id", json!(b)), ("user2_id", json!(a))])
}

impl<S: RemoteStore> FriendService<S> {
  fn notifications(&self) -> NotificationService<S> { NotificationService::new(self.store.clone()) }

  async fn requests(&self, query: &Query) -> Result<Vec<FriendRequest>> {
    let rows = self
      .store
      .select(FRIEND_REQUESTS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<FriendRequestRow, _>(FRIEND_REQUESTS, rows)
  }

  async fn friendships(&self, query: &Query) -> Result<Vec<Friendship>> {
    let rows = self
      .store
      .select(FRIENDSHIPS, query)
      .await
      .map_err(Error::remote)?;
    rows::decode_all::<FriendshipRow, _>(FRIENDSHIPS, rows)
  }

  /// Move a pending request addressed to `acting_user` to `to`.
  async fn transition(&self, id: Uuid, acting_user: Uuid, to: RequestStatus) -> Result<FriendRequest> {
    let request = self
      .requests(&Query::by_id(id))
      .await
      .map_err(|e| write_failed(FRIEND_REQUESTS, e))?
      .pop()
      .ok_or(Error::NotFound {
        entity: FRIEND_REQUESTS,
        id,
      })?;
    if request.receiver_id != acting_user {
      return Err(Error::Forbidden(
        "only the receiver can answer a friend request".into(),
      ));
    }
    if request.status != RequestStatus::Pending {
      return Err(Error::Conflict(format!(
        "friend request already {}",
        request.status.as_str()
      )));
    }

    let mut patch = Row::new();
    patch.insert("status".into(), json!(to));
    patch.insert("updated_at".into(), json!(Utc::now()));
    let guard = Query::by_id(id).eq("status", RequestStatus::Pending);
    let row = self
      .store
      .update(FRIEND_REQUESTS, &guard, patch)
      .await
      .map_err(failed_write(FRIEND_REQUESTS))?
      .pop()
      .ok_or_else(|| Error::Conflict("friend request was answered concurrently".into()))?;
    Ok(rows::decode::<FriendRequestRow>(FRIEND_REQUESTS, row)?.into())
  }

  // ─── Reads ────────────────────────────────────────────────────────────────

  /// Pending requests addressed to `user`.
  pub async fn incoming(&self, user: Uuid) -> Fetched<Vec<FriendRequest>> {
    let query = Query::new()
      .eq("receiver_id", user)
      .eq("status", RequestStatus::Pending)
      .order_by("created_at", true);
    fetch_with_fallback(FRIEND_REQUESTS, self.requests(&query), Vec::new).await
  }

  /// Pending requests `user` has sent.
  pub async fn outgoing(&self, user: Uuid) -> Fetched<Vec<FriendRequest>> {
    let query = Query::new()
      .eq("sender_id", user)
      .eq("status", RequestStatus::Pending)
      .order_by("created_at", true);
    fetch_with_fallback(FRIEND_REQUESTS, self.requests(&query), Vec::new).await
  }

  pub async fn friends(&self, user: Uuid) -> Fetched<Vec<Friendship>> {
    let query = Query::new()
      .or_group(vec![("user1_id", json!(user))])
      .or_group(vec![("user2_id", json!(user))]);
    fetch_with_fallback(FRIENDSHIPS, self.friendships(&query), Vec::new).await
  }

  /// Whether `a` and `b` are friends, in either direction.
  pub async fn are_friends(&self, a: Uuid, b: Uuid) -> Result<bool> {
    Ok(!self.friendships(&pair(a, b)).await?.is_empty())
  }

  // ─── Writes ───────────────────────────────────────────────────────────────

  pub async fn send_request(
    &self,
    from: Uuid,
    to: Uuid,
    message: Option<String>,
  ) -> Result<FriendRequest> {
    if from == to {
      return Err(Error::Invalid("cannot send a friend request to yourself".into()));
    }
    if self
      .are_friends(from, to)
      .await
      .map_err(|e| write_failed(FRIEND_REQUESTS, e))?
    {
      return Err(Error::Conflict("already friends".into()));
    }
    let pending = Query::new()
      .eq("status", RequestStatus::Pending)
      .or_group(vec![("sender_id", json!(from)), ("receiver_id", json!(to))])
      .or_group(vec![("sender_id", json!(to)), ("receiver_id", json!(from))]);
    if !self
      .requests(&pending)
      .await
      .map_err(|e| write_failed(FRIEND_REQUESTS, e))?
      .is_empty()
    {
      return Err(Error::Conflict("a friend request is already pending".into()));
    }

    let row = rows::encode(&FriendRequestRow {
      id: Uuid::new_v4(),
      sender_id: from,
      receiver_id: to,
      status: RequestStatus::Pending,
      message,
      created_at: Utc::now(),
      updated_at: None,
    })?;
    let stored = self
      .store
      .insert(FRIEND_REQUESTS, row)
      .await
      .map_err(failed_write(FRIEND_REQUESTS))?;
    let request: FriendRequest = rows::decode::<FriendRequestRow>(FRIEND_REQUESTS, stored)?.into();

    self
      .notifications()
      .notify(NewNotification {
        user_id: to,
        kind:    NotificationKind::FriendRequest,
        title:   "New friend request".into(),
        message: "Someone wants to connect with you.".into(),
        data:    json!({ "request_id": request.id, "sender_id": from }),
      })
      .await;
    Ok(request)
  }

  /// Accept a request addressed to `acting_user` and record the friendship.
  pub async fn accept(&self, id: Uuid, acting_user: Uuid) -> Result<Friendship> {
    let request = self
      .transition(id, acting_user, RequestStatus::Accepted)
      .await?;

    let row = rows::encode(&FriendshipRow {
      id:         Uuid::new_v4(),
      user1_id:   request.sender_id,
      user2_id:   request.receiver_id,
      created_at: Utc::now(),
    })?;
    let stored = self
      .store
      .insert(FRIENDSHIPS, row)
      .await
      .map_err(failed_write(FRIENDSHIPS))?;
    let friendship: Friendship = rows::decode::<FriendshipRow>(FRIENDSHIPS, stored)?.into();

    tracing::info!(a = %request.sender_id, b = %request.receiver_id, "friendship created");
    self
      .notifications()
      .notify(NewNotification {
        user_id: request.sender_id,
        kind:    NotificationKind::FriendAccepted,
        title:   "Friend request accepted".into(),
        message: "Your friend request was accepted.".into(),
        data:    json!({ "request_id": request.id, "friend_id": request.receiver_id }),
      })
      .await;
    Ok(friendship)
  }

  pub async fn reject(&self, id: Uuid, acting_user: Uuid) -> Result<FriendRequest> {
    self
      .transition(id, acting_user, RequestStatus::Rejected)
      .await
  }
}
