//! Router tests against an in-memory SQLite store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use manna_core::store::{AuthUser, Query, RemoteStore, Row};
use manna_services::seed;
use manna_store_rest::PublicClientConfig;
use manna_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

fn user(n: u128) -> Uuid { Uuid::from_u128(0x5e55_0000 + n) }

struct Harness {
  state:  AppState<SqliteStore>,
  tokens: Vec<String>,
}

impl Harness {
  /// A seeded store with sessions for users 0 and 1.
  async fn new() -> Self {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed::install(&store).await.unwrap();
    let mut tokens = Vec::new();
    for n in 0..2 {
      tokens.push(store.issue_session(user(n), None).await.unwrap());
    }
    Self {
      state: AppState::new(Arc::new(store)),
      tokens,
    }
  }

  async fn call(
    &self,
    method: &str,
    uri: &str,
    as_user: Option<usize>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    send(self.state.clone(), method, uri, as_user.map(|n| self.tokens[n].as_str()), body).await
  }
}

async fn send<S: RemoteStore + 'static>(
  state: AppState<S>,
  method: &str,
  uri: &str,
  token: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(t) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(state)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

// ── Offline store ─────────────────────────────────────────────────────────────

struct Offline;

fn offline() -> std::io::Error { std::io::Error::other("backend offline") }

impl RemoteStore for Offline {
  type Error = std::io::Error;

  async fn select(&self, _: &str, _: &Query) -> Result<Vec<Row>, Self::Error> { Err(offline()) }

  async fn insert(&self, _: &str, _: Row) -> Result<Row, Self::Error> { Err(offline()) }

  async fn update(&self, _: &str, _: &Query, _: Row) -> Result<Vec<Row>, Self::Error> {
    Err(offline())
  }

  async fn delete(&self, _: &str, _: &Query) -> Result<Vec<Row>, Self::Error> { Err(offline()) }

  async fn rpc(&self, _: &str, _: Value) -> Result<Value, Self::Error> { Err(offline()) }

  async fn user_for_token(&self, _: &str) -> Result<Option<AuthUser>, Self::Error> {
    Err(offline())
  }
}

// ── Reads ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn public_lists_are_enveloped() {
  let h = Harness::new().await;

  let (status, body) = h.call("GET", "/devotionals", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["success"], true);
  assert!(body.get("fallback").is_none());
  assert_eq!(body["data"].as_array().unwrap().len(), seed::DEVOTIONALS.len());

  let (_, body) = h.call("GET", "/devotionals?limit=2", None, None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 2);

  let (_, body) = h.call("GET", "/channels?status=live", None, None).await;
  let live = body["data"].as_array().unwrap();
  assert_eq!(live.len(), 1);
  assert_eq!(live[0]["status"], "live");

  let (_, body) = h.call("GET", "/events?tag=prayer", None, None).await;
  assert!(!body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn daily_picks_are_stable() {
  let h = Harness::new().await;
  let (status, a) = h.call("GET", "/verse-of-the-day?date=2024-03-10", None, None).await;
  assert_eq!(status, StatusCode::OK);
  let (_, b) = h.call("GET", "/verse-of-the-day?date=2024-03-10", None, None).await;
  assert_eq!(a, b);
  assert!(a["data"]["reference"].is_string());

  let (status, today) = h.call("GET", "/devotionals/today?date=2024-03-10", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(today["data"]["title"].is_string());
}

#[tokio::test]
async fn unknown_ids_are_404() {
  let h = Harness::new().await;
  let id = Uuid::new_v4();
  for path in ["reading-plans", "events", "channels", "devotionals"] {
    let (status, body) = h.call("GET", &format!("/{path}/{id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
    assert!(body["error"].is_string());
  }
}

#[tokio::test]
async fn client_config_exposes_only_the_public_tier() {
  let h = Harness::new().await;
  let (status, _) = h.call("GET", "/client-config", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let cfg = PublicClientConfig::new("https://manna.example.com", "anon-key").unwrap();
  let state = h.state.clone().with_client_config(cfg);
  let (status, body) = send(state, "GET", "/client-config", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(
    body["data"],
    json!({ "url": "https://manna.example.com", "anon_key": "anon-key" })
  );
}

// ── Auth ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn writes_require_a_session() {
  let h = Harness::new().await;
  let (status, body) = h
    .call("POST", "/devotionals", None, Some(json!({ "title": "x" })))
    .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["error"].is_string());

  let (status, _) = send(h.state.clone(), "GET", "/me", Some("forged"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Devotionals ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_fields_are_reported_together() {
  let h = Harness::new().await;
  let (status, body) = h
    .call("POST", "/devotionals", Some(0), Some(json!({ "title": "Morning" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["missing"], json!(["verse", "verse_text", "content"]));

  let (status, body) = h
    .call("POST", "/reading-plans", Some(0), Some(json!({ "title": "Lent" })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["missing"], json!(["description", "duration"]));
}

#[tokio::test]
async fn private_devotionals_are_visible_to_their_author_only() {
  let h = Harness::new().await;
  let draft = json!({
    "title": "Quiet",
    "verse": "Psalm 46:10",
    "verse_text": "Be still, and know that I am God.",
    "content": "Stop and listen.",
  });
  let (status, body) = h.call("POST", "/devotionals", Some(0), Some(draft)).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["success"], true);
  let id = body["data"]["id"].as_str().unwrap().to_owned();

  let (status, _) = h.call("GET", &format!("/devotionals/{id}"), None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, _) = h.call("GET", &format!("/devotionals/{id}"), Some(1), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  let (status, body) = h.call("GET", &format!("/devotionals/{id}"), Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["title"], "Quiet");

  let (status, _) = h
    .call("PATCH", &format!("/devotionals/{id}"), Some(1), Some(json!({ "title": "Mine" })))
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h.call("DELETE", &format!("/devotionals/{id}"), Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn likes_count_up() {
  let h = Harness::new().await;
  let id = seed::DEVOTIONALS[0].id;
  let before = seed::DEVOTIONALS[0].engagement.likes;
  let (status, body) = h
    .call("POST", &format!("/devotionals/{id}/like"), Some(0), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["likes"], before + 1);
}

#[tokio::test]
async fn strangers_cannot_engage_with_private_devotionals() {
  let h = Harness::new().await;
  let draft = json!({
    "title": "Hidden",
    "verse": "Matthew 6:6",
    "verse_text": "Go into your room and shut the door.",
    "content": "Pray in secret.",
  });
  let (_, body) = h.call("POST", "/devotionals", Some(0), Some(draft)).await;
  let id = body["data"]["id"].as_str().unwrap().to_owned();

  for action in ["like", "share"] {
    let (status, body) = h
      .call("POST", &format!("/devotionals/{id}/{action}"), Some(1), None)
      .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{action}");
    assert!(body.get("data").is_none());
  }

  let (status, body) = h.call("POST", &format!("/devotionals/{id}/like"), Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["likes"], 1);
}

#[tokio::test]
async fn reading_a_devotional_counts_a_view() {
  let h = Harness::new().await;
  let dev = &seed::DEVOTIONALS[0];
  let before = dev.engagement.views;
  let uri = format!("/devotionals/{}", dev.id);

  h.call("GET", &uri, None, None).await;
  let (status, body) = h.call("GET", &uri, Some(1), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["engagement"]["views"], before + 1);
}

#[tokio::test]
async fn authors_list_their_own_devotionals() {
  let h = Harness::new().await;
  let draft = json!({
    "title": "Journal",
    "verse": "Lamentations 3:23",
    "verse_text": "His mercies are new every morning.",
    "content": "Today was hard.",
  });
  h.call("POST", "/devotionals", Some(0), Some(draft)).await;

  let (status, body) = h.call("GET", "/me/devotionals", Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  let mine = body["data"].as_array().unwrap();
  assert_eq!(mine.len(), 1);
  assert_eq!(mine[0]["title"], "Journal");

  let (_, body) = h.call("GET", "/me/devotionals", Some(1), None).await;
  assert!(body["data"].as_array().unwrap().is_empty());
  let (status, _) = h.call("GET", "/me/devotionals", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ── Plans ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn plan_progress_is_bounded() {
  let h = Harness::new().await;
  let plan = &seed::READING_PLANS[0];
  let base = format!("/reading-plans/{}", plan.id);

  let (status, body) = h.call("POST", &format!("{base}/start"), Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["completed_days"], 0);

  let (status, body) = h
    .call("POST", &format!("{base}/days/1/complete"), Some(0), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["completed_days"], 1);

  let past_end = plan.duration_days + 1;
  let (status, _) = h
    .call("POST", &format!("{base}/days/{past_end}/complete"), Some(0), None)
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, body) = h.call("GET", "/me/reading-plans", Some(0), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

// ── Events ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_and_likes_on_events() {
  let h = Harness::new().await;
  let id = seed::EVENTS[0].id;

  let (status, body) = h
    .call("POST", &format!("/events/{id}/comments"), Some(0), Some(json!({ "content": "  " })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["missing"], json!(["content"]));

  let (status, _) = h
    .call("POST", &format!("/events/{id}/comments"), Some(0), Some(json!({ "content": "Amen" })))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  let (_, body) = h.call("GET", &format!("/events/{id}/comments"), None, None).await;
  assert_eq!(body["data"][0]["body"], "Amen");

  let (status, first) = h.call("POST", &format!("/events/{id}/like"), Some(1), None).await;
  assert_eq!(status, StatusCode::OK);
  let (_, again) = h.call("POST", &format!("/events/{id}/like"), Some(1), None).await;
  assert_eq!(first["data"]["likes"], again["data"]["likes"], "one like per user");
  let (_, after) = h.call("DELETE", &format!("/events/{id}/like"), Some(1), None).await;
  assert_eq!(after["data"]["likes"], seed::EVENTS[0].engagement.likes);
}

// ── Friends and notifications ─────────────────────────────────────────────────

#[tokio::test]
async fn friend_request_flow() {
  let h = Harness::new().await;

  let (status, body) = h
    .call("POST", "/friend-requests", Some(0), Some(json!({})))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["missing"], json!(["receiver_id"]));

  let (status, body) = h
    .call(
      "POST",
      "/friend-requests",
      Some(0),
      Some(json!({ "receiver_id": user(1), "message": "hi" })),
    )
    .await;
  assert_eq!(status, StatusCode::CREATED);
  let id = body["data"]["id"].as_str().unwrap().to_owned();

  let (status, _) = h
    .call("POST", "/friend-requests", Some(1), Some(json!({ "receiver_id": user(0) })))
    .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, body) = h.call("GET", "/friend-requests", Some(1), None).await;
  assert_eq!(body["data"]["incoming"].as_array().unwrap().len(), 1);

  let (status, _) = h
    .call("POST", &format!("/friend-requests/{id}/accept"), Some(0), None)
    .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, _) = h
    .call("POST", &format!("/friend-requests/{id}/accept"), Some(1), None)
    .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = h.call("GET", "/friends", Some(0), None).await;
  assert_eq!(body["data"].as_array().unwrap().len(), 1);

  let (_, body) = h
    .call("GET", "/notifications?unread_only=true", Some(0), None)
    .await;
  let unread = body["data"].as_array().unwrap();
  assert_eq!(unread.len(), 1, "the acceptance notice");
  let note = unread[0]["id"].as_str().unwrap();
  let (status, _) = h
    .call("POST", &format!("/notifications/{note}/read"), Some(0), None)
    .await;
  assert_eq!(status, StatusCode::OK);
  let (_, body) = h.call("POST", "/notifications/read-all", Some(0), None).await;
  assert_eq!(body["data"]["updated"], 0);
}

// ── The signed-in user ────────────────────────────────────────────────────────

#[tokio::test]
async fn daily_claim_shows_up_on_me() {
  let h = Harness::new().await;
  let (status, body) = h.call("POST", "/points/daily", Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["awarded"], true);
  let (_, body) = h.call("POST", "/points/daily", Some(0), None).await;
  assert_eq!(body["data"]["awarded"], false);

  let (status, body) = h.call("GET", "/me", Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["profile"]["points"], 10);
  assert_eq!(body["data"]["level"], 1);
  assert_eq!(body["data"]["unread"], 1);
}

#[tokio::test]
async fn unlocking_an_achievement_shows_up_on_me() {
  let h = Harness::new().await;
  let (status, body) = h.call("GET", "/achievements", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"].as_array().unwrap().len(), seed::ACHIEVEMENTS.len());

  let achievement = &seed::ACHIEVEMENTS[0];
  let uri = format!("/achievements/{}/unlock", achievement.key);
  let (status, body) = h.call("POST", &uri, Some(0), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["unlocked"], true);
  let (_, body) = h.call("POST", &uri, Some(0), None).await;
  assert_eq!(body["data"]["unlocked"], false);

  let (_, body) = h.call("GET", "/me", Some(0), None).await;
  assert_eq!(body["data"]["achievements"][0]["key"], achievement.key);
  assert_eq!(body["data"]["profile"]["points"], achievement.points);

  let (status, _) = h.call("POST", "/achievements/no-such-thing/unlock", Some(0), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn referral_signup_via_code() {
  let h = Harness::new().await;
  let (_, body) = h.call("POST", "/referrals/code", Some(0), None).await;
  let code = body["data"]["code"].as_str().unwrap().to_owned();

  let (status, body) = h
    .call("POST", "/referrals/signup", Some(1), Some(json!({ "code": code })))
    .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["status"], "pending");

  let (status, _) = h
    .call("POST", "/referrals/signup", Some(0), Some(json!({ "code": code })))
    .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── Offline backend ───────────────────────────────────────────────────────────

#[tokio::test]
async fn offline_reads_fall_back_and_writes_fail() {
  let state = AppState::new(Arc::new(Offline));

  let (status, body) = send(state.clone(), "GET", "/reading-plans", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["fallback"], true);
  assert_eq!(body["data"].as_array().unwrap().len(), seed::READING_PLANS.len());

  let id = seed::EVENTS[0].id;
  let (status, body) = send(state.clone(), "GET", &format!("/events/{id}"), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["fallback"], true);

  let (status, body) = send(state, "GET", "/me", Some("any"), None).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(body["details"], "backend offline");
}
