//! Remote table rows and their mapping to the canonical schema.
//!
//! The remote tables spell several fields differently from the domain types
//! (`verse` + `verse_text` vs `Scripture`, `start_time` vs `starts_at`,
//! `is_public` vs `Visibility`, signed counters vs `u32`). Each row struct
//! here mirrors one table exactly; the `From` impls are the only place the
//! two spellings meet.

use chrono::{DateTime, NaiveDate, Utc};
use manna_core::{
  Error, Result,
  channel::{Channel, ChannelStatus},
  devotional::{Devotional, Engagement, Scripture, Visibility},
  event::{Event, EventComment, EventKind},
  notification::{Notification, NotificationKind},
  plan::{Difficulty, PlanDay, ReadingPlan, UserReadingPlan},
  profile::{Achievement, Profile},
  referral::{Referral, ReferralStatus},
  social::{FriendRequest, Friendship, RequestStatus},
  store::Row,
};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

// ─── Table names ─────────────────────────────────────────────────────────────

pub const DEVOTIONALS: &str = "devotionals";
pub const READING_PLANS: &str = "reading_plans";
pub const USER_READING_PLANS: &str = "user_reading_plans";
pub const EVENTS: &str = "events";
pub const EVENT_LIKES: &str = "event_likes";
pub const EVENT_COMMENTS: &str = "event_comments";
pub const FRIEND_REQUESTS: &str = "friend_requests";
pub const FRIENDSHIPS: &str = "friendships";
pub const CHANNELS: &str = "channels";
pub const NOTIFICATIONS: &str = "notifications";
pub const PROFILES: &str = "profiles";
pub const ACHIEVEMENTS: &str = "achievements";
pub const USER_ACHIEVEMENTS: &str = "user_achievements";
pub const REFERRALS: &str = "referrals";
pub const REFERRAL_CODES: &str = "referral_codes";

// ─── Generic encode/decode ───────────────────────────────────────────────────

pub fn decode<R: DeserializeOwned>(table: &'static str, row: Row) -> Result<R> {
  serde_json::from_value(Value::Object(row)).map_err(|source| Error::Decode { table, source })
}

/// Decode every row as `R` and convert to the canonical type `T`.
pub fn decode_all<R, T>(table: &'static str, rows: Vec<Row>) -> Result<Vec<T>>
where
  R: DeserializeOwned + Into<T>,
{
  rows
    .into_iter()
    .map(|row| decode::<R>(table, row).map(Into::into))
    .collect()
}

pub fn encode<R: Serialize>(row: &R) -> Result<Row> {
  match serde_json::to_value(row)? {
    Value::Object(map) => Ok(map),
    other => Err(Error::Invalid(format!("row encoded as non-object: {other}"))),
  }
}

/// Read a missing or `null` column as the type's default.
fn null_as_default<'de, D, T>(de: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + Default,
{
  Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// Counters are signed in the remote schema; clamp to the canonical range.
fn count(n: i64) -> u32 { u32::try_from(n.max(0)).unwrap_or(u32::MAX) }

// ─── devotionals ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevotionalRow {
  pub id:          Uuid,
  #[serde(default)]
  pub user_id:     Option<Uuid>,
  #[serde(default)]
  pub author_name: Option<String>,
  pub title:       String,
  pub verse:       String,
  pub verse_text:  String,
  pub content:     String,
  #[serde(default)]
  pub prayer:      Option<String>,
  #[serde(default)]
  pub application: Option<String>,
  #[serde(default)]
  pub reflection:  Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub is_public:   bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub likes:       i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub shares:      i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub views:       i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub comments:    i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tags:        Vec<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

impl From<DevotionalRow> for Devotional {
  fn from(r: DevotionalRow) -> Self {
    Devotional {
      id:          r.id,
      author_id:   r.user_id,
      author_name: r.author_name,
      title:       r.title,
      verse:       Scripture {
        reference: r.verse,
        text:      r.verse_text,
      },
      content:     r.content,
      prayer:      r.prayer,
      application: r.application,
      reflection:  r.reflection,
      visibility:  Visibility::from_public_flag(r.is_public),
      engagement:  Engagement {
        likes:    count(r.likes),
        shares:   count(r.shares),
        views:    count(r.views),
        comments: count(r.comments),
      },
      tags:        r.tags,
      created_at:  r.created_at,
      updated_at:  r.updated_at,
    }
  }
}

impl From<&Devotional> for DevotionalRow {
  fn from(d: &Devotional) -> Self {
    DevotionalRow {
      id:          d.id,
      user_id:     d.author_id,
      author_name: d.author_name.clone(),
      title:       d.title.clone(),
      verse:       d.verse.reference.clone(),
      verse_text:  d.verse.text.clone(),
      content:     d.content.clone(),
      prayer:      d.prayer.clone(),
      application: d.application.clone(),
      reflection:  d.reflection.clone(),
      is_public:   d.visibility.is_public(),
      likes:       d.engagement.likes.into(),
      shares:      d.engagement.shares.into(),
      views:       d.engagement.views.into(),
      comments:    d.engagement.comments.into(),
      tags:        d.tags.clone(),
      created_at:  d.created_at,
      updated_at:  d.updated_at,
    }
  }
}

// ─── reading_plans / user_reading_plans ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingPlanRow {
  pub id:           Uuid,
  #[serde(default)]
  pub user_id:      Option<Uuid>,
  pub title:        String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description:  String,
  /// Day count.
  pub duration:     i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub difficulty:   Difficulty,
  #[serde(default, deserialize_with = "null_as_default")]
  pub readings:     Vec<PlanDay>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub participants: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub rating:       f32,
  pub created_at:   DateTime<Utc>,
}

impl From<ReadingPlanRow> for ReadingPlan {
  fn from(r: ReadingPlanRow) -> Self {
    let mut days = r.readings;
    days.sort_by_key(|d| d.day);
    ReadingPlan {
      id: r.id,
      author_id: r.user_id,
      title: r.title,
      description: r.description,
      duration_days: count(r.duration),
      difficulty: r.difficulty,
      days,
      participants: count(r.participants),
      rating: r.rating,
      created_at: r.created_at,
    }
  }
}

impl From<&ReadingPlan> for ReadingPlanRow {
  fn from(p: &ReadingPlan) -> Self {
    ReadingPlanRow {
      id:           p.id,
      user_id:      p.author_id,
      title:        p.title.clone(),
      description:  p.description.clone(),
      duration:     p.duration_days.into(),
      difficulty:   p.difficulty,
      readings:     p.days.clone(),
      participants: p.participants.into(),
      rating:       p.rating,
      created_at:   p.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReadingPlanRow {
  pub id:             Uuid,
  pub user_id:        Uuid,
  pub plan_id:        Uuid,
  #[serde(default, deserialize_with = "null_as_default")]
  pub completed_days: i64,
  pub started_at:     DateTime<Utc>,
  #[serde(default)]
  pub completed_at:   Option<DateTime<Utc>>,
}

impl From<UserReadingPlanRow> for UserReadingPlan {
  fn from(r: UserReadingPlanRow) -> Self {
    UserReadingPlan {
      id:             r.id,
      user_id:        r.user_id,
      plan_id:        r.plan_id,
      completed_days: count(r.completed_days),
      started_at:     r.started_at,
      completed_at:   r.completed_at,
    }
  }
}

// ─── events / event_comments / event_likes ───────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRow {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(rename = "type")]
  pub kind:        EventKind,
  #[serde(default)]
  pub media_url:   Option<String>,
  pub start_time:  DateTime<Utc>,
  #[serde(default)]
  pub end_time:    Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub tags:        Vec<String>,
  #[serde(default)]
  pub created_by:  Option<Uuid>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub likes:       i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub shares:      i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub views:       i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub comments:    i64,
  pub created_at:  DateTime<Utc>,
}

impl From<EventRow> for Event {
  fn from(r: EventRow) -> Self {
    Event {
      id:          r.id,
      title:       r.title,
      description: r.description,
      kind:        r.kind,
      media_url:   r.media_url,
      starts_at:   r.start_time,
      ends_at:     r.end_time,
      tags:        r.tags,
      creator_id:  r.created_by,
      engagement:  Engagement {
        likes:    count(r.likes),
        shares:   count(r.shares),
        views:    count(r.views),
        comments: count(r.comments),
      },
      created_at:  r.created_at,
    }
  }
}

impl From<&Event> for EventRow {
  fn from(e: &Event) -> Self {
    EventRow {
      id:          e.id,
      title:       e.title.clone(),
      description: e.description.clone(),
      kind:        e.kind,
      media_url:   e.media_url.clone(),
      start_time:  e.starts_at,
      end_time:    e.ends_at,
      tags:        e.tags.clone(),
      created_by:  e.creator_id,
      likes:       e.engagement.likes.into(),
      shares:      e.engagement.shares.into(),
      views:       e.engagement.views.into(),
      comments:    e.engagement.comments.into(),
      created_at:  e.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCommentRow {
  pub id:         Uuid,
  pub event_id:   Uuid,
  pub user_id:    Uuid,
  pub content:    String,
  pub created_at: DateTime<Utc>,
}

impl From<EventCommentRow> for EventComment {
  fn from(r: EventCommentRow) -> Self {
    EventComment {
      id:         r.id,
      event_id:   r.event_id,
      user_id:    r.user_id,
      body:       r.content,
      created_at: r.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLikeRow {
  pub id:         Uuid,
  pub event_id:   Uuid,
  pub user_id:    Uuid,
  pub created_at: DateTime<Utc>,
}

// ─── friend_requests / friendships ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestRow {
  pub id:          Uuid,
  pub sender_id:   Uuid,
  pub receiver_id: Uuid,
  pub status:      RequestStatus,
  #[serde(default)]
  pub message:     Option<String>,
  pub created_at:  DateTime<Utc>,
  #[serde(default)]
  pub updated_at:  Option<DateTime<Utc>>,
}

impl From<FriendRequestRow> for FriendRequest {
  fn from(r: FriendRequestRow) -> Self {
    FriendRequest {
      id:          r.id,
      sender_id:   r.sender_id,
      receiver_id: r.receiver_id,
      status:      r.status,
      message:     r.message,
      created_at:  r.created_at,
      updated_at:  r.updated_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendshipRow {
  pub id:         Uuid,
  pub user1_id:   Uuid,
  pub user2_id:   Uuid,
  pub created_at: DateTime<Utc>,
}

impl From<FriendshipRow> for Friendship {
  fn from(r: FriendshipRow) -> Self {
    Friendship {
      id:         r.id,
      user_a:     r.user1_id,
      user_b:     r.user2_id,
      created_at: r.created_at,
    }
  }
}

// ─── notifications ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRow {
  pub id:         Uuid,
  pub user_id:    Uuid,
  #[serde(rename = "type")]
  pub kind:       NotificationKind,
  pub title:      String,
  pub message:    String,
  #[serde(default)]
  pub data:       Value,
  #[serde(default, deserialize_with = "null_as_default")]
  pub read:       bool,
  pub created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
  fn from(r: NotificationRow) -> Self {
    Notification {
      id:         r.id,
      user_id:    r.user_id,
      kind:       r.kind,
      title:      r.title,
      message:    r.message,
      data:       r.data,
      read:       r.read,
      created_at: r.created_at,
    }
  }
}

// ─── channels ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelRow {
  pub id:            Uuid,
  pub name:          String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description:   String,
  pub status:        ChannelStatus,
  #[serde(default, deserialize_with = "null_as_default")]
  pub category:      String,
  #[serde(default)]
  pub start_time:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub thumbnail_url: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub viewer_count:  i64,
}

impl From<ChannelRow> for Channel {
  fn from(r: ChannelRow) -> Self {
    Channel {
      id:            r.id,
      name:          r.name,
      description:   r.description,
      status:        r.status,
      category:      r.category,
      starts_at:     r.start_time,
      thumbnail_url: r.thumbnail_url,
      viewers:       count(r.viewer_count),
    }
  }
}

impl From<&Channel> for ChannelRow {
  fn from(c: &Channel) -> Self {
    ChannelRow {
      id:            c.id,
      name:          c.name.clone(),
      description:   c.description.clone(),
      status:        c.status,
      category:      c.category.clone(),
      start_time:    c.starts_at,
      thumbnail_url: c.thumbnail_url.clone(),
      viewer_count:  c.viewers.into(),
    }
  }
}

// ─── profiles / achievements ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
  pub id:                  Uuid,
  #[serde(default)]
  pub display_name:        Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub points:              i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub streak:              i64,
  #[serde(default)]
  pub last_login_bonus_on: Option<NaiveDate>,
}

impl From<ProfileRow> for Profile {
  fn from(r: ProfileRow) -> Self {
    Profile {
      user_id:             r.id,
      display_name:        r.display_name,
      points:              count(r.points),
      streak:              count(r.streak),
      last_login_bonus_on: r.last_login_bonus_on,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementRow {
  pub key:         String,
  pub title:       String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub points:      i64,
}

impl From<AchievementRow> for Achievement {
  fn from(r: AchievementRow) -> Self {
    Achievement {
      key:         r.key,
      title:       r.title,
      description: r.description,
      points:      count(r.points),
    }
  }
}

impl From<&Achievement> for AchievementRow {
  fn from(a: &Achievement) -> Self {
    AchievementRow {
      key:         a.key.clone(),
      title:       a.title.clone(),
      description: a.description.clone(),
      points:      a.points.into(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAchievementRow {
  pub user_id:         Uuid,
  pub achievement_key: String,
  pub unlocked_at:     DateTime<Utc>,
}

// ─── referrals ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralRow {
  pub id:           Uuid,
  pub referrer_id:  Uuid,
  #[serde(default)]
  pub referred_id:  Option<Uuid>,
  pub code:         String,
  pub status:       ReferralStatus,
  pub created_at:   DateTime<Utc>,
  #[serde(default)]
  pub completed_at: Option<DateTime<Utc>>,
}

impl From<ReferralRow> for Referral {
  fn from(r: ReferralRow) -> Self {
    Referral {
      id:           r.id,
      referrer_id:  r.referrer_id,
      referred_id:  r.referred_id,
      code:         r.code,
      status:       r.status,
      created_at:   r.created_at,
      completed_at: r.completed_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralCodeRow {
  pub id:         Uuid,
  pub user_id:    Uuid,
  pub code:       String,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn devotional_row_maps_split_verse_and_flag() {
    let row = json!({
      "id": Uuid::nil(),
      "title": "T",
      "verse": "John 3:16",
      "verse_text": "For God so loved the world",
      "content": "c",
      "is_public": true,
      "likes": -4,
      "created_at": "2024-01-01T00:00:00Z",
    });
    let row: DevotionalRow = decode(DEVOTIONALS, row.as_object().cloned().unwrap()).unwrap();
    let dev = Devotional::from(row);

    assert_eq!(dev.verse.reference, "John 3:16");
    assert_eq!(dev.verse.text, "For God so loved the world");
    assert_eq!(dev.visibility, Visibility::Public);
    assert_eq!(dev.engagement.likes, 0, "negative counters clamp to zero");
    assert!(dev.author_id.is_none());
  }

  #[test]
  fn devotional_round_trips_through_row() {
    let row = json!({
      "id": Uuid::from_u128(7),
      "user_id": Uuid::from_u128(8),
      "title": "T",
      "verse": "Ps 23:1",
      "verse_text": "The Lord is my shepherd",
      "content": "c",
      "created_at": "2024-01-01T00:00:00Z",
    });
    let dev: Devotional =
      decode::<DevotionalRow>(DEVOTIONALS, row.as_object().cloned().unwrap())
        .unwrap()
        .into();
    let encoded = encode(&DevotionalRow::from(&dev)).unwrap();
    assert_eq!(encoded["verse_text"], json!("The Lord is my shepherd"));
    assert_eq!(encoded["is_public"], json!(false));
    assert_eq!(encoded["user_id"], json!(Uuid::from_u128(8)));
  }

  #[test]
  fn plan_days_are_sorted_on_read() {
    let row = json!({
      "id": Uuid::nil(),
      "title": "P",
      "duration": 2,
      "readings": [
        { "day": 2, "title": "b", "passages": [] },
        { "day": 1, "title": "a", "passages": [] },
      ],
      "created_at": "2024-01-01T00:00:00Z",
    });
    let plan: ReadingPlan =
      decode::<ReadingPlanRow>(READING_PLANS, row.as_object().cloned().unwrap())
        .unwrap()
        .into();
    let order: Vec<u32> = plan.days.iter().map(|d| d.day).collect();
    assert_eq!(order, vec![1, 2]);
  }

  #[test]
  fn null_columns_decode_as_defaults() {
    let row = json!({
      "id": Uuid::nil(),
      "title": "T",
      "verse": "John 1:5",
      "verse_text": "The light shines in the darkness",
      "content": "c",
      "is_public": null,
      "likes": null,
      "shares": null,
      "views": null,
      "comments": null,
      "tags": null,
      "created_at": "2024-01-01T00:00:00Z",
    });
    let dev: Devotional =
      decode::<DevotionalRow>(DEVOTIONALS, row.as_object().cloned().unwrap())
        .unwrap()
        .into();
    assert_eq!(dev.engagement, Engagement::default());
    assert!(dev.tags.is_empty());
    assert_eq!(dev.visibility, Visibility::Private);

    let row = json!({
      "id": Uuid::nil(),
      "title": "P",
      "description": null,
      "duration": 3,
      "difficulty": null,
      "readings": null,
      "participants": null,
      "rating": null,
      "created_at": "2024-01-01T00:00:00Z",
    });
    let plan: ReadingPlan =
      decode::<ReadingPlanRow>(READING_PLANS, row.as_object().cloned().unwrap())
        .unwrap()
        .into();
    assert!(plan.days.is_empty() && plan.description.is_empty());
    assert_eq!(plan.difficulty, Difficulty::default());

    let row = json!({ "id": Uuid::nil(), "points": null, "streak": null });
    let profile: Profile = decode::<ProfileRow>(PROFILES, row.as_object().cloned().unwrap())
      .unwrap()
      .into();
    assert_eq!(profile.points, 0);
  }

  #[test]
  fn malformed_rows_report_their_table() {
    let err = decode::<EventRow>(EVENTS, Row::new()).unwrap_err();
    assert!(matches!(err, Error::Decode { table: EVENTS, .. }));
  }
}
