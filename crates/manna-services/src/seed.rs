//! Bundled datasets.
//!
//! These are served verbatim when a remote read fails, and double as the
//! rows [`install`] writes into an empty local store. Ids and timestamps are
//! fixed so a fallback response is identical on every call.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use manna_core::{
  Error, Result,
  channel::{Channel, ChannelStatus},
  devotional::{Devotional, Engagement, Scripture, Visibility},
  event::{Event, EventKind},
  plan::{Difficulty, PlanDay, ReadingPlan},
  profile::Achievement,
  store::{Query, RemoteStore, Row},
};
use uuid::Uuid;

use crate::rows::{self, AchievementRow, ChannelRow, DevotionalRow, EventRow, ReadingPlanRow};

fn at(secs: i64) -> DateTime<Utc> { DateTime::from_timestamp(secs, 0).unwrap_or_default() }

/// 2024-01-01T00:00:00Z
const EPOCH: i64 = 1_704_067_200;
const DAY: i64 = 86_400;

fn scripture(reference: &str, text: &str) -> Scripture {
  Scripture {
    reference: reference.to_owned(),
    text:      text.to_owned(),
  }
}

fn tags(list: &[&str]) -> Vec<String> { list.iter().map(|t| (*t).to_owned()).collect() }

// ─── Verses ──────────────────────────────────────────────────────────────────

pub static VERSES: LazyLock<Vec<Scripture>> = LazyLock::new(|| {
  [
    ("John 3:16", "For God so loved the world, that he gave his only begotten Son, that whosoever believeth in him should not perish, but have everlasting life."),
    ("Psalm 23:1", "The LORD is my shepherd; I shall not want."),
    ("Proverbs 3:5", "Trust in the LORD with all thine heart; and lean not unto thine own understanding."),
    ("Philippians 4:13", "I can do all things through Christ which strengtheneth me."),
    ("Isaiah 40:31", "But they that wait upon the LORD shall renew their strength; they shall mount up with wings as eagles; they shall run, and not be weary; and they shall walk, and not faint."),
    ("Romans 8:28", "And we know that all things work together for good to them that love God, to them who are the called according to his purpose."),
    ("Joshua 1:9", "Be strong and of a good courage; be not afraid, neither be thou dismayed: for the LORD thy God is with thee whithersoever thou goest."),
    ("Matthew 11:28", "Come unto me, all ye that labour and are heavy laden, and I will give you rest."),
    ("Psalm 46:10", "Be still, and know that I am God."),
    ("Lamentations 3:22-23", "It is of the LORD's mercies that we are not consumed, because his compassions fail not. They are new every morning: great is thy faithfulness."),
    ("2 Corinthians 5:17", "Therefore if any man be in Christ, he is a new creature: old things are passed away; behold, all things are become new."),
    ("Micah 6:8", "He hath shewed thee, O man, what is good; and what doth the LORD require of thee, but to do justly, and to love mercy, and to walk humbly with thy God?"),
  ]
  .into_iter()
  .map(|(r, t)| scripture(r, t))
  .collect()
});

// ─── Devotionals ─────────────────────────────────────────────────────────────

fn sample_devotional(
  n: u128,
  title: &str,
  verse: usize,
  content: &str,
  prayer: &str,
  tag_list: &[&str],
) -> Devotional {
  Devotional {
    id:          Uuid::from_u128(0xd0_0000 + n),
    author_id:   None,
    author_name: Some("Manna Team".to_owned()),
    title:       title.to_owned(),
    verse:       VERSES[verse].clone(),
    content:     content.to_owned(),
    prayer:      Some(prayer.to_owned()),
    application: None,
    reflection:  None,
    visibility:  Visibility::Public,
    engagement:  Engagement::default(),
    tags:        tags(tag_list),
    created_at:  at(EPOCH + DAY * n as i64),
    updated_at:  None,
  }
}

pub static DEVOTIONALS: LazyLock<Vec<Devotional>> = LazyLock::new(|| {
  vec![
    sample_devotional(
      1,
      "Loved Before We Loved",
      0,
      "Love did not wait for us to become lovable. It moved first, and it moved at great cost.",
      "Father, let me rest today in a love I did not earn.",
      &["love", "grace"],
    ),
    sample_devotional(
      2,
      "The Shepherd Who Provides",
      1,
      "A sheep does not plan tomorrow's pasture. It follows the one who already knows the way.",
      "Lord, teach me to follow instead of fret.",
      &["trust", "provision"],
    ),
    sample_devotional(
      3,
      "Leaning on a Better Understanding",
      2,
      "Our understanding is a good servant and a poor foundation. Trust puts weight on something sturdier.",
      "God, I hand you the parts of today I cannot figure out.",
      &["trust", "wisdom"],
    ),
    sample_devotional(
      4,
      "Strength for the Long Walk",
      4,
      "Some days call for soaring, most call for walking. Both are held by the same strength.",
      "Renew my strength for ordinary faithfulness.",
      &["strength", "waiting"],
    ),
    sample_devotional(
      5,
      "Mercies at Sunrise",
      9,
      "Yesterday's failures do not get the last word. Each morning arrives carrying fresh mercy.",
      "Thank you for mercies that are new this morning.",
      &["mercy", "morning"],
    ),
  ]
});

// ─── Reading plans ───────────────────────────────────────────────────────────

fn plan_day(day: u32, title: &str, passages: &[&str]) -> PlanDay {
  PlanDay {
    day,
    title: title.to_owned(),
    passages: tags(passages),
    devotional: None,
    completed: false,
  }
}

pub static READING_PLANS: LazyLock<Vec<ReadingPlan>> = LazyLock::new(|| {
  vec![
    ReadingPlan {
      id:            Uuid::from_u128(0x91_0001),
      author_id:     None,
      title:         "Gospel of John in 7 Days".to_owned(),
      description:   "Walk through the fourth gospel in a week.".to_owned(),
      duration_days: 7,
      difficulty:    Difficulty::Beginner,
      days:          vec![
        plan_day(1, "The Word Made Flesh", &["John 1-3"]),
        plan_day(2, "Living Water", &["John 4-6"]),
        plan_day(3, "The Light of the World", &["John 7-9"]),
        plan_day(4, "The Good Shepherd", &["John 10-12"]),
        plan_day(5, "The Upper Room", &["John 13-15"]),
        plan_day(6, "The Prayer and the Cross", &["John 16-19"]),
        plan_day(7, "He Is Risen", &["John 20-21"]),
      ],
      participants:  0,
      rating:        4.8,
      created_at:    at(EPOCH),
    },
    ReadingPlan {
      id:            Uuid::from_u128(0x91_0002),
      author_id:     None,
      title:         "Psalms of Comfort".to_owned(),
      description:   "Five psalms for anxious seasons.".to_owned(),
      duration_days: 5,
      difficulty:    Difficulty::Beginner,
      days:          vec![
        plan_day(1, "The Shepherd", &["Psalm 23"]),
        plan_day(2, "Refuge", &["Psalm 46"]),
        plan_day(3, "Dwelling", &["Psalm 91"]),
        plan_day(4, "Help", &["Psalm 121"]),
        plan_day(5, "Known", &["Psalm 139"]),
      ],
      participants:  0,
      rating:        4.7,
      created_at:    at(EPOCH + DAY),
    },
    ReadingPlan {
      id:            Uuid::from_u128(0x91_0003),
      author_id:     None,
      title:         "Romans Deep Dive".to_owned(),
      description:   "A careful read of Paul's letter to the Romans.".to_owned(),
      duration_days: 4,
      difficulty:    Difficulty::Advanced,
      days:          vec![
        plan_day(1, "The Problem", &["Romans 1-3"]),
        plan_day(2, "Justified by Faith", &["Romans 4-6"]),
        plan_day(3, "Life in the Spirit", &["Romans 7-8"]),
        plan_day(4, "Living Sacrifices", &["Romans 12-16"]),
      ],
      participants:  0,
      rating:        4.9,
      created_at:    at(EPOCH + 2 * DAY),
    },
  ]
});

// ─── Events ──────────────────────────────────────────────────────────────────

pub static EVENTS: LazyLock<Vec<Event>> = LazyLock::new(|| {
  let event = |n: u128, title: &str, description: &str, kind, url: &str, tag_list: &[&str]| Event {
    id:          Uuid::from_u128(0xe0_0000 + n),
    title:       title.to_owned(),
    description: description.to_owned(),
    kind,
    media_url:   Some(url.to_owned()),
    starts_at:   at(EPOCH + DAY * (10 + n as i64)),
    ends_at:     None,
    tags:        tags(tag_list),
    creator_id:  None,
    engagement:  Engagement::default(),
    created_at:  at(EPOCH),
  };
  vec![
    event(
      1,
      "Morning Worship",
      "A short set of songs to start the day.",
      EventKind::Video,
      "https://media.manna.app/worship/morning.mp4",
      &["worship", "music"],
    ),
    event(
      2,
      "Midweek Bible Study: James",
      "Live study through the letter of James.",
      EventKind::Live,
      "https://media.manna.app/live/james",
      &["study", "live"],
    ),
    event(
      3,
      "How to Start a Prayer Journal",
      "Practical steps for keeping a prayer journal.",
      EventKind::Article,
      "https://manna.app/articles/prayer-journal",
      &["prayer", "habits"],
    ),
  ]
});

// ─── Channels ────────────────────────────────────────────────────────────────

pub static CHANNELS: LazyLock<Vec<Channel>> = LazyLock::new(|| {
  let channel = |n: u128, name: &str, description: &str, status, category: &str, viewers| Channel {
    id: Uuid::from_u128(0xc0_0000 + n),
    name: name.to_owned(),
    description: description.to_owned(),
    status,
    category: category.to_owned(),
    starts_at: Some(at(EPOCH + DAY * n as i64)),
    thumbnail_url: None,
    viewers,
  };
  vec![
    channel(1, "Sunday Service", "Weekly service broadcast.", ChannelStatus::Live, "worship", 120),
    channel(2, "Youth Night", "Music and teaching for students.", ChannelStatus::Upcoming, "youth", 0),
    channel(3, "Hymn Stories", "The history behind classic hymns.", ChannelStatus::Recorded, "music", 0),
    channel(4, "Prayer Room", "Open prayer, around the clock.", ChannelStatus::Offline, "prayer", 0),
  ]
});

// ─── Achievements ────────────────────────────────────────────────────────────

pub static ACHIEVEMENTS: LazyLock<Vec<Achievement>> = LazyLock::new(|| {
  [
    ("first_login", "Welcome", "Signed in for the first time.", 10),
    ("first_devotional", "First Words", "Wrote your first devotional.", 25),
    ("plan_started", "On the Path", "Started a reading plan.", 15),
    ("plan_completed", "Finisher", "Completed a reading plan.", 50),
    ("streak_7", "Faithful Week", "Signed in seven days in a row.", 70),
    ("first_friend", "Fellowship", "Made your first friend.", 20),
  ]
  .into_iter()
  .map(|(key, title, description, points)| Achievement {
    key: key.to_owned(),
    title: title.to_owned(),
    description: description.to_owned(),
    points,
  })
  .collect()
});

async fn fill<S: RemoteStore>(store: &S, table: &'static str, rows: Vec<Row>) -> Result<usize> {
  let present = store
    .select(table, &Query::new().limit(1))
    .await
    .map_err(Error::remote)?;
  if !present.is_empty() {
    tracing::debug!(table, "already seeded");
    return Ok(0);
  }
  let n = rows.len();
  for row in rows {
    store.insert(table, row).await.map_err(Error::remote)?;
  }
  tracing::info!(table, rows = n, "seeded");
  Ok(n)
}

/// Write the bundled datasets into `store`. Tables that already hold rows
/// are left alone. Returns the number of rows written.
pub async fn install<S: RemoteStore>(store: &S) -> Result<usize> {
  let devotionals = DEVOTIONALS
    .iter()
    .map(|d| rows::encode(&DevotionalRow::from(d)))
    .collect::<Result<_>>()?;
  let plans = READING_PLANS
    .iter()
    .map(|p| rows::encode(&ReadingPlanRow::from(p)))
    .collect::<Result<_>>()?;
  let events = EVENTS
    .iter()
    .map(|e| rows::encode(&EventRow::from(e)))
    .collect::<Result<_>>()?;
  let channels = CHANNELS
    .iter()
    .map(|c| rows::encode(&ChannelRow::from(c)))
    .collect::<Result<_>>()?;
  let achievements = ACHIEVEMENTS
    .iter()
    .map(|a| rows::encode(&AchievementRow::from(a)))
    .collect::<Result<_>>()?;

  Ok(
    fill(store, rows::DEVOTIONALS, devotionals).await?
      + fill(store, rows::READING_PLANS, plans).await?
      + fill(store, rows::EVENTS, events).await?
      + fill(store, rows::CHANNELS, channels).await?
      + fill(store, rows::ACHIEVEMENTS, achievements).await?,
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_are_unique_per_dataset() {
    let mut ids: Vec<Uuid> = DEVOTIONALS
      .iter()
      .map(|d| d.id)
      .chain(READING_PLANS.iter().map(|p| p.id))
      .chain(EVENTS.iter().map(|e| e.id))
      .chain(CHANNELS.iter().map(|c| c.id))
      .collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
  }

  #[test]
  fn plan_days_fit_their_duration() {
    for plan in READING_PLANS.iter() {
      assert_eq!(plan.days.len() as u32, plan.duration_days, "{}", plan.title);
      assert!(plan.days.windows(2).all(|w| w[0].day < w[1].day));
    }
  }

  #[test]
  fn bundled_devotionals_are_public() {
    assert!(DEVOTIONALS.iter().all(|d| d.visibility.is_public()));
  }
}
