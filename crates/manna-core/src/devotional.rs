//! Devotionals: user-written reflections anchored on a scripture passage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Shared value types ──────────────────────────────────────────────────────

/// A scripture passage: where it is found and what it says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scripture {
  /// e.g. `"John 3:16"`.
  pub reference: String,
  pub text:      String,
}

/// Engagement counters. Never negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
  pub likes:    u32,
  pub shares:   u32,
  pub views:    u32,
  pub comments: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
  Public,
  #[default]
  Private,
}

impl Visibility {
  pub fn is_public(self) -> bool { matches!(self, Visibility::Public) }

  pub fn from_public_flag(is_public: bool) -> Self {
    if is_public { Visibility::Public } else { Visibility::Private }
  }
}

// ─── Devotional ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Devotional {
  pub id:          Uuid,
  /// `None` for bundled sample content.
  pub author_id:   Option<Uuid>,
  pub author_name: Option<String>,
  pub title:       String,
  pub verse:       Scripture,
  pub content:     String,
  pub prayer:      Option<String>,
  pub application: Option<String>,
  pub reflection:  Option<String>,
  pub visibility:  Visibility,
  pub engagement:  Engagement,
  pub tags:        Vec<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  Option<DateTime<Utc>>,
}

impl Devotional {
  /// Public devotionals are readable by anyone; private ones by their author
  /// only.
  pub fn is_visible_to(&self, viewer: Option<Uuid>) -> bool {
    self.visibility.is_public()
      || (self.author_id.is_some() && self.author_id == viewer)
  }

  pub fn is_owned_by(&self, user: Uuid) -> bool { self.author_id == Some(user) }
}

/// Input for creating a devotional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevotional {
  pub title:       String,
  pub verse:       Scripture,
  pub content:     String,
  #[serde(default)]
  pub prayer:      Option<String>,
  #[serde(default)]
  pub application: Option<String>,
  #[serde(default)]
  pub reflection:  Option<String>,
  #[serde(default)]
  pub visibility:  Visibility,
  #[serde(default)]
  pub tags:        Vec<String>,
}

impl NewDevotional {
  /// Names (in remote-column spelling) of required fields that are blank.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    [
      ("title", &self.title),
      ("verse", &self.verse.reference),
      ("verse_text", &self.verse.text),
      ("content", &self.content),
    ]
    .into_iter()
    .filter(|(_, v)| v.trim().is_empty())
    .map(|(name, _)| name)
    .collect()
  }

  pub fn validate(&self) -> Result<()> {
    let missing = self.missing_fields();
    if missing.is_empty() { Ok(()) } else { Err(Error::MissingFields(missing)) }
  }
}

/// Partial update applied by the devotional's owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevotionalPatch {
  pub title:       Option<String>,
  pub content:     Option<String>,
  pub prayer:      Option<String>,
  pub application: Option<String>,
  pub reflection:  Option<String>,
  pub visibility:  Option<Visibility>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn draft() -> NewDevotional {
    NewDevotional {
      title:       "T".into(),
      verse:       Scripture {
        reference: "John 3:16".into(),
        text:      "For God so loved the world".into(),
      },
      content:     "...".into(),
      prayer:      None,
      application: None,
      reflection:  None,
      visibility:  Visibility::Public,
      tags:        vec![],
    }
  }

  #[test]
  fn complete_draft_validates() {
    assert!(draft().validate().is_ok());
  }

  #[test]
  fn blank_fields_are_reported_by_column_name() {
    let mut d = draft();
    d.title = "  ".into();
    d.verse.text = String::new();
    assert_eq!(d.missing_fields(), vec!["title", "verse_text"]);
    assert!(matches!(d.validate(), Err(Error::MissingFields(f)) if f.len() == 2));
  }

  #[test]
  fn visibility_gates_readers() {
    let owner = Uuid::new_v4();
    let other = Uuid::new_v4();
    let mut dev = Devotional {
      id:          Uuid::new_v4(),
      author_id:   Some(owner),
      author_name: None,
      title:       "T".into(),
      verse:       draft().verse,
      content:     "c".into(),
      prayer:      None,
      application: None,
      reflection:  None,
      visibility:  Visibility::Private,
      engagement:  Engagement::default(),
      tags:        vec![],
      created_at:  Utc::now(),
      updated_at:  None,
    };

    assert!(dev.is_visible_to(Some(owner)));
    assert!(!dev.is_visible_to(Some(other)));
    assert!(!dev.is_visible_to(None));

    dev.visibility = Visibility::Public;
    assert!(dev.is_visible_to(None));
  }
}
