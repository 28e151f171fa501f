//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use manna_core::{
  channel::{Channel, ChannelStatus},
  devotional::{Devotional, Scripture},
  event::Event,
  plan::ReadingPlan,
  profile::DailyClaim,
};
use manna_services::context::{Theme, UserData};

pub fn verse(v: &Scripture) -> String { format!("{}\n  {}", v.text, v.reference) }

pub fn devotional(d: &Devotional) -> String {
  let mut out = format!("{}\n{}\n\n{}\n", d.title, verse(&d.verse), d.content);
  for (label, section) in [
    ("Reflection", &d.reflection),
    ("Application", &d.application),
    ("Prayer", &d.prayer),
  ] {
    if let Some(text) = section {
      let _ = write!(out, "\n{label}: {text}\n");
    }
  }
  if let Some(author) = &d.author_name {
    let _ = write!(out, "\n- {author}, {}\n", d.created_at.format("%B %-d, %Y"));
  }
  out
}

pub fn plans(plans: &[ReadingPlan]) -> String {
  let mut out = String::new();
  for p in plans {
    let _ = writeln!(
      out,
      "{:<32} {:>3} days  {:?}  {}",
      p.title,
      p.duration_days,
      p.difficulty,
      p.id
    );
  }
  out
}

pub fn events(events: &[Event]) -> String {
  let mut out = String::new();
  for e in events {
    let tags = if e.tags.is_empty() {
      String::new()
    } else {
      format!("  [{}]", e.tags.join(", "))
    };
    let _ = writeln!(
      out,
      "{}  {}{tags}",
      e.starts_at.format("%Y-%m-%d %H:%M"),
      e.title
    );
  }
  out
}

fn status_label(s: ChannelStatus) -> &'static str {
  match s {
    ChannelStatus::Live => "LIVE",
    ChannelStatus::Upcoming => "soon",
    ChannelStatus::Recorded => "vod",
    ChannelStatus::Offline => "off",
  }
}

pub fn channels(channels: &[Channel]) -> String {
  let mut out = String::new();
  for c in channels {
    let _ = writeln!(
      out,
      "[{:<4}] {:<28} {:<10} {} watching",
      status_label(c.status),
      c.name,
      c.category,
      c.viewers
    );
  }
  out
}

pub fn user(data: &UserData) -> String {
  let p = &data.profile;
  let mut out = format!(
    "Level {}  ({} points, {} to next)\nStreak: {} day(s)\nUnread notifications: {}\n",
    data.level,
    p.points,
    p.points_to_next_level(),
    p.streak,
    data.unread
  );
  if !data.achievements.is_empty() {
    out.push_str("Achievements:\n");
    for a in &data.achievements {
      let _ = writeln!(out, "  * {} (+{})", a.achievement.title, a.achievement.points);
    }
  }
  out
}

pub fn claim(c: &DailyClaim) -> String {
  if c.awarded {
    format!(
      "+{} points! Total {}, streak {} day(s).",
      c.points_awarded, c.total_points, c.streak
    )
  } else {
    format!("Already claimed today. Total {} points.", c.total_points)
  }
}

pub fn theme(t: Theme) -> &'static str {
  match t {
    Theme::Light => "light",
    Theme::Dark => "dark",
    Theme::System => "system",
  }
}

#[cfg(test)]
mod tests {
  use manna_core::profile::Profile;
  use manna_services::seed;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn devotional_shows_verse_and_sections() {
    let d = &seed::DEVOTIONALS[0];
    let text = devotional(d);
    assert!(text.starts_with(&d.title));
    assert!(text.contains(&d.verse.reference));
    if let Some(p) = &d.prayer {
      assert!(text.contains(p));
    }
  }

  #[test]
  fn channel_rows_flag_live() {
    let text = channels(&seed::CHANNELS);
    assert_eq!(text.lines().count(), seed::CHANNELS.len());
    assert!(text.lines().next().unwrap().starts_with("[LIVE]"));
  }

  #[test]
  fn user_summary() {
    let mut profile = Profile::empty(Uuid::nil());
    profile.points = 130;
    let data = UserData {
      level:        profile.level(),
      profile,
      achievements: Vec::new(),
      unread:       2,
    };
    let text = user(&data);
    assert!(text.starts_with("Level 2  (130 points, 70 to next)"));
    assert!(text.contains("Unread notifications: 2"));
  }

  #[test]
  fn claims_read_naturally() {
    let awarded = DailyClaim {
      awarded:        true,
      points_awarded: 10,
      total_points:   40,
      streak:         3,
    };
    assert_eq!(claim(&awarded), "+10 points! Total 40, streak 3 day(s).");
    let again = DailyClaim {
      awarded: false,
      points_awarded: 0,
      ..awarded
    };
    assert!(claim(&again).starts_with("Already claimed"));
  }
}
