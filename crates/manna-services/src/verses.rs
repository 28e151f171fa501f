//! Verse of the day.

use chrono::NaiveDate;
use manna_core::{daily::pick_for_day, devotional::Scripture};

use crate::seed;

pub type Verse = Scripture;

/// The verse every reader sees on `date`, drawn from the bundled verse
/// table.
pub fn verse_of_day(date: NaiveDate) -> Option<Verse> { pick_for_day(date, &seed::VERSES).cloned() }
