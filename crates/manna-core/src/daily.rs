//! Calendar-day selection for "of the day" content.
//!
//! The pick is `day_of_year mod len`, so every user sees the same item on a
//! given calendar date without any server coordination.

use chrono::{Datelike, NaiveDate};

/// Index into a dataset of length `len` for `date`. `None` when `len == 0`.
pub fn daily_index(date: NaiveDate, len: usize) -> Option<usize> {
  (len > 0).then(|| date.ordinal() as usize % len)
}

/// The item of the day from `items`.
pub fn pick_for_day<T>(date: NaiveDate, items: &[T]) -> Option<&T> {
  daily_index(date, items.len()).map(|i| &items[i])
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveTime, TimeZone, Utc};

  use super::*;

  #[test]
  fn same_day_same_pick() {
    let items = ["a", "b", "c", "d", "e"];
    let morning = Utc
      .from_utc_datetime(&NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_time(NaiveTime::MIN));
    let night = morning + chrono::Duration::hours(23) + chrono::Duration::minutes(59);

    assert_eq!(
      pick_for_day(morning.date_naive(), &items),
      pick_for_day(night.date_naive(), &items),
    );
  }

  #[test]
  fn index_is_ordinal_mod_len() {
    // 2024-02-01 is ordinal 32.
    let d = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    assert_eq!(daily_index(d, 5), Some(2));
    assert_eq!(daily_index(d, 32), Some(0));
  }

  #[test]
  fn consecutive_days_rotate() {
    let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let next = d.succ_opt().unwrap();
    assert_ne!(daily_index(d, 7), daily_index(next, 7));
  }

  #[test]
  fn empty_dataset_has_no_pick() {
    let d = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert_eq!(pick_for_day::<u8>(d, &[]), None);
  }
}
