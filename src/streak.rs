//! Contribution streak calculation.
//!
//! Everything here is pure: the same activity map and `today` always give
//! the same summary.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-day activity counts plus the total reported by the data source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionCalendar {
  pub days: BTreeMap<NaiveDate, u32>,
  pub total: u64,
}

impl ContributionCalendar {
  pub fn new(total: u64) -> Self {
    Self {
      days: BTreeMap::new(),
      total,
    }
  }

  /// Record `count` for `date`. Counts for the same day accumulate and
  /// saturate at `u32::MAX`.
  pub fn add(&mut self, date: NaiveDate, count: u32) {
    let day = self.days.entry(date).or_insert(0);
    *day = day.saturating_add(count);
  }

  pub fn streak(&self, today: NaiveDate) -> StreakSummary {
    compute_streak(&self.days, self.total, today)
  }
}

/// Inclusive date range of a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakRange {
  pub start: NaiveDate,
  pub end: NaiveDate,
}

/// Current and longest streak over an activity calendar.
///
/// `current_range` is present exactly when `current_streak > 0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StreakSummary {
  pub current_streak: u32,
  pub longest_streak: u32,
  pub total_contributions: u64,
  pub current_range: Option<StreakRange>,
}

/// Compute streaks from a sparse date -> count map.
///
/// Days with a zero count and days after `today` are ignored. A streak that
/// ended yesterday still counts as current, since today's activity may not
/// be recorded yet. `total_contributions` is passed through as reported by
/// the data source.
pub fn compute_streak(
  activity: &BTreeMap<NaiveDate, u32>,
  total_contributions: u64,
  today: NaiveDate,
) -> StreakSummary {
  let mut longest = 0;
  let mut run = 0;
  let mut last: Option<NaiveDate> = None;

  for (&date, _) in activity.range(..=today).filter(|&(_, &count)| count > 0) {
    run = match last {
      Some(prev) if prev.succ_opt() == Some(date) => run + 1,
      _ => 1,
    };
    longest = longest.max(run);
    last = Some(date);
  }

  let current_range = last
    .filter(|end| *end == today || end.succ_opt() == Some(today))
    .map(|end| StreakRange {
      start: end - Duration::days(i64::from(run) - 1),
      end,
    });

  StreakSummary {
    current_streak: if current_range.is_some() { run } else { 0 },
    longest_streak: longest,
    total_contributions,
    current_range,
  }
}

/// Contribution count recorded for `today`.
pub fn today_count(activity: &BTreeMap<NaiveDate, u32>, today: NaiveDate) -> u32 {
  activity.get(&today).copied().unwrap_or(0)
}

/// Encouragement tier for the number of contributions made today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cheer {
  None,
  Nice,
  Awesome,
  Great,
  Excellent,
  Outstanding,
}

impl Cheer {
  pub fn for_count(count: u32) -> Self {
    match count {
      0 => Cheer::None,
      1 => Cheer::Nice,
      2..=5 => Cheer::Awesome,
      6..=7 => Cheer::Great,
      8..=9 => Cheer::Excellent,
      _ => Cheer::Outstanding,
    }
  }

  pub fn message(&self) -> &'static str {
    match self {
      Cheer::None => "No contributions today",
      Cheer::Nice => "Nice work!",
      Cheer::Awesome => "Awesome work!",
      Cheer::Great => "Great work!",
      Cheer::Excellent => "Excellent work!",
      Cheer::Outstanding => "Outstanding work!",
    }
  }
}
