use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::entry::Entry;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JournalStats {
    pub total_entries: usize,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub weekly_count: usize,
}

/// Streaks count consecutive UTC calendar days with at least one entry.
pub fn compute_stats(entries: &[Entry], now: DateTime<Utc>) -> JournalStats {
    let week_ago = now - Duration::days(7);
    let weekly_count = entries
        .iter()
        .filter(|entry| entry.timestamp >= week_ago)
        .count();

    let mut days = entries
        .iter()
        .map(|entry| entry.timestamp.date_naive())
        .collect::<Vec<NaiveDate>>();
    days.sort_unstable();
    days.dedup();

    let mut run = 0u32;
    let mut longest_streak = 0u32;
    let mut last_day: Option<NaiveDate> = None;
    for day in days {
        run = match last_day {
            Some(previous) if (day - previous).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest_streak = longest_streak.max(run);
        last_day = Some(day);
    }

    let current_streak = match last_day {
        Some(day) if (now.date_naive() - day).num_days() <= 1 => run,
        _ => 0,
    };

    JournalStats {
        total_entries: entries.len(),
        current_streak,
        longest_streak,
        weekly_count,
    }
}

/// Entry count for one UTC calendar month.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

impl MonthCount {
    /// `"May 2025"` style label.
    pub fn label(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|first| first.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{}-{:02}", self.year, self.month))
    }
}

/// Per-month entry counts, newest month first.
pub fn monthly_counts(entries: &[Entry]) -> Vec<MonthCount> {
    let mut months = BTreeMap::<(i32, u32), usize>::new();
    for entry in entries {
        let key = (entry.timestamp.year(), entry.timestamp.month());
        *months.entry(key).or_default() += 1;
    }

    months
        .into_iter()
        .rev()
        .map(|((year, month), count)| MonthCount { year, month, count })
        .collect()
}
