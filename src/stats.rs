//! Aggregates over one user's entries. Everything here is a pure function of
//! the entry list and an explicit clock reading.

use crate::journal_entry::Entry;
use chrono::{DateTime, Duration, Local, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

pub const WINDOW_DAYS: i64 = 7;

/// Entries dated within the last seven days up to `now`. Undated and
/// future-dated entries fall outside the window.
pub fn weekly_window(entries: &[Entry], now: DateTime<Local>) -> Vec<&Entry> {
    let now = now.fixed_offset();
    let cutoff = now - Duration::days(WINDOW_DAYS);
    entries
        .iter()
        .filter(|e| {
            e.date
                .timestamp()
                .is_some_and(|ts| ts >= cutoff && ts <= now)
        })
        .collect()
}

pub fn weekly_count(entries: &[Entry], now: DateTime<Local>) -> usize {
    weekly_window(entries, now).len()
}

/// Mood label (as stored, case-sensitive) to number of entries in the window.
pub fn mood_distribution(entries: &[Entry], now: DateTime<Local>) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for entry in weekly_window(entries, now) {
        *distribution.entry(entry.mood.clone()).or_insert(0) += 1;
    }
    distribution
}

/// Mean sentiment over window entries that have journal text and a score.
/// `None` means there was nothing to average, which is distinct from a
/// neutral 0.0.
pub fn avg_sentiment(entries: &[Entry], now: DateTime<Local>) -> Option<f64> {
    let scores: Vec<f64> = weekly_window(entries, now)
        .into_iter()
        .filter(|e| e.has_journal())
        .filter_map(|e| e.sentiment)
        .filter(|s| s.is_finite())
        .collect();

    if scores.is_empty() {
        None
    } else {
        Some(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}

pub fn exercises_done(entries: &[Entry], now: DateTime<Local>) -> usize {
    weekly_window(entries, now)
        .into_iter()
        .filter(|e| e.has_exercise())
        .count()
}

/// Consecutive calendar days ending at `today` with at least one entry.
/// Several entries on one day count once.
pub fn streak_days(entries: &[Entry], today: NaiveDate) -> u32 {
    let days: BTreeSet<NaiveDate> = entries.iter().filter_map(|e| e.date.local_day()).collect();

    let mut streak = 0;
    let mut day = today;
    while days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(prev) => day = prev,
            None => break,
        }
    }
    streak
}

/// Most frequent non-empty mood across all entries; ties go to the label
/// that sorts first.
pub fn most_common_mood(entries: &[Entry]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries.iter().filter(|e| !e.mood.trim().is_empty()) {
        *counts.entry(entry.mood.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(mood, count)| (mood.to_string(), count))
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyStats {
    pub total_entries: usize,
    pub total_all_time: usize,
    pub exercises_done: usize,
    pub avg_sentiment: Option<f64>,
    pub streak_days: u32,
    pub mood_distribution: BTreeMap<String, usize>,
}

impl WeeklyStats {
    pub fn compute(entries: &[Entry], now: DateTime<Local>) -> Self {
        WeeklyStats {
            total_entries: weekly_count(entries, now),
            total_all_time: entries.len(),
            exercises_done: exercises_done(entries, now),
            avg_sentiment: avg_sentiment(entries, now),
            streak_days: streak_days(entries, now.date_naive()),
            mood_distribution: mood_distribution(entries, now),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub name: &'static str,
    pub icon: &'static str,
    pub description: String,
}

pub fn achievements(entries: &[Entry], today: NaiveDate) -> Vec<Achievement> {
    let count = entries.len();
    let mut earned = Vec::new();

    let milestones = [
        (1, "Getting Started", "🌱", "Record your first entry"),
        (7, "Consistent", "📝", "Log 7 entries"),
        (30, "Dedicated", "⭐", "Log 30 entries"),
    ];
    for (needed, name, icon, description) in milestones {
        if count >= needed {
            earned.push(Achievement {
                name,
                icon,
                description: description.to_string(),
            });
        }
    }

    let streak = streak_days(entries, today);
    if streak >= 7 {
        earned.push(Achievement {
            name: "On Fire!",
            icon: "🔥",
            description: format!("{streak} day streak"),
        });
    }
    earned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal_entry::EntryDate;
    use chrono::TimeZone;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn entry_at(days_ago: i64, mood: &str, journal: &str, sentiment: Option<f64>) -> Entry {
        let mut entry = Entry::new("ana", mood.into(), journal.into(), "None".into());
        entry.date = EntryDate::from(now() - Duration::days(days_ago));
        entry.sentiment = sentiment;
        entry
    }

    fn on_days(days_ago: &[i64]) -> Vec<Entry> {
        days_ago
            .iter()
            .map(|d| entry_at(*d, "Calm", "fine", None))
            .collect()
    }

    #[test]
    fn empty_history_yields_zeroes() {
        let stats = WeeklyStats::compute(&[], now());
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_all_time, 0);
        assert_eq!(stats.exercises_done, 0);
        assert_eq!(stats.avg_sentiment, None);
        assert_eq!(stats.streak_days, 0);
        assert!(stats.mood_distribution.is_empty());
        assert!(achievements(&[], now().date_naive()).is_empty());
    }

    #[test]
    fn streak_counts_today_and_yesterday() {
        assert_eq!(streak_days(&on_days(&[0, 1]), now().date_naive()), 2);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        assert_eq!(streak_days(&on_days(&[0, 1, 2, 4, 5]), now().date_naive()), 3);
    }

    #[test]
    fn streak_requires_an_entry_today() {
        assert_eq!(streak_days(&on_days(&[1, 2, 3]), now().date_naive()), 0);
    }

    #[test]
    fn same_day_entries_count_once() {
        assert_eq!(streak_days(&on_days(&[0, 0, 0, 1, 1]), now().date_naive()), 2);
    }

    #[test]
    fn future_and_unparsable_dates_never_extend_streak() {
        let mut entries = on_days(&[-1, -2]);
        let mut garbage = entry_at(0, "Calm", "x", None);
        garbage.date = EntryDate::parse("yesterday-ish");
        entries.push(garbage);
        assert_eq!(streak_days(&entries, now().date_naive()), 0);

        entries.extend(on_days(&[0]));
        assert_eq!(streak_days(&entries, now().date_naive()), 1);
    }

    #[test]
    fn window_excludes_old_future_and_undated_entries() {
        let mut entries = on_days(&[0, 3, 6, 8, 30, -2]);
        let mut undated = entry_at(0, "Calm", "x", None);
        undated.date = EntryDate::parse("??");
        entries.push(undated);
        assert_eq!(weekly_count(&entries, now()), 3);
    }

    #[test]
    fn avg_sentiment_skips_empty_journals_and_missing_scores() {
        let entries = vec![
            entry_at(0, "Happy", "great day", Some(0.8)),
            entry_at(1, "Calm", "", Some(0.0)),
            entry_at(2, "Calm", "no score stored", None),
        ];
        assert_eq!(avg_sentiment(&entries, now()), Some(0.8));
    }

    #[test]
    fn avg_sentiment_ignores_entries_outside_window() {
        let entries = vec![
            entry_at(1, "Happy", "good", Some(0.5)),
            entry_at(2, "Sad", "bad", Some(-0.3)),
            entry_at(20, "Sad", "awful", Some(-1.0)),
        ];
        let avg = avg_sentiment(&entries, now()).unwrap();
        assert!((avg - 0.1).abs() < 1e-9);
    }

    #[test]
    fn mood_distribution_sums_to_weekly_count() {
        let entries = vec![
            entry_at(0, "Happy", "a", None),
            entry_at(1, "happy", "b", None),
            entry_at(2, "Happy", "c", None),
            entry_at(3, "", "exercise only", None),
            entry_at(10, "Sad", "old", None),
        ];
        let distribution = mood_distribution(&entries, now());
        assert_eq!(distribution.get("Happy"), Some(&2));
        assert_eq!(distribution.get("happy"), Some(&1));
        assert_eq!(distribution.get(""), Some(&1));
        assert_eq!(distribution.get("Sad"), None);
        assert_eq!(
            distribution.values().sum::<usize>(),
            weekly_count(&entries, now())
        );
    }

    #[test]
    fn exercises_done_ignores_none_and_blank() {
        let mut entries = on_days(&[0, 1, 2]);
        entries[0].exercise = "Yoga".into();
        entries[1].exercise = "".into();
        assert_eq!(exercises_done(&entries, now()), 1);
    }

    #[test]
    fn most_common_mood_breaks_ties_alphabetically() {
        let entries = vec![
            entry_at(0, "Sad", "", None),
            entry_at(0, "Calm", "", None),
            entry_at(0, "", "", None),
            entry_at(0, "", "", None),
        ];
        assert_eq!(most_common_mood(&entries), Some(("Calm".to_string(), 1)));
        assert_eq!(most_common_mood(&[]), None);
    }

    #[test]
    fn achievements_follow_entry_count_and_streak() {
        let entries = on_days(&[0, 1, 2, 3, 4, 5, 6]);
        let names: Vec<&str> = achievements(&entries, now().date_naive())
            .iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, vec!["Getting Started", "Consistent", "On Fire!"]);
    }
}
