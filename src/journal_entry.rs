use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

pub const MOODS: [&str; 8] = [
    "Happy",
    "Sad",
    "Anxious",
    "Calm",
    "Energetic",
    "Neutral",
    "Excited",
    "Overwhelmed",
];

pub const EXERCISES: [&str; 9] = [
    "Walking",
    "Running",
    "Yoga",
    "Meditation",
    "Stretching",
    "Dancing",
    "Swimming",
    "Cycling",
    "None",
];

const NO_EXERCISE: &str = "None";
const DEFAULT_MOOD_COLOR: &str = "#667eea";

const MOOD_COLORS: [(&str, &str); 8] = [
    ("happy", "#10b981"),
    ("sad", "#3b82f6"),
    ("anxious", "#f59e0b"),
    ("calm", "#8b5cf6"),
    ("energetic", "#ef4444"),
    ("neutral", "#6b7280"),
    ("excited", "#ec4899"),
    ("overwhelmed", "#f97316"),
];

/// Display colour for a mood label. The first table key contained in the
/// lower-cased label wins, so "Very happy" maps like "happy".
pub fn mood_color(mood: &str) -> &'static str {
    let mood = mood.to_lowercase();
    MOOD_COLORS
        .iter()
        .find(|(key, _)| mood.contains(key))
        .map(|(_, color)| *color)
        .unwrap_or(DEFAULT_MOOD_COLOR)
}

/// When an entry was written.
///
/// New entries always carry an RFC 3339 timestamp. Stored documents also
/// contain bare calendar days and naive ISO timestamps; those are read as
/// local time. Anything unreadable is kept verbatim so the record survives
/// a load/save cycle, but it never takes part in date arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryDate {
    At(DateTime<FixedOffset>),
    Unparsed(String),
}

impl EntryDate {
    pub fn now() -> Self {
        Local::now().into()
    }

    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return EntryDate::At(dt);
        }

        let naive = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                    .ok()
                    .and_then(|day| day.and_hms_opt(0, 0, 0))
            });

        match naive.and_then(|n| Local.from_local_datetime(&n).earliest()) {
            Some(local) => EntryDate::At(local.fixed_offset()),
            None => EntryDate::Unparsed(raw.to_string()),
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            EntryDate::At(dt) => Some(*dt),
            EntryDate::Unparsed(_) => None,
        }
    }

    /// Calendar day in the local time zone.
    pub fn local_day(&self) -> Option<NaiveDate> {
        self.timestamp()
            .map(|dt| dt.with_timezone(&Local).date_naive())
    }

    pub fn display(&self) -> String {
        match self {
            EntryDate::At(dt) => dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            EntryDate::Unparsed(raw) => raw.clone(),
        }
    }
}

impl From<DateTime<Local>> for EntryDate {
    fn from(dt: DateTime<Local>) -> Self {
        EntryDate::At(dt.fixed_offset())
    }
}

impl fmt::Display for EntryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDate::At(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            EntryDate::Unparsed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for EntryDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(EntryDate::parse(&raw))
    }
}

/// Newest first; unreadable dates sort after every readable one.
pub fn newest_first(a: &EntryDate, b: &EntryDate) -> Ordering {
    match (a.timestamp(), b.timestamp()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn default_exercise() -> String {
    NO_EXERCISE.to_string()
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_no_exercise<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_exercise))
}

// Optional fields tolerate values of the wrong type: they read as absent
// instead of failing the record.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_str().map(str::to_string))
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|s| s.is_finite()))
}

/// One journal/mood record. Only `username` and `date` are required in the
/// stored document; everything else falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub username: String,
    pub date: EntryDate,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub mood: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub journal: String,
    #[serde(default = "default_exercise", deserialize_with = "null_as_no_exercise")]
    pub exercise: String,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub gratitude: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub sentiment: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub mood_color: Option<String>,
}

impl Entry {
    pub fn new(username: &str, mood: String, journal: String, exercise: String) -> Self {
        let exercise = if exercise.trim().is_empty() {
            default_exercise()
        } else {
            exercise
        };
        let mood_color = if mood.is_empty() {
            None
        } else {
            Some(mood_color(&mood).to_string())
        };

        Entry {
            username: username.to_string(),
            date: EntryDate::now(),
            mood,
            journal,
            exercise,
            gratitude: None,
            sentiment: None,
            mood_color,
        }
    }

    pub fn has_exercise(&self) -> bool {
        let exercise = self.exercise.trim();
        !exercise.is_empty() && exercise != NO_EXERCISE
    }

    pub fn has_journal(&self) -> bool {
        !self.journal.trim().is_empty()
    }

    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.journal.to_lowercase().contains(&query)
            || self.mood.to_lowercase().contains(&query)
            || self.exercise.to_lowercase().contains(&query)
            || self
                .gratitude
                .as_deref()
                .is_some_and(|g| g.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn mood_color_matches_substrings_case_insensitively() {
        assert_eq!(mood_color("Happy"), "#10b981");
        assert_eq!(mood_color("very ANXIOUS today"), "#f59e0b");
        assert_eq!(mood_color("Overwhelmed"), "#f97316");
        assert_eq!(mood_color("Grumpy"), "#667eea");
    }

    #[test]
    fn parses_legacy_calendar_day_as_local_midnight() {
        let date = EntryDate::parse("2024-05-01");
        let local = date.timestamp().unwrap().with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(local.hour(), 0);
    }

    #[test]
    fn parses_naive_iso_timestamp_with_micros() {
        let date = EntryDate::parse("2024-05-01T10:30:00.123456");
        let local = date.timestamp().unwrap().with_timezone(&Local);
        assert_eq!(local.day(), 1);
        assert_eq!(local.hour(), 10);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn keeps_unreadable_dates_verbatim() {
        let date = EntryDate::parse("last tuesday");
        assert_eq!(date, EntryDate::Unparsed("last tuesday".to_string()));
        assert_eq!(date.local_day(), None);
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"last tuesday\"");
    }

    #[test]
    fn deserializes_sparse_legacy_record_with_defaults() {
        let raw = r#"{"username": "sam", "date": "2024-05-01", "mood": "Calm"}"#;
        let entry: Entry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.username, "sam");
        assert_eq!(entry.exercise, "None");
        assert!(entry.journal.is_empty());
        assert!(entry.sentiment.is_none());
        assert!(entry.mood_color.is_none());
        assert!(!entry.has_exercise());
    }

    #[test]
    fn mistyped_optional_fields_read_as_absent() {
        let raw = r#"{"username": "sam", "date": "2024-05-01", "mood": null,
            "journal": null, "exercise": null, "gratitude": 3,
            "sentiment": "n/a", "mood_color": false}"#;
        let entry: Entry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.mood, "");
        assert_eq!(entry.journal, "");
        assert_eq!(entry.exercise, "None");
        assert!(entry.gratitude.is_none());
        assert!(entry.sentiment.is_none());
        assert!(entry.mood_color.is_none());
    }

    #[test]
    fn new_entry_derives_mood_color_and_defaults_exercise() {
        let entry = Entry::new("sam", "Sad".into(), "rainy".into(), "".into());
        assert_eq!(entry.mood_color.as_deref(), Some("#3b82f6"));
        assert_eq!(entry.exercise, "None");
        assert!(entry.date.timestamp().is_some());
    }

    #[test]
    fn newest_first_puts_unparsed_last() {
        let mut dates = vec![
            EntryDate::parse("garbage"),
            EntryDate::parse("2024-01-01"),
            EntryDate::parse("2024-03-01"),
        ];
        dates.sort_by(newest_first);
        assert_eq!(dates[0].local_day().unwrap().month(), 3);
        assert_eq!(dates[1].local_day().unwrap().month(), 1);
        assert!(dates[2].timestamp().is_none());
    }

    #[test]
    fn search_matches_journal_mood_and_gratitude() {
        let mut entry = Entry::new("sam", "Calm".into(), "Walked by the river".into(), "Walking".into());
        entry.gratitude = Some("My sister".into());
        assert!(entry.matches("RIVER"));
        assert!(entry.matches("calm"));
        assert!(entry.matches("sister"));
        assert!(!entry.matches("mountain"));
    }
}
