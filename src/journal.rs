use crate::companion::{ChatTurn, Companion};
use crate::error::{AccountError, JournalError, StoreError};
use crate::journal_entry::{newest_first, Entry, EntryDate};
use crate::record_store::{Entries, JsonStore, Transcripts, Users};
use crate::sentiment::SentimentScorer;
use crate::stats::{self, Achievement, WeeklyStats};
use crate::wellness::GuidedExercise;
use chrono::{DateTime, Local, NaiveDate};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;
const REPORT_RECENT_ENTRIES: usize = 10;
const REPORT_JOURNAL_CHARS: usize = 300;

/// Form input for a journal entry.
#[derive(Debug, Clone, Default)]
pub struct NewEntry {
    pub mood: String,
    pub journal: String,
    pub exercise: String,
    pub gratitude: String,
}

/// Accounts, entries and chat on top of the record store.
pub struct Journal {
    store: JsonStore,
    scorer: Box<dyn SentimentScorer>,
    companion: Companion,
    export_dir: PathBuf,
}

impl Journal {
    pub fn new(
        store: JsonStore,
        scorer: Box<dyn SentimentScorer>,
        companion: Companion,
        export_dir: PathBuf,
    ) -> Self {
        Journal {
            store,
            scorer,
            companion,
            export_dir,
        }
    }

    pub fn register(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<String, JournalError> {
        let username = username.trim();
        let password = password.trim();

        if username.is_empty() || password.is_empty() {
            return Err(AccountError::EmptyField.into());
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AccountError::UsernameTooShort(MIN_USERNAME_LEN).into());
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::PasswordTooShort(MIN_PASSWORD_LEN).into());
        }
        if password != confirm.trim() {
            return Err(AccountError::PasswordMismatch.into());
        }

        self.store.update(|users: &mut Users| {
            if users.contains(username) {
                return Err(AccountError::UsernameTaken);
            }
            users.0.insert(username.to_string(), password.to_string());
            Ok(())
        })??;

        info!(username, "account created");
        Ok(username.to_string())
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let username = username.trim();
        if self.store.load::<Users>().verify(username, password) {
            info!(username, "logged in");
            Ok(username.to_string())
        } else {
            warn!("failed login attempt");
            Err(AccountError::InvalidCredentials)
        }
    }

    pub fn add_entry(&self, username: &str, new: NewEntry) -> Result<Entry, JournalError> {
        let mood = new.mood.trim().to_string();
        if mood.is_empty() {
            return Err(JournalError::Validation("Mood is required".to_string()));
        }

        let journal = new.journal.trim().to_string();
        let mut entry = Entry::new(username, mood, journal, new.exercise.trim().to_string());
        if entry.has_journal() {
            entry.sentiment = Some(self.scorer.polarity(&entry.journal));
        }
        let gratitude = new.gratitude.trim();
        if !gratitude.is_empty() {
            entry.gratitude = Some(gratitude.to_string());
        }

        self.append(entry)
    }

    pub fn record_exercise(
        &self,
        username: &str,
        exercise: GuidedExercise,
    ) -> Result<Entry, JournalError> {
        let entry = Entry::new(
            username,
            String::new(),
            format!("Completed exercise: {}", exercise.title()),
            exercise.label().to_string(),
        );
        self.append(entry)
    }

    fn append(&self, entry: Entry) -> Result<Entry, JournalError> {
        let saved = entry.clone();
        self.store
            .update(|entries: &mut Entries| entries.0.push(entry))?;
        info!(
            username = %saved.username,
            mood = %saved.mood,
            exercise = %saved.exercise,
            "entry saved"
        );
        Ok(saved)
    }

    /// The user's entries, newest first.
    pub fn entries_for(&self, username: &str) -> Vec<Entry> {
        let mut entries = self.store.entries_for(username);
        entries.sort_by(|a, b| newest_first(&a.date, &b.date));
        entries
    }

    pub fn search_entries(&self, username: &str, query: &str) -> Vec<Entry> {
        self.entries_for(username)
            .into_iter()
            .filter(|e| e.matches(query))
            .collect()
    }

    pub fn weekly_stats(&self, username: &str, now: DateTime<Local>) -> WeeklyStats {
        WeeklyStats::compute(&self.store.entries_for(username), now)
    }

    pub fn achievements(&self, username: &str, today: NaiveDate) -> Vec<Achievement> {
        stats::achievements(&self.store.entries_for(username), today)
    }

    /// One chat turn. The exchange is appended to the user's transcript; a
    /// failed transcript write is logged and the reply still returned.
    pub async fn chat(&self, username: &str, message: &str) -> String {
        let message = message.trim();
        let reply = self.companion.reply(message).await;
        if message.is_empty() {
            return reply;
        }

        let turn = ChatTurn {
            timestamp: EntryDate::now(),
            user: message.to_string(),
            bot: reply.clone(),
        };
        let saved = self.store.update(|transcripts: &mut Transcripts| {
            transcripts
                .0
                .entry(username.to_string())
                .or_default()
                .push(turn)
        });
        if let Err(e) = saved {
            warn!(username, error = %e, "failed to save chat transcript");
        }
        reply
    }

    pub fn transcript(&self, username: &str) -> Vec<ChatTurn> {
        self.store
            .load::<Transcripts>()
            .0
            .remove(username)
            .unwrap_or_default()
    }

    /// Writes the user's entries as JSON. `Ok(None)` when there is nothing
    /// to export.
    pub fn export_json(
        &self,
        username: &str,
        today: NaiveDate,
    ) -> Result<Option<PathBuf>, JournalError> {
        let entries = self.store.entries_for(username);
        if entries.is_empty() {
            return Ok(None);
        }

        let path = self.export_dir.join(format!(
            "wellness_data_{}_{}.json",
            username,
            today.format("%Y%m%d")
        ));
        let serialized = serde_json::to_string_pretty(&entries)
            .map_err(|e| StoreError::Serialize("export", e))?;
        self.write_export(&path, &serialized)?;
        Ok(Some(path))
    }

    /// Plain-text summary report. `Ok(None)` when there is nothing to report.
    pub fn export_report(
        &self,
        username: &str,
        today: NaiveDate,
    ) -> Result<Option<PathBuf>, JournalError> {
        let entries = self.store.entries_for(username);
        if entries.is_empty() {
            return Ok(None);
        }

        let path = self.export_dir.join(format!(
            "wellness_report_{}_{}.txt",
            username,
            today.format("%Y%m%d")
        ));
        self.write_export(&path, &render_report(username, &entries, today))?;
        Ok(Some(path))
    }

    fn write_export(&self, path: &Path, contents: &str) -> Result<(), JournalError> {
        fs::create_dir_all(&self.export_dir)
            .and_then(|_| fs::write(path, contents))
            .map_err(|source| JournalError::Export {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "export written");
        Ok(())
    }

    /// Removes the account, every entry it owns and its chat transcript.
    ///
    /// Credentials go last, so a deletion that fails part way leaves an
    /// account that can still log in and retry.
    pub fn delete_account(&self, username: &str) -> Result<(), JournalError> {
        let removed = self.store.update(|entries: &mut Entries| {
            let before = entries.0.len();
            entries.0.retain(|e| e.username != username);
            before - entries.0.len()
        })?;
        self.store
            .update(|transcripts: &mut Transcripts| transcripts.0.remove(username))?;
        self.store.update(|users: &mut Users| users.0.remove(username))?;

        info!(username, removed_entries = removed, "account deleted");
        Ok(())
    }
}

fn render_report(username: &str, entries: &[Entry], today: NaiveDate) -> String {
    let mut out = String::new();
    let most_common = stats::most_common_mood(entries)
        .map(|(mood, _)| mood)
        .unwrap_or_else(|| "N/A".to_string());
    let exercises = entries.iter().filter(|e| e.has_exercise()).count();

    let _ = writeln!(out, "Mental Wellness Report");
    let _ = writeln!(out, "======================");
    let _ = writeln!(out, "User: {username}");
    let _ = writeln!(out, "Generated: {}", today.format("%Y-%m-%d"));
    let _ = writeln!(out);
    let _ = writeln!(out, "Total Entries:       {}", entries.len());
    let _ = writeln!(out, "Most Common Mood:    {most_common}");
    let _ = writeln!(out, "Exercises Completed: {exercises}");
    let _ = writeln!(out);
    let _ = writeln!(out, "Journal Entries (last {REPORT_RECENT_ENTRIES})");
    let _ = writeln!(out, "-------------------------");

    let skip = entries.len().saturating_sub(REPORT_RECENT_ENTRIES);
    for entry in &entries[skip..] {
        let journal: String = entry.journal.chars().take(REPORT_JOURNAL_CHARS).collect();
        let _ = writeln!(out, "Date: {} | Mood: {}", entry.date.display(), entry.mood);
        let _ = writeln!(out, "Exercise: {}", entry.exercise);
        let _ = writeln!(out, "Journal: {journal}");
        let _ = writeln!(out);
    }
    out
}
