//! Flat JSON documents on disk: credentials, journal entries and chat
//! transcripts. Every document is read and written whole.

use crate::companion::ChatTurn;
use crate::error::StoreError;
use crate::journal_entry::Entry;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A collection persisted as one JSON file.
pub trait Document: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
}

/// Username to plaintext password.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Users(pub BTreeMap<String, String>);

impl Users {
    pub fn contains(&self, username: &str) -> bool {
        self.0.contains_key(username)
    }

    pub fn verify(&self, username: &str, password: &str) -> bool {
        self.0.get(username).is_some_and(|stored| stored == password)
    }
}

impl Document for Users {
    const FILE_NAME: &'static str = "users.json";
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Entries(pub Vec<Entry>);

// Records are decoded one at a time so a single malformed record is skipped
// rather than emptying the whole collection.
impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<serde_json::Value>::deserialize(deserializer)?;
        let entries = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match Entry::deserialize(&record) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(index, %record, error = %e, "skipping unreadable entry");
                    None
                }
            })
            .collect();
        Ok(Entries(entries))
    }
}

impl Entries {
    /// Every entry owned by `username`, in storage order.
    pub fn owned_by(&self, username: &str) -> Vec<Entry> {
        self.0
            .iter()
            .filter(|e| e.username == username)
            .cloned()
            .collect()
    }
}

impl Document for Entries {
    const FILE_NAME: &'static str = "entries.json";
}

/// Per-user chat transcripts, kept for display only.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcripts(pub BTreeMap<String, Vec<ChatTurn>>);

impl Document for Transcripts {
    const FILE_NAME: &'static str = "chat_history.json";
}

pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(JsonStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of<D: Document>(&self) -> PathBuf {
        self.dir.join(D::FILE_NAME)
    }

    /// The whole document, or an empty one if the file is missing or cannot
    /// be parsed. A corrupt file is copied aside before anything overwrites it.
    pub fn load<D: Document>(&self) -> D {
        let path = self.path_of::<D>();
        let serialized = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return D::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable document, using empty");
                return D::default();
            }
        };

        match serde_json::from_str(&serialized) {
            Ok(doc) => doc,
            Err(e) => {
                let backup = path.with_extension("json.bak");
                warn!(
                    path = %path.display(),
                    backup = %backup.display(),
                    error = %e,
                    "corrupt document, using empty"
                );
                if let Err(e) = fs::copy(&path, &backup) {
                    warn!(error = %e, "could not back up corrupt document");
                }
                D::default()
            }
        }
    }

    /// Replaces a document wholesale; used to seed fixtures.
    #[cfg(test)]
    pub fn save<D: Document>(&self, doc: &D) -> Result<(), StoreError> {
        let _lock = self.lock::<D>()?;
        self.write(doc)
    }

    /// Load, mutate and save one document while holding its lock file, so
    /// concurrent writers serialise instead of overwriting each other.
    pub fn update<D, R>(&self, mutate: impl FnOnce(&mut D) -> R) -> Result<R, StoreError>
    where
        D: Document,
    {
        let _lock = self.lock::<D>()?;
        let mut doc = self.load::<D>();
        let result = mutate(&mut doc);
        self.write(&doc)?;
        Ok(result)
    }

    pub fn entries_for(&self, username: &str) -> Vec<Entry> {
        self.load::<Entries>().owned_by(username)
    }

    fn write<D: Document>(&self, doc: &D) -> Result<(), StoreError> {
        let path = self.path_of::<D>();
        let serialized =
            serde_json::to_string_pretty(doc).map_err(|e| StoreError::Serialize(D::FILE_NAME, e))?;

        let tmp = path.with_extension("json.tmp");
        let io_err = |source: std::io::Error| StoreError::Io {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&tmp).map_err(io_err)?;
        file.write_all(serialized.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;

        debug!(path = %path.display(), bytes = serialized.len(), "document saved");
        Ok(())
    }

    fn lock<D: Document>(&self) -> Result<DocumentLock, StoreError> {
        let path = self.dir.join(format!("{}.lock", D::FILE_NAME));
        let lock_err = |source: std::io::Error| StoreError::Lock {
            path: path.clone(),
            source,
        };
        let file = File::options()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;
        Ok(DocumentLock { file })
    }
}

/// Releases the advisory lock on drop.
struct DocumentLock {
    file: File,
}

impl Drop for DocumentLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release document lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal_entry::EntryDate;
    use tempfile::TempDir;

    fn entry(username: &str, mood: &str) -> Entry {
        Entry::new(username, mood.to_string(), format!("{mood} day"), "Yoga".into())
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.load::<Users>().0.is_empty());
        assert!(store.load::<Entries>().0.is_empty());
        assert!(store.load::<Transcripts>().0.is_empty());
    }

    #[test]
    fn corrupt_file_loads_as_empty_and_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("entries.json"), "{ not json").unwrap();

        assert!(store.load::<Entries>().0.is_empty());
        let backup = fs::read_to_string(dir.path().join("entries.json.bak")).unwrap();
        assert_eq!(backup, "{ not json");
    }

    #[test]
    fn entries_round_trip_field_for_field() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let mut first = entry("ana", "Happy");
        first.sentiment = Some(0.8);
        first.gratitude = Some("sunshine".into());
        let mut legacy = entry("ben", "Sad");
        legacy.date = EntryDate::parse("not a date");
        legacy.mood_color = None;
        let entries = Entries(vec![first, legacy]);

        store.save(&entries).unwrap();
        assert_eq!(store.load::<Entries>(), entries);
    }

    #[test]
    fn reads_documents_written_by_older_versions() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("users.json"), r#"{"ana": "secret1"}"#).unwrap();
        fs::write(
            dir.path().join("entries.json"),
            r##"[
                {"username": "ana", "date": "2024-05-01", "mood": "Calm", "journal": "ok",
                 "exercise": "None", "unusual_breathing": false},
                {"username": "ana", "date": "2024-05-02T09:15:00.000001", "mood": "Happy",
                 "journal": "great", "exercise": "Yoga", "gratitude": "", "sentiment": 0.8,
                 "mood_color": "#10b981"}
            ]"##,
        )
        .unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        assert!(store.load::<Users>().verify("ana", "secret1"));
        let entries = store.entries_for("ana");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.date.timestamp().is_some()));
        assert_eq!(entries[1].sentiment, Some(0.8));
    }

    #[test]
    fn one_malformed_record_does_not_discard_the_rest() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("entries.json"),
            r#"[
                {"username": "ana", "date": "2024-05-01", "mood": "Calm", "sentiment": "n/a"},
                {"username": "ben", "date": "2024-05-02", "mood": null, "journal": "hi"},
                {"mood": "Happy"},
                "stray",
                {"username": "ana", "date": "2024-05-03", "mood": "Happy", "sentiment": 0.5}
            ]"#,
        )
        .unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let loaded = store.load::<Entries>();
        assert_eq!(loaded.0.len(), 3);
        assert!(!dir.path().join("entries.json.bak").exists());

        store
            .update(|entries: &mut Entries| entries.0.push(entry("cy", "Sad")))
            .unwrap();
        let after = store.load::<Entries>();
        assert_eq!(after.0.len(), 4);
        assert_eq!(store.entries_for("ana").len(), 2);
        assert_eq!(store.entries_for("ben")[0].journal, "hi");
        assert_eq!(store.entries_for("ana")[0].sentiment, None);
    }

    #[test]
    fn concurrent_updates_from_separate_stores_are_not_lost() {
        const PER_WRITER: usize = 25;
        let dir = TempDir::new().unwrap();

        let writers: Vec<_> = ["ana", "ben"]
            .into_iter()
            .map(|user| {
                let store = JsonStore::open(dir.path()).unwrap();
                std::thread::spawn(move || {
                    for _ in 0..PER_WRITER {
                        store
                            .update(|entries: &mut Entries| entries.0.push(entry(user, "Calm")))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let store = JsonStore::open(dir.path()).unwrap();
        assert_eq!(store.load::<Entries>().0.len(), 2 * PER_WRITER);
        assert_eq!(store.entries_for("ana").len(), PER_WRITER);
        assert_eq!(store.entries_for("ben").len(), PER_WRITER);
    }

    #[test]
    fn entries_for_filters_in_storage_order() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .save(&Entries(vec![
                entry("ana", "Happy"),
                entry("ben", "Sad"),
                entry("ana", "Calm"),
            ]))
            .unwrap();

        let moods: Vec<String> = store.entries_for("ana").into_iter().map(|e| e.mood).collect();
        assert_eq!(moods, vec!["Happy", "Calm"]);
        assert!(store.entries_for("nobody").is_empty());
    }

    #[test]
    fn update_applies_mutation_and_persists() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();

        let added = store
            .update(|users: &mut Users| users.0.insert("ana".into(), "pw1234".into()).is_none())
            .unwrap();
        assert!(added);
        store
            .update(|entries: &mut Entries| entries.0.push(entry("ana", "Happy")))
            .unwrap();

        assert!(store.load::<Users>().contains("ana"));
        assert_eq!(store.load::<Entries>().0.len(), 1);
        assert!(!dir.path().join("entries.json.tmp").exists());
    }

    #[test]
    fn users_verify_requires_exact_match() {
        let mut users = Users::default();
        users.0.insert("ana".into(), "secret1".into());
        assert!(users.verify("ana", "secret1"));
        assert!(!users.verify("ana", "Secret1"));
        assert!(!users.verify("Ana", "secret1"));
    }
}
