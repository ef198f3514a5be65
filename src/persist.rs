// File-backed Persistence - two independent JSON snapshots
// Entries and ballots save and load separately; tallies are never trusted
// from disk, they are rebuilt from the ballots (see VotingState::rebuild)

use crate::ballot::Ballot;
use crate::entry::Entry;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const ENTRIES_FILE: &str = "entries.json";
const BALLOTS_FILE: &str = "ballots.json";

fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file: {:?}", path))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse data file: {:?}", path))
}

fn save_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let content = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    fs::write(path, content).with_context(|| format!("Failed to write data file: {:?}", path))
}

/// Snapshot directory holding `entries.json` and `ballots.json`.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Open (and create if needed) the data directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory {:?}", dir))?;
        Ok(SnapshotStore { dir })
    }

    pub fn load_entries(&self) -> Result<Vec<Entry>> {
        load_records(&self.dir.join(ENTRIES_FILE))
    }

    pub fn load_ballots(&self) -> Result<Vec<Ballot>> {
        load_records(&self.dir.join(BALLOTS_FILE))
    }

    pub fn save_entries(&self, entries: &[Entry]) -> Result<()> {
        save_records(&self.dir.join(ENTRIES_FILE), entries)
    }

    pub fn save_ballots(&self, ballots: &[Ballot]) -> Result<()> {
        save_records(&self.dir.join(BALLOTS_FILE), ballots)
    }

    /// Flush both collections. Writes are independent files, so a ballot
    /// write failure never corrupts the entries snapshot.
    pub fn save(&self, entries: &[Entry], ballots: &[Ballot]) -> Result<()> {
        self.save_entries(entries)?;
        self.save_ballots(ballots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admin::AdminSettings;
    use crate::engine::VotingState;

    #[test]
    fn test_missing_files_load_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        assert!(store.load_entries().unwrap().is_empty());
        assert!(store.load_ballots().unwrap().is_empty());
    }

    #[test]
    fn test_round_trip_preserves_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        let entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        let ballot = Ballot::new("voter-1", &entry.id);
        store.save(&[entry.clone()], &[ballot.clone()]).unwrap();

        assert_eq!(store.load_entries().unwrap(), vec![entry]);
        assert_eq!(store.load_ballots().unwrap(), vec![ballot]);
    }

    #[test]
    fn test_collections_save_independently() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        let entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        store.save_entries(&[entry]).unwrap();

        assert_eq!(store.load_entries().unwrap().len(), 1);
        assert!(store.load_ballots().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error_not_a_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();
        fs::write(dir.path().join(ENTRIES_FILE), "not json").unwrap();

        assert!(store.load_entries().is_err());
    }

    #[test]
    fn test_reload_reconstructs_identical_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path()).unwrap();

        let mut entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        entry.votes = 2;
        let ballots = vec![
            Ballot::new("voter-1", &entry.id),
            Ballot::new("voter-2", &entry.id),
        ];
        store.save(&[entry.clone()], &ballots).unwrap();

        let state = VotingState::rebuild(
            store.load_entries().unwrap(),
            store.load_ballots().unwrap(),
            AdminSettings::default(),
        );
        assert_eq!(state.entries.get_by_id(&entry.id).unwrap().votes, 2);
        assert_eq!(state.ballots.count_for_entry(&entry.id), 2);
    }
}
