// Ballot Model + Ballot Store
// One ballot per voter; ballots only ever disappear through a cascade delete

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single voter's recorded choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ballot {
    #[serde(rename = "userIdentifier")]
    pub voter_identifier: String,

    #[serde(rename = "outfitId")]
    pub entry_id: String,

    #[serde(rename = "votedAt")]
    pub created_at: DateTime<Utc>,
}

impl Ballot {
    pub fn new(voter_identifier: &str, entry_id: &str) -> Self {
        Ballot {
            voter_identifier: voter_identifier.to_string(),
            entry_id: entry_id.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Plain voter-keyed collection of ballots. Like the entry store, mutual
/// exclusion lives in the rules engine, not here.
#[derive(Debug, Default)]
pub struct BallotStore {
    ballots: Vec<Ballot>,
}

impl BallotStore {
    pub fn new() -> Self {
        BallotStore {
            ballots: Vec::new(),
        }
    }

    /// Rebuild a store from persisted records.
    pub fn from_ballots(ballots: Vec<Ballot>) -> Self {
        BallotStore { ballots }
    }

    pub fn insert(&mut self, ballot: Ballot) {
        self.ballots.push(ballot);
    }

    pub fn get_by_voter(&self, identifier: &str) -> Option<&Ballot> {
        self.ballots.iter().find(|b| b.voter_identifier == identifier)
    }

    pub fn all_by_entry(&self, entry_id: &str) -> Vec<&Ballot> {
        self.ballots.iter().filter(|b| b.entry_id == entry_id).collect()
    }

    /// Count of live ballots referencing an entry; feeds the derived-tally
    /// invariant check and snapshot reloads.
    pub fn count_for_entry(&self, entry_id: &str) -> u64 {
        self.ballots.iter().filter(|b| b.entry_id == entry_id).count() as u64
    }

    /// Remove every ballot referencing an entry, returning how many there were.
    pub fn delete_by_entry(&mut self, entry_id: &str) -> u64 {
        let before = self.ballots.len();
        self.ballots.retain(|b| b.entry_id != entry_id);
        (before - self.ballots.len()) as u64
    }

    pub fn all(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn len(&self) -> usize {
        self.ballots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ballots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voter_lookup() {
        let mut store = BallotStore::new();
        store.insert(Ballot::new("voter-1", "entry-a"));
        store.insert(Ballot::new("voter-2", "entry-a"));

        assert_eq!(store.get_by_voter("voter-1").unwrap().entry_id, "entry-a");
        assert!(store.get_by_voter("voter-3").is_none());
    }

    #[test]
    fn test_enumerate_and_count_by_entry() {
        let mut store = BallotStore::new();
        store.insert(Ballot::new("voter-1", "entry-a"));
        store.insert(Ballot::new("voter-2", "entry-a"));
        store.insert(Ballot::new("voter-3", "entry-b"));

        assert_eq!(store.all_by_entry("entry-a").len(), 2);
        assert_eq!(store.count_for_entry("entry-a"), 2);
        assert_eq!(store.count_for_entry("entry-b"), 1);
        assert_eq!(store.count_for_entry("entry-c"), 0);
    }

    #[test]
    fn test_delete_by_entry_removes_exactly_matching_ballots() {
        let mut store = BallotStore::new();
        store.insert(Ballot::new("voter-1", "entry-a"));
        store.insert(Ballot::new("voter-2", "entry-a"));
        store.insert(Ballot::new("voter-3", "entry-b"));

        let removed = store.delete_by_entry("entry-a");
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get_by_voter("voter-3").is_some());
        // Freed voters no longer have a ballot
        assert!(store.get_by_voter("voter-1").is_none());

        assert_eq!(store.delete_by_entry("entry-a"), 0);
    }
}
