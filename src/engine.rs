// Voting Rules Engine - the invariant enforcement core
//
// Every operation takes one write (or read) lock over the combined state and
// performs its whole check-then-mutate sequence inside it. The binary image
// write is synchronous and happens inside that section, so no second request
// can slip between a duplicate check and the insert it guards.

use crate::admin::{AdminSettings, SettingsPatch};
use crate::ballot::{Ballot, BallotStore};
use crate::entry::{validate_display_name, Entry, EntryStore};
use crate::error::{VoteError, VoteResult};
use crate::results::{rank_entries, RankedEntry};
use crate::storage::{validate_image, ImageStore, ImageUpload};
use serde::Serialize;
use std::sync::RwLock;

// ============================================================================
// STATE
// ============================================================================

/// The two stores plus event settings, guarded together by one lock.
pub struct VotingState {
    pub entries: EntryStore,
    pub ballots: BallotStore,
    pub settings: AdminSettings,
}

impl VotingState {
    /// Rebuild state from persisted records. Vote tallies are derived data,
    /// so they are recomputed from the ballots rather than trusted as saved.
    pub fn rebuild(entries: Vec<Entry>, ballots: Vec<Ballot>, settings: AdminSettings) -> Self {
        let ballots = BallotStore::from_ballots(ballots);
        let mut entries = EntryStore::from_entries(entries);

        let ids: Vec<String> = entries.all().iter().map(|e| e.id.clone()).collect();
        for id in ids {
            let count = ballots.count_for_entry(&id);
            if let Some(entry) = entries.get_by_id_mut(&id) {
                entry.votes = count;
            }
        }

        VotingState {
            entries,
            ballots,
            settings,
        }
    }
}

// ============================================================================
// RESULT SHAPES
// ============================================================================

/// What an admin delete did: the removed entry, how many ballots went with
/// it, and which owner identifier may upload again.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub entry: Entry,
    pub cascaded_ballots: u64,
    pub freed_owner: String,
    /// Whether the stored binary was cleaned up; a miss is logged, not fatal
    pub image_removed: bool,
}

/// A participant's view of their own eligibility.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParticipantStatus {
    #[serde(rename = "hasUploaded")]
    pub has_uploaded: bool,

    #[serde(rename = "hasVoted")]
    pub has_voted: bool,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Validates and applies upload, vote, and delete requests against the entry
/// and ballot stores, keeping the uniqueness and tally invariants intact
/// after every request.
pub struct VotingEngine {
    state: RwLock<VotingState>,
    images: Box<dyn ImageStore>,
}

impl VotingEngine {
    /// Build an engine over explicit store instances (injected, not global,
    /// so each test gets an isolated world).
    pub fn new(entries: EntryStore, ballots: BallotStore, images: Box<dyn ImageStore>) -> Self {
        VotingEngine {
            state: RwLock::new(VotingState {
                entries,
                ballots,
                settings: AdminSettings::default(),
            }),
            images,
        }
    }

    /// Build an engine from persisted records, recomputing the tallies.
    pub fn restore(
        entries: Vec<Entry>,
        ballots: Vec<Ballot>,
        settings: AdminSettings,
        images: Box<dyn ImageStore>,
    ) -> Self {
        VotingEngine {
            state: RwLock::new(VotingState::rebuild(entries, ballots, settings)),
            images,
        }
    }

    // ------------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------------

    /// Handle an upload request. On success the image is persisted first and
    /// the entry inserted after, so a storage failure leaves no partial entry.
    pub fn submit_upload(
        &self,
        display_name: &str,
        owner_identifier: &str,
        image: Option<&ImageUpload>,
    ) -> VoteResult<Entry> {
        let mut state = self.state.write().unwrap();

        if !state.settings.uploads_enabled {
            return Err(VoteError::UploadsDisabled);
        }

        let mut reasons = validate_display_name(display_name);
        if owner_identifier.trim().is_empty() {
            reasons.push("User identifier is required".to_string());
        }
        let image = image.filter(|img| !img.bytes.is_empty());
        if let Some(img) = image {
            reasons.extend(validate_image(img));
        }

        if !reasons.is_empty() {
            return Err(VoteError::Validation(reasons));
        }
        let image = image.ok_or(VoteError::MissingImage)?;

        if !state.settings.unlimited_uploads
            && state.entries.find_by_owner(owner_identifier).is_some()
        {
            return Err(VoteError::DuplicateOwner);
        }

        if let Some(existing) = state.entries.find_by_name_ci(display_name) {
            return Err(VoteError::DuplicateName(existing.display_name.clone()));
        }

        // All rules passed; persist the binary, then record the entry.
        let stored = self.images.store(image)?;
        let entry = Entry::new(
            display_name,
            owner_identifier,
            &stored.url,
            &stored.file_name,
        );
        state.entries.insert(entry.clone());

        Ok(entry)
    }

    // ------------------------------------------------------------------------
    // Votes
    // ------------------------------------------------------------------------

    /// Handle a vote request. Ballot insert and tally increment happen under
    /// the same lock; no observer can see one without the other.
    pub fn submit_vote(&self, entry_id: &str, voter_identifier: &str) -> VoteResult<()> {
        let mut state = self.state.write().unwrap();

        if !state.settings.voting_enabled {
            return Err(VoteError::VotingDisabled);
        }

        let mut reasons = Vec::new();
        if entry_id.trim().is_empty() {
            reasons.push("Outfit id is required".to_string());
        }
        if voter_identifier.trim().is_empty() {
            reasons.push("User identifier is required".to_string());
        }
        if !reasons.is_empty() {
            return Err(VoteError::Validation(reasons));
        }

        if let Some(existing) = state.ballots.get_by_voter(voter_identifier) {
            let voted_for = state
                .entries
                .get_by_id(&existing.entry_id)
                .map(|e| e.display_name.clone())
                .unwrap_or_else(|| existing.entry_id.clone());
            return Err(VoteError::DuplicateVote { voted_for });
        }

        let owner = match state.entries.get_by_id(entry_id) {
            Some(entry) => entry.owner_identifier.clone(),
            None => return Err(VoteError::EntryNotFound(entry_id.to_string())),
        };
        if owner == voter_identifier {
            return Err(VoteError::SelfVote);
        }

        state.ballots.insert(Ballot::new(voter_identifier, entry_id));
        if let Some(entry) = state.entries.get_by_id_mut(entry_id) {
            entry.votes += 1;
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub fn entries(&self) -> Vec<Entry> {
        self.state.read().unwrap().entries.all().to_vec()
    }

    /// Deterministic leaderboard: votes descending, earlier upload first on
    /// ties, 1-based ranks. Computed fresh from current state each call.
    pub fn compute_results(&self) -> Vec<RankedEntry> {
        let state = self.state.read().unwrap();
        rank_entries(state.entries.all())
    }

    pub fn status(&self, identifier: &str) -> ParticipantStatus {
        let state = self.state.read().unwrap();
        ParticipantStatus {
            has_uploaded: state.entries.find_by_owner(identifier).is_some(),
            has_voted: state.ballots.get_by_voter(identifier).is_some(),
        }
    }

    /// Snapshot of both collections for the persistence layer.
    pub fn snapshot(&self) -> (Vec<Entry>, Vec<Ballot>) {
        let state = self.state.read().unwrap();
        (state.entries.all().to_vec(), state.ballots.all().to_vec())
    }

    /// Invariant check: every entry's tally equals its live ballot count.
    pub fn tally_consistent(&self) -> bool {
        let state = self.state.read().unwrap();
        state
            .entries
            .all()
            .iter()
            .all(|e| e.votes == state.ballots.count_for_entry(&e.id))
    }

    // ------------------------------------------------------------------------
    // Admin operations (credential checks happen in AdminController)
    // ------------------------------------------------------------------------

    /// Remove an entry and everything that hangs off it, as one composite
    /// step: its ballots disappear (those voters may vote again) and its
    /// owner identifier may upload again. Binary cleanup is best-effort.
    pub fn delete_entry(&self, entry_id: &str) -> VoteResult<DeleteOutcome> {
        let mut state = self.state.write().unwrap();

        let entry = state
            .entries
            .remove(entry_id)
            .ok_or_else(|| VoteError::EntryNotFound(entry_id.to_string()))?;
        let cascaded_ballots = state.ballots.delete_by_entry(entry_id);

        let image_removed = self.images.delete(&entry.file_name).is_ok();
        let freed_owner = entry.owner_identifier.clone();

        Ok(DeleteOutcome {
            entry,
            cascaded_ballots,
            freed_owner,
            image_removed,
        })
    }

    pub fn settings(&self) -> AdminSettings {
        self.state.read().unwrap().settings
    }

    pub fn update_settings(&self, patch: SettingsPatch) -> AdminSettings {
        let mut state = self.state.write().unwrap();
        patch.apply_to(&mut state.settings);
        state.settings
    }
}
