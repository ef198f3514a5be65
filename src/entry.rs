// Entry Model + Entry Store
// One entry per participant who uploaded; vote tallies live here

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// DISPLAY NAME RULES
// ============================================================================

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;

/// Validate a display name, returning every reason it fails.
///
/// Rules: non-empty after trimming, 2-50 characters, and only letters
/// (including diacritics), digits, spaces, hyphens, and periods.
pub fn validate_display_name(name: &str) -> Vec<String> {
    let mut errors = Vec::new();
    let trimmed = name.trim();

    if trimmed.is_empty() {
        errors.push("Name is required".to_string());
        return errors;
    }

    let len = trimmed.chars().count();
    if len < NAME_MIN_LEN {
        errors.push(format!("Name must be at least {} characters", NAME_MIN_LEN));
    }
    if len > NAME_MAX_LEN {
        errors.push(format!("Name must be at most {} characters", NAME_MAX_LEN));
    }

    let charset_ok = trimmed
        .chars()
        .all(|c| c.is_alphabetic() || c.is_ascii_digit() || c == ' ' || c == '-' || c == '.');
    if !charset_ok {
        errors.push(
            "Name may only contain letters, digits, spaces, hyphens, and periods".to_string(),
        );
    }

    errors
}

/// Case-insensitive, trim-insensitive name equality used by the
/// duplicate-name rule.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// ============================================================================
// ENTRY
// ============================================================================

/// A participant's uploaded submission plus its derived vote tally.
///
/// `id`, `owner_identifier`, `image_url`, `file_name`, and `created_at` are
/// set once at creation and never mutated. `votes` is derived state: it must
/// equal the number of live ballots referencing this entry at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,

    #[serde(rename = "userName")]
    pub display_name: String,

    #[serde(rename = "userIdentifier")]
    pub owner_identifier: String,

    #[serde(rename = "imageUrl")]
    pub image_url: String,

    /// Stored-object name, kept so an admin delete can clean up the binary
    #[serde(rename = "fileName")]
    pub file_name: String,

    #[serde(rename = "uploadedAt")]
    pub created_at: DateTime<Utc>,

    pub votes: u64,
}

impl Entry {
    /// Create a new entry with a fresh uuid and a zero tally.
    /// The display name is stored trimmed.
    pub fn new(display_name: &str, owner_identifier: &str, image_url: &str, file_name: &str) -> Self {
        Entry {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.trim().to_string(),
            owner_identifier: owner_identifier.to_string(),
            image_url: image_url.to_string(),
            file_name: file_name.to_string(),
            created_at: Utc::now(),
            votes: 0,
        }
    }
}

// ============================================================================
// ENTRY STORE
// ============================================================================

/// Plain keyed collection of entries. Holds no lock of its own; the rules
/// engine owns the mutual exclusion around every check-then-mutate sequence.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        EntryStore {
            entries: Vec::new(),
        }
    }

    /// Rebuild a store from persisted records.
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        EntryStore { entries }
    }

    pub fn insert(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn get_by_id_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn find_by_owner(&self, identifier: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.owner_identifier == identifier)
    }

    /// Case-insensitive display-name lookup (trims both sides).
    pub fn find_by_name_ci(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| names_match(&e.display_name, name))
    }

    pub fn all(&self) -> &[Entry] {
        &self.entries
    }

    /// Remove an entry by id, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Entry> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_realistic_names() {
        assert!(validate_display_name("Alice").is_empty());
        assert!(validate_display_name("Jean-Luc Picard").is_empty());
        assert!(validate_display_name("Björn Müller").is_empty());
        assert!(validate_display_name("J. R. R. Tolkien").is_empty());
        assert!(validate_display_name("Agent 47").is_empty());
        // Leading/trailing whitespace is trimmed before the rules apply
        assert!(validate_display_name("  Alice  ").is_empty());
    }

    #[test]
    fn test_validate_name_rejects_and_itemizes() {
        assert_eq!(validate_display_name(""), vec!["Name is required"]);
        assert_eq!(validate_display_name("   "), vec!["Name is required"]);

        let too_short = validate_display_name("A");
        assert_eq!(too_short.len(), 1);
        assert!(too_short[0].contains("at least 2"));

        let too_long = validate_display_name(&"x".repeat(51));
        assert_eq!(too_long.len(), 1);
        assert!(too_long[0].contains("at most 50"));

        let bad_charset = validate_display_name("Alice <script>");
        assert_eq!(bad_charset.len(), 1);
        assert!(bad_charset[0].contains("letters"));

        // Too short AND bad charset: both reasons reported
        let both = validate_display_name("@");
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_boundary_lengths() {
        assert!(validate_display_name("Al").is_empty());
        assert!(validate_display_name(&"x".repeat(50)).is_empty());
        // Multi-byte characters count as one character, not several bytes
        assert!(validate_display_name(&"ö".repeat(50)).is_empty());
    }

    #[test]
    fn test_names_match_is_case_and_trim_insensitive() {
        assert!(names_match("Alice", "alice"));
        assert!(names_match(" ALICE ", "alice"));
        assert!(!names_match("Alice", "Alicia"));
    }

    #[test]
    fn test_store_lookups() {
        let mut store = EntryStore::new();
        let entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        let id = entry.id.clone();
        store.insert(entry);

        assert_eq!(store.len(), 1);
        assert!(store.get_by_id(&id).is_some());
        assert!(store.get_by_id("nope").is_none());
        assert!(store.find_by_owner("owner-1").is_some());
        assert!(store.find_by_owner("owner-2").is_none());
        assert!(store.find_by_name_ci("  aLiCe ").is_some());
        assert!(store.find_by_name_ci("Bob").is_none());
    }

    #[test]
    fn test_store_remove() {
        let mut store = EntryStore::new();
        let entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        let id = entry.id.clone();
        store.insert(entry);

        let removed = store.remove(&id).unwrap();
        assert_eq!(removed.display_name, "Alice");
        assert!(store.is_empty());
        assert!(store.remove(&id).is_none());
    }

    #[test]
    fn test_entry_serializes_with_wire_field_names() {
        let entry = Entry::new("Alice", "owner-1", "/uploads/a.jpg", "a.jpg");
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["userName"], "Alice");
        assert_eq!(json["userIdentifier"], "owner-1");
        assert_eq!(json["imageUrl"], "/uploads/a.jpg");
        assert_eq!(json["votes"], 0);
        assert!(json["uploadedAt"].is_string());
    }
}
