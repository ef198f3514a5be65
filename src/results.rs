// Results Ranker - deterministic leaderboard
// Pure function of the current entries; nothing here caches

use crate::entry::Entry;
use serde::Serialize;

/// An entry plus its 1-based leaderboard position.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub rank: usize,
}

/// Order entries by vote count descending, ties broken by creation time
/// ascending (the earlier upload ranks higher), and assign ranks.
pub fn rank_entries(entries: &[Entry]) -> Vec<RankedEntry> {
    let mut sorted: Vec<Entry> = entries.to_vec();
    sorted.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RankedEntry {
            entry,
            rank: index + 1,
        })
        .collect()
}
