// Outfit Voting - Core Library
// One photo per attendee, one vote per attendee, live-ranked results.
// Exposes all modules for use in the API server and tests.

pub mod admin;
pub mod ballot;
pub mod engine;
pub mod entry;
pub mod error;
pub mod identity;
pub mod persist;
pub mod results;
pub mod storage;

// Re-export commonly used types
pub use admin::{AdminController, AdminSettings, SettingsPatch};
pub use ballot::{Ballot, BallotStore};
pub use engine::{DeleteOutcome, ParticipantStatus, VotingEngine, VotingState};
pub use entry::{validate_display_name, Entry, EntryStore};
pub use error::{VoteError, VoteResult};
pub use identity::{
    ClientTokenResolver, IdentityResolver, RemoteAddrResolver, RequestIdentity,
    TokenOrAddrResolver,
};
pub use persist::SnapshotStore;
pub use results::{rank_entries, RankedEntry};
pub use storage::{
    validate_image, DiskImageStore, ImageStore, ImageUpload, MemoryImageStore, StoredImage,
    MAX_IMAGE_BYTES,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
