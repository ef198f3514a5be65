// Error Taxonomy - typed, request-local, recoverable
// Every rule violation is a variant here; the transport maps kinds to status codes

use std::fmt;

/// All the ways an upload, vote, or admin request can be rejected.
///
/// None of these terminate the process; each carries enough detail for a
/// human-readable response. The transport layer owns the status-code mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    /// Malformed or missing input; itemized reasons for the client
    Validation(Vec<String>),

    /// Upload request arrived without an image part
    MissingImage,

    /// This identifier already has a live entry
    DuplicateOwner,

    /// Another entry already uses this display name (case-insensitive)
    DuplicateName(String),

    /// This identifier already voted; carries the name of the entry
    /// the existing ballot points at
    DuplicateVote { voted_for: String },

    /// The target entry belongs to the voter's own identifier
    SelfVote,

    /// No live entry with this id
    EntryNotFound(String),

    /// Admin secret missing or mismatched
    Unauthorized,

    /// Uploads are switched off in the admin settings
    UploadsDisabled,

    /// Voting is switched off in the admin settings
    VotingDisabled,

    /// The external binary store or persistence layer failed mid-write
    StorageWrite(String),
}

impl fmt::Display for VoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteError::Validation(reasons) => {
                write!(f, "Invalid input: {}", reasons.join("; "))
            }
            VoteError::MissingImage => write!(f, "Image file is required"),
            VoteError::DuplicateOwner => write!(f, "User has already uploaded an outfit"),
            VoteError::DuplicateName(name) => {
                write!(f, "The name \"{}\" is already taken", name)
            }
            VoteError::DuplicateVote { voted_for } => {
                write!(f, "User has already voted (for \"{}\")", voted_for)
            }
            VoteError::SelfVote => write!(f, "Cannot vote for your own outfit"),
            VoteError::EntryNotFound(id) => write!(f, "Outfit not found: {}", id),
            VoteError::Unauthorized => write!(f, "Invalid admin password"),
            VoteError::UploadsDisabled => write!(f, "Uploads are currently disabled"),
            VoteError::VotingDisabled => write!(f, "Voting is currently disabled"),
            VoteError::StorageWrite(detail) => {
                write!(f, "Failed to store upload: {}", detail)
            }
        }
    }
}

impl std::error::Error for VoteError {}

pub type VoteResult<T> = Result<T, VoteError>;
