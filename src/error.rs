use thiserror::Error;

/// Errors returned by mutating trie operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrieError {
    /// Scores must be finite and strictly positive; `0` is reserved for "absent".
    #[error("invalid score {0}: scores must be finite and greater than zero")]
    InvalidScore(f32),

    #[error("empty terms cannot be stored")]
    EmptyTerm,

    #[error("term has {len} code points, the maximum is {max}")]
    TermTooLong { len: usize, max: usize },

    /// Reserving node storage failed. Nothing was mutated.
    #[error("allocation failed while growing the trie")]
    Alloc,
}

impl From<std::collections::TryReserveError> for TrieError {
    fn from(_: std::collections::TryReserveError) -> Self {
        TrieError::Alloc
    }
}

impl From<smallvec::CollectionAllocErr> for TrieError {
    fn from(_: smallvec::CollectionAllocErr) -> Self {
        TrieError::Alloc
    }
}

/// Result type for trie operations.
pub type Result<T> = std::result::Result<T, TrieError>;
