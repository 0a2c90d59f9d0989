use termtrie::TrieError;
use thiserror::Error;

/// Errors raised by the suggestion index and its snapshots.
#[derive(Debug, Error)]
pub enum SuggestError {
    #[error(transparent)]
    Trie(#[from] TrieError),

    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot ended early or holds malformed data.
    #[error("corrupt snapshot at byte {offset}: {reason}")]
    Corrupt { offset: usize, reason: &'static str },

    #[error("unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("query has {len} code points, it must be shorter than {max}")]
    PrefixTooLong { len: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, SuggestError>;
