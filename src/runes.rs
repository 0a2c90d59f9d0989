//! Conversion between UTF-8 terms and the code-point sequences stored in the trie.

use smallvec::SmallVec;

use crate::error::{Result, TrieError};

/// Maximum number of code points in a stored term.
pub const MAX_TERM_LEN: usize = 255;

/// A term decoded into code points. Most terms fit inline.
pub type Runes = SmallVec<[char; 32]>;

/// Decode `term` without any validation. Used by read paths, where an
/// invalid term simply never matches.
#[inline]
pub fn runes(term: &str) -> Runes {
    term.chars().collect()
}

/// Decode `term` and check it can be stored.
pub fn checked_runes(term: &str) -> Result<Runes> {
    let runes = runes(term);
    validate(&runes)?;
    Ok(runes)
}

pub(crate) fn validate(term: &[char]) -> Result<()> {
    if term.is_empty() {
        return Err(TrieError::EmptyTerm);
    }
    if term.len() > MAX_TERM_LEN {
        return Err(TrieError::TermTooLong {
            len: term.len(),
            max: MAX_TERM_LEN,
        });
    }
    Ok(())
}

#[inline]
pub fn to_string(term: &[char]) -> String {
    term.iter().collect()
}

/// Length of the longest common prefix of `a` and `b`.
#[inline]
pub(crate) fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
