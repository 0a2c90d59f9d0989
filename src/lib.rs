//! # termtrie
//!
//! A compressed prefix trie over code points, built as a term-suggestion and
//! term-sampling index.
//!
//! Every stored term carries a positive score and an optional opaque
//! payload. Each node also tracks the best live score of its subtree, which
//! lets traversals skip whole branches that cannot beat a threshold.
//!
//! - **Exact lookup**: [`Trie::find`] returns the score, `0` meaning absent.
//! - **Insertion**: replace or accumulate scores with [`AddMode`].
//! - **Deletion**: tombstones only; [`Trie::compact`] reclaims them.
//! - **Enumeration**: [`TrieIterator`] is driven by any [`StepFilter`]
//!   (literal prefix, edit distance, wildcards...) and resumes one match at
//!   a time.
//! - **Sampling**: [`Trie::random_walk`] picks terms with probability
//!   guided by their scores.
//!
//! ## Example
//!
//! ```rust
//! use termtrie::{AddMode, Trie};
//!
//! let mut trie = Trie::new();
//! trie.add("hello", 1.0, None, AddMode::Replace).unwrap();
//! trie.add("help", 2.0, Some(b"meta"), AddMode::Replace).unwrap();
//! trie.add("world", 1.5, None, AddMode::Replace).unwrap();
//!
//! assert_eq!(trie.find("hello"), 1.0);
//! assert_eq!(trie.find("hel"), 0.0);
//!
//! let matches: Vec<String> = trie.iter_prefix("he").map(|e| e.term).collect();
//! assert_eq!(matches, vec!["hello", "help"]);
//!
//! trie.delete("help");
//! assert_eq!(trie.find("help"), 0.0);
//! ```

#![warn(clippy::all)]

mod debug;
pub mod error;
pub mod filter;
pub mod iter;
pub mod node;
pub mod runes;
pub mod trie;
mod walk;

pub use error::{Result, TrieError};
pub use filter::{AcceptAll, PrefixFilter, Step, StepFilter};
pub use iter::{IterStats, PopInfo, TrieEntry, TrieIterator};
pub use node::TrieNode;
pub use runes::{Runes, MAX_TERM_LEN};
pub use trie::{AddMode, AddOutcome, CompactStats, EntryRef, Trie, Visibility};

#[cfg(test)]
mod proptests;
