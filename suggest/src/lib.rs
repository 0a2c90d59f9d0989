//! # suggest
//!
//! Term suggestion on top of [`termtrie`]: ranked prefix completion, fuzzy
//! completion within an edit distance, score-weighted sampling and binary
//! snapshots, behind a thread-safe [`SuggestIndex`].
//!
//! ## Example
//!
//! ```rust
//! use suggest::{AddMode, SearchOptions, SuggestIndex};
//!
//! let index = SuggestIndex::new();
//! index.add("hello", 3.0, None, AddMode::Replace).unwrap();
//! index.add("help", 5.0, None, AddMode::Replace).unwrap();
//! index.add("world", 1.0, None, AddMode::Replace).unwrap();
//!
//! let top: Vec<String> = index.complete("he").unwrap().into_iter().map(|s| s.term).collect();
//! assert_eq!(top, vec!["help", "hello"]);
//!
//! let fuzzy = index.suggest("hwllo", &SearchOptions::default().fuzzy(1)).unwrap();
//! assert_eq!(fuzzy[0].term, "hello");
//! ```

#![warn(clippy::all)]

pub mod automata;
pub mod config;
pub mod error;
pub mod index;
pub mod search;
pub mod snapshot;

pub use automata::{LevenshteinFilter, WildcardFilter};
pub use config::Config;
pub use error::{Result, SuggestError};
pub use index::{MemoryStats, SuggestIndex};
pub use search::{search, SearchOptions, Suggestion};
pub use termtrie::{AddMode, AddOutcome, Trie};
