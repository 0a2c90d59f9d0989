//! Matching automata for trie traversal.
//!
//! Each automaton implements [`termtrie::StepFilter`] and keeps one state per
//! code point on the current trie path, so backtracking is a truncation.

mod levenshtein;
mod wildcard;

pub use levenshtein::LevenshteinFilter;
pub use wildcard::WildcardFilter;
