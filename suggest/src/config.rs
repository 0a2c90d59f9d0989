//! Tunables of a [`SuggestIndex`](crate::SuggestIndex).

use crate::search::SearchOptions;

/// Configuration for a suggestion index.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Queries must be strictly shorter than this, in code points.
    pub max_prefix_len: usize,
    /// Default number of suggestions returned.
    pub max_results: usize,
    /// Default edit distance for fuzzy suggestions.
    pub fuzzy_distance: u32,
    /// Trimming drops results scoring below `best / trim_factor`.
    pub trim_factor: f32,
    /// Minimum hops of the random walk used by sampling.
    pub sample_min_steps: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_prefix_len: 100,
            max_results: 5,
            fuzzy_distance: 1,
            trim_factor: 100.0,
            sample_min_steps: 4,
        }
    }
}

impl Config {
    /// Prefix completion with this config's limits, not fuzzy.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            max_results: self.max_results,
            fuzzy: false,
            max_distance: self.fuzzy_distance,
            prefix_mode: true,
            trim: false,
            trim_factor: self.trim_factor,
            with_payloads: false,
            max_query_len: self.max_prefix_len,
        }
    }
}
