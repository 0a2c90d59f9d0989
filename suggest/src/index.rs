use std::path::Path;

use log::debug;
use parking_lot::RwLock;
use rand::Rng;
use termtrie::{AddMode, AddOutcome, CompactStats, Trie};

use crate::automata::WildcardFilter;
use crate::config::Config;
use crate::error::Result;
use crate::search::{search, SearchOptions, Suggestion};
use crate::snapshot;

/// Memory usage statistics for an index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStats {
    /// Approximate heap bytes held by trie nodes, payloads included.
    pub node_bytes: usize,
    /// Live terms stored.
    pub num_terms: usize,
    pub bytes_per_term: f64,
}

/// A thread-safe suggestion index.
///
/// Readers (lookups, suggestions, sampling) share the trie; writers take it
/// exclusively for the duration of one operation.
pub struct SuggestIndex {
    trie: RwLock<Trie>,
    config: Config,
}

impl SuggestIndex {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::from_trie(Trie::new(), config)
    }

    pub fn from_trie(trie: Trie, config: Config) -> Self {
        Self {
            trie: RwLock::new(trie),
            config,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert or update a term. See [`Trie::add`].
    pub fn add(&self, term: &str, score: f32, payload: Option<&[u8]>, mode: AddMode) -> Result<AddOutcome> {
        let mut trie = self.trie.write();
        Ok(trie.add(term, score, payload, mode)?)
    }

    /// Score of a live term, `0` if absent.
    pub fn score(&self, term: &str) -> f32 {
        self.trie.read().find(term)
    }

    pub fn get(&self, term: &str) -> Option<(f32, Option<Vec<u8>>)> {
        let trie = self.trie.read();
        trie.get(term).map(|(score, payload)| (score, payload.map(<[u8]>::to_vec)))
    }

    pub fn contains(&self, term: &str) -> bool {
        self.trie.read().contains(term)
    }

    /// Remove a term. Returns whether it was live.
    pub fn delete(&self, term: &str) -> bool {
        self.trie.write().delete(term)
    }

    pub fn len(&self) -> usize {
        self.trie.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ranked suggestions for `query`.
    pub fn suggest(&self, query: &str, opts: &SearchOptions) -> Result<Vec<Suggestion>> {
        let trie = self.trie.read();
        search(&trie, query, opts)
    }

    /// Prefix completion with the configured defaults.
    pub fn complete(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.suggest(query, &self.config.search_options())
    }

    /// Fuzzy prefix completion within the configured edit distance.
    pub fn complete_fuzzy(&self, query: &str) -> Result<Vec<Suggestion>> {
        let opts = self.config.search_options().fuzzy(self.config.fuzzy_distance);
        self.suggest(query, &opts)
    }

    /// Live terms matching a `*`/`?` pattern, in code-point order.
    pub fn glob(&self, pattern: &str, limit: usize) -> Vec<(String, f32)> {
        let trie = self.trie.read();
        trie.iter_with(WildcardFilter::new(pattern))
            .take(limit)
            .map(|e| (e.term, e.score))
            .collect()
    }

    /// Sample a live term, favouring high scores.
    pub fn sample(&self) -> Option<String> {
        self.sample_with(&mut rand::thread_rng())
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let trie = self.trie.read();
        trie.random_walk_with(rng, self.config.sample_min_steps)
    }

    /// Run `f` against a consistent view of the trie.
    pub fn read<T>(&self, f: impl FnOnce(&Trie) -> T) -> T {
        f(&self.trie.read())
    }

    /// Reclaim tombstones. Lookups are blocked meanwhile.
    pub fn compact(&self) -> Result<CompactStats> {
        Ok(self.trie.write().compact()?)
    }

    pub fn memory_usage(&self) -> MemoryStats {
        let trie = self.trie.read();
        let node_bytes = trie.mem_usage();
        let num_terms = trie.len();
        MemoryStats {
            node_bytes,
            num_terms,
            bytes_per_term: if num_terms > 0 {
                node_bytes as f64 / num_terms as f64
            } else {
                0.0
            },
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        snapshot::encode(&self.trie.read())
    }

    pub fn from_bytes(bytes: &[u8], config: Config) -> Result<Self> {
        Ok(Self::from_trie(snapshot::decode(bytes)?, config))
    }

    /// Persist the live terms to `path`. Writers wait until the file is
    /// written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let trie = self.trie.read();
        snapshot::save_file(&trie, path)
    }

    pub fn load(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let trie = snapshot::open_file(path)?;
        debug!("index loaded with {} terms", trie.len());
        Ok(Self::from_trie(trie, config))
    }

    /// Replace the contents with the snapshot at `path`. On error the index
    /// is left untouched.
    pub fn reload(&self, path: impl AsRef<Path>) -> Result<()> {
        let fresh = snapshot::open_file(path)?;
        *self.trie.write() = fresh;
        Ok(())
    }
}

impl Default for SuggestIndex {
    fn default() -> Self {
        Self::new()
    }
}
