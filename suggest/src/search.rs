//! Top-K suggestion search.
//!
//! Candidates stream out of a [`TrieIterator`] into a bounded min-heap. Once
//! the heap is full its worst score becomes the iterator's threshold, so
//! every subtree that cannot beat the current top K is skipped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use log::trace;
use termtrie::{runes, PrefixFilter, StepFilter, Trie, TrieIterator};

use crate::automata::LevenshteinFilter;
use crate::config::Config;
use crate::error::{Result, SuggestError};

/// How a query is matched and ranked.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub max_results: usize,
    /// Match within `max_distance` edits instead of literally.
    pub fuzzy: bool,
    pub max_distance: u32,
    /// Match the query as a prefix of stored terms rather than the whole term.
    pub prefix_mode: bool,
    /// Drop results scoring below `best / trim_factor`.
    pub trim: bool,
    pub trim_factor: f32,
    pub with_payloads: bool,
    /// Queries must be strictly shorter than this, in code points.
    pub max_query_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Config::default().search_options()
    }
}

impl SearchOptions {
    pub fn max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub fn fuzzy(mut self, max_distance: u32) -> Self {
        self.fuzzy = true;
        self.max_distance = max_distance;
        self
    }

    pub fn prefix_mode(mut self, prefix_mode: bool) -> Self {
        self.prefix_mode = prefix_mode;
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    pub fn with_payloads(mut self, with_payloads: bool) -> Self {
        self.with_payloads = with_payloads;
        self
    }
}

/// One ranked result.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub term: String,
    /// Ranking score: the stored score, smoothed by edit distance for fuzzy
    /// matches.
    pub score: f32,
    pub distance: u32,
    /// The stored term equals the query.
    pub exact: bool,
    pub payload: Option<Vec<u8>>,
}

/// Heap ordering: higher score first, then smaller term.
struct Ranked(Suggestion);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.term.cmp(&self.0.term))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopK {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    /// Returns the new admission threshold once the heap is full.
    fn offer(&mut self, s: Suggestion) -> Option<f32> {
        let candidate = Ranked(s);
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(candidate));
        } else {
            match self.heap.peek() {
                Some(Reverse(worst)) if candidate > *worst => {
                    self.heap.pop();
                    self.heap.push(Reverse(candidate));
                }
                _ => return None,
            }
        }
        if self.heap.len() == self.capacity {
            self.heap.peek().map(|Reverse(worst)| worst.0.score)
        } else {
            None
        }
    }

    fn into_sorted(self) -> Vec<Suggestion> {
        // Ascending over `Reverse` is descending rank.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(r)| r.0)
            .collect()
    }
}

/// Score of a fuzzy match `distance` edits away.
#[inline]
pub fn smooth(score: f32, distance: u32) -> f32 {
    score * (-2.0 * distance as f32).exp()
}

/// Rank the terms of `trie` matching `query`.
///
/// A stored term equal to the query always comes first, whatever its score.
/// The rest follow by descending ranking score, ties broken by term.
pub fn search(trie: &Trie, query: &str, opts: &SearchOptions) -> Result<Vec<Suggestion>> {
    let query_runes = runes::runes(query);
    if query_runes.len() >= opts.max_query_len {
        return Err(SuggestError::PrefixTooLong {
            len: query_runes.len(),
            max: opts.max_query_len,
        });
    }
    if opts.max_results == 0 {
        return Ok(Vec::new());
    }

    let exact = trie.get(query).map(|(score, payload)| Suggestion {
        term: query.to_owned(),
        score,
        distance: 0,
        exact: true,
        payload: payload.filter(|_| opts.with_payloads).map(<[u8]>::to_vec),
    });

    let mut top = TopK::new(opts.max_results - usize::from(exact.is_some()));
    if top.capacity > 0 {
        if opts.fuzzy {
            let filter = LevenshteinFilter::from_runes(query_runes, opts.max_distance, opts.prefix_mode);
            collect(trie.iter_with(filter), query, opts, &mut top, |f| f.distance());
        } else if opts.prefix_mode {
            let filter = PrefixFilter::from_runes(query_runes);
            collect(trie.iter_with(filter), query, opts, &mut top, |_| 0);
        }
    }

    let mut results = top.into_sorted();
    if let Some(exact) = exact {
        results.insert(0, exact);
    }
    if opts.trim {
        trim(&mut results, opts.trim_factor);
    }
    Ok(results)
}

fn collect<F, D>(mut it: TrieIterator<'_, F>, query: &str, opts: &SearchOptions, top: &mut TopK, distance: D)
where
    F: StepFilter,
    D: Fn(&F) -> u32,
{
    let mut candidates = 0usize;
    while let Some(entry) = it.next() {
        if entry.term == query {
            continue;
        }
        candidates += 1;
        let distance = distance(TrieIterator::filter(&it));
        let score = if opts.fuzzy {
            smooth(entry.score, distance)
        } else {
            entry.score
        };
        let suggestion = Suggestion {
            term: entry.term,
            score,
            distance,
            exact: false,
            payload: entry.payload.filter(|_| opts.with_payloads).map(<[u8]>::to_vec),
        };
        if let Some(threshold) = top.offer(suggestion) {
            it.set_min_score(threshold);
        }
    }
    trace!(
        "search {:?}: {} candidates, {:?}, final threshold {}",
        query,
        candidates,
        it.stats(),
        it.threshold()
    );
}

fn trim(results: &mut Vec<Suggestion>, factor: f32) {
    let best = results.iter().map(|s| s.score).fold(0.0f32, f32::max);
    let floor = best / factor;
    results.retain(|s| s.exact || s.score >= floor);
}
