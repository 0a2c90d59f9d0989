//! Resumable, automaton-driven traversal.
//!
//! [`TrieIterator`] keeps an explicit stack of frames, one per node on the
//! current path, and a buffer holding the path's code points. Each call to
//! `next` resumes exactly where the previous one stopped. Every frame moves
//! through three states:
//!
//! - `Fragment`: offer the node's fragment to the filter, one code point per step.
//! - `Match`: the fragment was fully accepted on a live terminal; yield it.
//! - `Children`: push the next child whose `max_child_score` clears the
//!   threshold, or pop once all children were tried.

use std::iter::FusedIterator;

use crate::filter::{AcceptAll, PrefixFilter, Step, StepFilter};
use crate::node::TrieNode;
use crate::runes::MAX_TERM_LEN;
use crate::trie::Trie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Fragment,
    Match,
    Children,
}

#[derive(Debug)]
struct Frame<'a> {
    node: &'a TrieNode,
    state: FrameState,
    /// Fragment code points fed to the filter and pushed onto the path.
    consumed: usize,
    next_child: usize,
    /// Children pruned by score below this frame.
    skipped: usize,
}

/// Passed to the pop callback whenever a frame leaves the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopInfo {
    /// Code points the popped frame had added to the path.
    pub consumed: usize,
    /// Children of the popped frame pruned by score without being visited.
    pub skipped: usize,
}

/// Work counters of one traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterStats {
    /// Nodes pushed onto the stack.
    pub nodes_consumed: usize,
    /// Nodes pruned by score.
    pub nodes_skipped: usize,
}

/// One match produced by [`TrieIterator`].
#[derive(Debug, Clone, PartialEq)]
pub struct TrieEntry<'a> {
    pub term: String,
    pub payload: Option<&'a [u8]>,
    pub score: f32,
}

enum Advance {
    Done,
    Continue,
    Matched,
}

/// A cursor enumerating the live terms accepted by a [`StepFilter`].
///
/// The iterator borrows the trie and never outlives it. It cannot be
/// rewound; build a new one to enumerate again.
pub struct TrieIterator<'a, F> {
    /// Pushed lazily so the threshold can be set before the first step.
    pending_root: Option<&'a TrieNode>,
    stack: Vec<Frame<'a>>,
    buf: Vec<char>,
    filter: F,
    on_pop: Option<Box<dyn FnMut(PopInfo) + 'a>>,
    min_score: f32,
    stats: IterStats,
}

impl<'a, F: StepFilter> TrieIterator<'a, F> {
    pub(crate) fn new(root: &'a TrieNode, filter: F) -> Self {
        Self {
            pending_root: Some(root),
            stack: Vec::with_capacity(MAX_TERM_LEN + 1),
            buf: Vec::with_capacity(MAX_TERM_LEN),
            filter,
            on_pop: None,
            min_score: 0.0,
            stats: IterStats::default(),
        }
    }

    /// Skip every subtree whose best live score is below `min_score`, and
    /// every match scoring below it.
    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Call `f` each time a frame is popped.
    pub fn on_pop(mut self, f: impl FnMut(PopInfo) + 'a) -> Self {
        self.on_pop = Some(Box::new(f));
        self
    }

    /// Change the threshold between calls to `next`. Frames already on the
    /// stack are kept; pruning applies from the next child transition.
    #[inline]
    pub fn set_min_score(&mut self, min_score: f32) {
        self.min_score = min_score;
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.min_score
    }

    #[inline]
    pub fn stats(&self) -> IterStats {
        self.stats
    }

    /// The filter, in the state it had when the last match was produced.
    #[inline]
    pub fn filter(&self) -> &F {
        &self.filter
    }

    #[inline]
    fn admits(node: &TrieNode, min_score: f32) -> bool {
        let best = node.max_child_score();
        best > 0.0 && best >= min_score
    }

    fn push(&mut self, node: &'a TrieNode) {
        self.stack.push(Frame {
            node,
            state: FrameState::Fragment,
            consumed: 0,
            next_child: 0,
            skipped: 0,
        });
        self.stats.nodes_consumed += 1;
    }

    fn pop(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.buf.truncate(self.buf.len() - frame.consumed);
        self.filter.pop(frame.consumed);
        if let Some(on_pop) = self.on_pop.as_mut() {
            on_pop(PopInfo {
                consumed: frame.consumed,
                skipped: frame.skipped,
            });
        }
    }

    /// One state transition of the top frame.
    fn advance(&mut self) -> Advance {
        if let Some(root) = self.pending_root.take() {
            if Self::admits(root, self.min_score) {
                self.push(root);
            } else {
                self.stats.nodes_skipped += 1;
            }
        }

        let min_score = self.min_score;
        let Some(top) = self.stack.last_mut() else {
            return Advance::Done;
        };
        let node = top.node;

        match top.state {
            FrameState::Match => {
                top.state = FrameState::Children;
                Advance::Continue
            }
            FrameState::Fragment => {
                let frag = node.fragment();
                if top.consumed == frag.len() {
                    top.state = FrameState::Children;
                    return Advance::Continue;
                }
                let c = frag[top.consumed];
                match self.filter.step(c) {
                    Step::Stop => {
                        self.pop();
                        Advance::Continue
                    }
                    Step::Continue { matched } => {
                        self.buf.push(c);
                        top.consumed += 1;
                        if top.consumed < frag.len() {
                            return Advance::Continue;
                        }
                        if matched && node.is_live() && node.score() >= min_score {
                            top.state = FrameState::Match;
                            Advance::Matched
                        } else {
                            top.state = FrameState::Children;
                            Advance::Continue
                        }
                    }
                }
            }
            FrameState::Children => {
                match node.children().get(top.next_child) {
                    Some(child) => {
                        top.next_child += 1;
                        if Self::admits(child, min_score) {
                            self.push(child);
                        } else {
                            top.skipped += 1;
                            self.stats.nodes_skipped += 1;
                        }
                    }
                    None => self.pop(),
                }
                Advance::Continue
            }
        }
    }
}

impl<'a, F: StepFilter> Iterator for TrieIterator<'a, F> {
    type Item = TrieEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.advance() {
                Advance::Done => return None,
                Advance::Continue => {}
                Advance::Matched => {
                    let node = self.stack.last()?.node;
                    return Some(TrieEntry {
                        term: self.buf.iter().collect(),
                        payload: node.payload(),
                        score: node.score(),
                    });
                }
            }
        }
    }
}

impl<F: StepFilter> FusedIterator for TrieIterator<'_, F> {}

impl Trie {
    /// Enumerate every live term in code-point order.
    pub fn iter(&self) -> TrieIterator<'_, AcceptAll> {
        TrieIterator::new(self.root(), AcceptAll)
    }

    /// Enumerate the live terms starting with `prefix`.
    pub fn iter_prefix(&self, prefix: &str) -> TrieIterator<'_, PrefixFilter> {
        TrieIterator::new(self.root(), PrefixFilter::new(prefix))
    }

    /// Enumerate the live terms accepted by `filter`.
    pub fn iter_with<F: StepFilter>(&self, filter: F) -> TrieIterator<'_, F> {
        TrieIterator::new(self.root(), filter)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;

    use super::*;
    use crate::trie::AddMode;

    /// Wraps a filter and counts how it is driven.
    struct Counting<F> {
        inner: F,
        steps: usize,
        continued: usize,
        popped: usize,
    }

    impl<F> Counting<F> {
        fn new(inner: F) -> Self {
            Self {
                inner,
                steps: 0,
                continued: 0,
                popped: 0,
            }
        }
    }

    impl<F: StepFilter> StepFilter for Counting<F> {
        fn step(&mut self, c: char) -> Step {
            self.steps += 1;
            let step = self.inner.step(c);
            if matches!(step, Step::Continue { .. }) {
                self.continued += 1;
            }
            step
        }

        fn pop(&mut self, consumed: usize) {
            self.popped += consumed;
            self.inner.pop(consumed);
        }
    }

    fn build(entries: &[(&str, f32)]) -> Trie {
        let mut t = Trie::new();
        for &(term, score) in entries {
            t.add(term, score, None, AddMode::Replace).unwrap();
        }
        t
    }

    fn terms<F: StepFilter>(it: TrieIterator<'_, F>) -> Vec<String> {
        it.map(|e| e.term).collect()
    }

    #[test]
    fn test_iter_all_in_order() {
        let t = build(&[("b", 2.0), ("a", 1.0), ("c", 3.0), ("ab", 4.0), ("abc", 5.0)]);
        assert_eq!(terms(t.iter()), vec!["a", "ab", "abc", "b", "c"]);

        let scores: Vec<f32> = t.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![1.0, 4.0, 5.0, 2.0, 3.0]);
    }

    #[test]
    fn test_iter_empty_trie() {
        let t = Trie::new();
        let mut it = t.iter();
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_prefix_scenario_after_delete() {
        let mut t = build(&[("hello", 1.0), ("help", 2.0), ("world", 1.5)]);
        assert_eq!(terms(t.iter_prefix("he")), vec!["hello", "help"]);

        t.delete("help");
        let found: Vec<TrieEntry<'_>> = t.iter_prefix("he").collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].term, "hello");
        assert_eq!(found[0].score, 1.0);
    }

    #[test]
    fn test_prefix_inside_fragment_and_exact() {
        let t = build(&[("testing", 1.0), ("tested", 2.0), ("test", 3.0), ("toast", 4.0)]);
        assert_eq!(terms(t.iter_prefix("tes")), vec!["test", "tested", "testing"]);
        assert_eq!(terms(t.iter_prefix("test")), vec!["test", "tested", "testing"]);
        assert_eq!(terms(t.iter_prefix("testi")), vec!["testing"]);
        assert!(terms(t.iter_prefix("tex")).is_empty());
        assert_eq!(terms(t.iter_prefix("")).len(), 4);
    }

    #[test]
    fn test_payloads_are_yielded() {
        let mut t = Trie::new();
        t.add("k1", 1.0, Some(b"v1"), AddMode::Replace).unwrap();
        t.add("k2", 1.0, None, AddMode::Replace).unwrap();
        let got: Vec<_> = t.iter().map(|e| (e.term, e.payload)).collect();
        assert_eq!(
            got,
            vec![("k1".to_string(), Some(&b"v1"[..])), ("k2".to_string(), None)]
        );
    }

    #[test]
    fn test_threshold_above_max_prunes_at_root() {
        let t = build(&[("alpha", 1.0), ("beta", 2.0), ("gamma", 3.0)]);
        let mut filter = Counting::new(AcceptAll);
        let mut it = t.iter_with(&mut filter).min_score(10.0);
        assert_eq!(it.next(), None);
        assert_eq!(it.stats().nodes_consumed, 0);
        assert_eq!(it.stats().nodes_skipped, 1);
        drop(it);
        assert_eq!(filter.steps, 0);
    }

    #[test]
    fn test_threshold_prunes_low_subtrees() {
        let t = build(&[("apple", 1.0), ("apricot", 5.0), ("banana", 2.0), ("blueberry", 6.0)]);
        let mut filter = Counting::new(AcceptAll);
        let it = t.iter_with(&mut filter).min_score(3.0);
        assert_eq!(terms(it), vec!["apricot", "blueberry"]);
        // "ple" and "anana" were never offered to the filter.
        assert_eq!(filter.steps, "apricot".len() + "blueberry".len());
    }

    #[test]
    fn test_raise_threshold_mid_iteration() {
        let t = build(&[("a", 1.0), ("b", 5.0), ("c", 2.0), ("d", 7.0)]);
        let mut it = t.iter();
        assert_eq!(it.next().map(|e| e.term), Some("a".to_string()));
        it.set_min_score(5.0);
        assert_eq!(it.threshold(), 5.0);
        let rest: Vec<String> = it.map(|e| e.term).collect();
        assert_eq!(rest, vec!["b", "d"]);
    }

    #[test]
    fn test_deleted_subtrees_are_skipped() {
        let mut t = build(&[("abc", 1.0), ("abd", 2.0), ("x", 3.0)]);
        t.delete("abc");
        t.delete("abd");
        let mut filter = Counting::new(AcceptAll);
        assert_eq!(terms(t.iter_with(&mut filter)), vec!["x"]);
        assert_eq!(filter.steps, 1);
    }

    #[test]
    fn test_pop_callback_balances_path() {
        let t = build(&[("hello", 1.0), ("help", 2.0), ("helium", 3.0), ("world", 1.5)]);
        let popped = Cell::new(0usize);
        let pops = Cell::new(0usize);
        let mut filter = Counting::new(PrefixFilter::new("hel"));
        {
            let it = t.iter_with(&mut filter).on_pop(|info| {
                popped.set(popped.get() + info.consumed);
                pops.set(pops.get() + 1);
            });
            assert_eq!(terms(it), vec!["helium", "hello", "help"]);
        }
        // Everything pushed onto the path was popped again.
        assert_eq!(popped.get(), filter.continued);
        assert_eq!(filter.popped, filter.continued);
        assert!(pops.get() > 0);
    }

    #[test]
    fn test_pop_callback_reports_skipped_children() {
        let t = build(&[("a", 1.0), ("b", 9.0), ("c", 1.0)]);
        let skipped = Cell::new(0usize);
        let it = t
            .iter()
            .min_score(5.0)
            .on_pop(|info| skipped.set(skipped.get() + info.skipped));
        assert_eq!(terms(it), vec!["b"]);
        assert_eq!(skipped.get(), 2);
    }

    #[test]
    fn test_prefix_completeness_random() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(7);
        let alphabet = ['a', 'b', 'c', 'é'];
        let mut t = Trie::new();
        let mut live = BTreeSet::new();

        for _ in 0..3000 {
            let len = rng.gen_range(1..7);
            let term: String = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            if rng.gen_bool(0.25) {
                assert_eq!(t.delete(&term), live.remove(&term));
            } else {
                t.add(&term, rng.gen_range(1..100) as f32, None, AddMode::Replace)
                    .unwrap();
                live.insert(term);
            }
        }

        for prefix in ["", "a", "ab", "abc", "é", "bé", "cca"] {
            let got = terms(t.iter_prefix(prefix));
            let expected: Vec<String> = live
                .iter()
                .filter(|term| term.starts_with(prefix))
                .cloned()
                .collect();
            assert_eq!(got, expected, "prefix {:?}", prefix);
        }
    }
}
