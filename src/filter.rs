//! Step filters: the automata that drive [`TrieIterator`](crate::TrieIterator).
//!
//! The iterator feeds a filter one code point at a time as it descends, and
//! tells it how many code points to forget whenever it backtracks. The trie
//! knows nothing else about the automaton.

use crate::runes::{self, Runes};

/// Verdict of a filter on the code point it was just fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep descending. `matched` means the path fed so far is accepted.
    Continue { matched: bool },
    /// No continuation through this code point can match; prune the branch.
    /// The code point is not considered consumed.
    Stop,
}

/// A matching automaton driven by the trie iterator.
pub trait StepFilter {
    /// Feed the next code point of the current path.
    fn step(&mut self, c: char) -> Step;

    /// The iterator backtracked over the last `consumed` code points that
    /// were answered with [`Step::Continue`].
    fn pop(&mut self, consumed: usize) {
        let _ = consumed;
    }
}

impl<F: StepFilter + ?Sized> StepFilter for &mut F {
    #[inline]
    fn step(&mut self, c: char) -> Step {
        (**self).step(c)
    }

    #[inline]
    fn pop(&mut self, consumed: usize) {
        (**self).pop(consumed)
    }
}

/// Accepts every path: iteration enumerates all live terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl StepFilter for AcceptAll {
    #[inline]
    fn step(&mut self, _c: char) -> Step {
        Step::Continue { matched: true }
    }
}

/// Accepts exactly the paths that start with a literal prefix.
#[derive(Debug, Clone)]
pub struct PrefixFilter {
    prefix: Runes,
    depth: usize,
}

impl PrefixFilter {
    pub fn new(prefix: &str) -> Self {
        Self::from_runes(runes::runes(prefix))
    }

    pub fn from_runes(prefix: Runes) -> Self {
        Self { prefix, depth: 0 }
    }

    /// Number of code points on the current path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl StepFilter for PrefixFilter {
    fn step(&mut self, c: char) -> Step {
        if let Some(&expected) = self.prefix.get(self.depth) {
            if c != expected {
                return Step::Stop;
            }
        }
        self.depth += 1;
        Step::Continue {
            matched: self.depth >= self.prefix.len(),
        }
    }

    fn pop(&mut self, consumed: usize) {
        debug_assert!(consumed <= self.depth);
        self.depth -= consumed;
    }
}
