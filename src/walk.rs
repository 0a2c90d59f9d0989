//! Score-weighted random walks for sampling stored terms.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::node::TrieNode;
use crate::trie::Trie;

impl Trie {
    /// Sample a live term, see [`Trie::random_entry_with`].
    pub fn random_walk(&self, min_steps: usize) -> Option<String> {
        self.random_walk_with(&mut rand::thread_rng(), min_steps)
    }

    pub fn random_walk_with<R: Rng + ?Sized>(&self, rng: &mut R, min_steps: usize) -> Option<String> {
        self.random_entry_with(rng, min_steps).map(|(term, _)| term)
    }

    /// Sample a live term together with its score.
    ///
    /// Starting at the root, each hop picks a child with probability
    /// proportional to its `max_child_score`, so dead branches are never
    /// taken. The walk ends on the first live terminal reached after at least
    /// `min_steps` hops. A live leaf reached too early restarts the walk at
    /// the root; the hop counter carries over, so the walk always ends.
    ///
    /// Returns `None` when the trie holds no live term.
    pub fn random_entry_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        min_steps: usize,
    ) -> Option<(String, f32)> {
        let root = self.root();
        if root.max_child_score() <= 0.0 {
            return None;
        }

        let mut path: Vec<&TrieNode> = Vec::new();
        let mut node = root;
        let mut steps = 0usize;
        loop {
            if node.is_live() && steps >= min_steps {
                let term = path.iter().flat_map(|n| n.fragment()).collect();
                return Some((term, node.score()));
            }
            match pick_child(node, rng) {
                Some(child) => {
                    path.push(child);
                    node = child;
                    steps += 1;
                }
                None => {
                    path.clear();
                    node = root;
                }
            }
        }
    }
}

/// Choose a child weighted by subtree score. `None` if no child holds a live term.
fn pick_child<'a, R: Rng + ?Sized>(node: &'a TrieNode, rng: &mut R) -> Option<&'a TrieNode> {
    let children = node.children();
    // Summed in f64: two scores near f32::MAX overflow an f32 total.
    let weights = WeightedIndex::new(children.iter().map(|c| f64::from(c.max_child_score()))).ok()?;
    children.get(weights.sample(rng))
}
