//! Trie node layout plus the split and merge primitives.
//!
//! Each node owns the fragment labelling the edge from its parent, its
//! terminal state and payload, and a vector of children sorted by their
//! leading code point. Sorting keeps child dispatch to one binary search and
//! makes the radix property (distinct leading code points) easy to check.

use smallvec::SmallVec;

use crate::error::Result;

/// Fragments up to this many code points are stored inline.
const INLINE_FRAGMENT: usize = 6;

pub(crate) type Fragment = SmallVec<[char; INLINE_FRAGMENT]>;

const TERMINAL: u8 = 0x1;
const DELETED: u8 = 0x2;

/// One edge-labelled segment of the trie.
#[derive(Debug, Clone)]
pub struct TrieNode {
    fragment: Fragment,
    flags: u8,
    /// Only meaningful when the node is live.
    score: f32,
    /// Upper bound of every live score in this subtree, own score included.
    max_child_score: f32,
    payload: Option<Box<[u8]>>,
    children: Vec<TrieNode>,
}

impl TrieNode {
    /// Create the root: an empty, non-terminal node.
    pub(crate) fn root() -> Self {
        Self {
            fragment: Fragment::new(),
            flags: 0,
            score: 0.0,
            max_child_score: 0.0,
            payload: None,
            children: Vec::new(),
        }
    }

    /// Create a terminal leaf for `fragment`.
    pub(crate) fn leaf(fragment: &[char], score: f32, payload: Option<&[u8]>) -> Result<Self> {
        let mut frag = Fragment::new();
        frag.try_reserve(fragment.len())?;
        frag.extend_from_slice(fragment);
        Ok(Self {
            fragment: frag,
            flags: TERMINAL,
            score,
            max_child_score: score,
            payload: payload.map(Box::from),
            children: Vec::new(),
        })
    }

    #[inline]
    pub fn fragment(&self) -> &[char] {
        &self.fragment
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.flags & TERMINAL != 0
    }

    /// Tombstoned: terminal once, logically absent now.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags & DELETED != 0
    }

    /// Terminal and not tombstoned.
    #[inline]
    pub fn is_live(&self) -> bool {
        self.flags & (TERMINAL | DELETED) == TERMINAL
    }

    #[inline]
    pub fn score(&self) -> f32 {
        self.score
    }

    #[inline]
    pub fn max_child_score(&self) -> f32 {
        self.max_child_score
    }

    #[inline]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    #[inline]
    pub fn children(&self) -> &[TrieNode] {
        &self.children
    }

    /// The score if live, otherwise `0`.
    #[inline]
    pub(crate) fn live_score(&self) -> f32 {
        if self.is_live() {
            self.score
        } else {
            0.0
        }
    }

    /// Binary search for the child starting with `c`.
    #[inline]
    pub(crate) fn child_index(&self, c: char) -> std::result::Result<usize, usize> {
        self.children.binary_search_by(|ch| ch.fragment[0].cmp(&c))
    }

    #[inline]
    pub(crate) fn child(&self, c: char) -> Option<&TrieNode> {
        self.child_index(c).ok().map(|i| &self.children[i])
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, c: char) -> Option<&mut TrieNode> {
        match self.child_index(c) {
            Ok(i) => Some(&mut self.children[i]),
            Err(_) => None,
        }
    }

    /// Take ownership of `child`, keeping children sorted by leading code point.
    ///
    /// `child` must have a non-empty fragment whose first code point no
    /// existing child starts with.
    pub(crate) fn attach_child(&mut self, child: TrieNode) -> Result<()> {
        debug_assert!(!child.fragment.is_empty(), "child fragments are never empty");
        let pos = match self.child_index(child.fragment[0]) {
            Ok(pos) => {
                debug_assert!(false, "radix property violated by attach_child");
                pos
            }
            Err(pos) => pos,
        };
        self.children.try_reserve(1)?;
        self.max_child_score = self.max_child_score.max(child.max_child_score);
        self.children.insert(pos, child);
        Ok(())
    }

    /// Make this node live with `score` and `payload`, clearing any tombstone.
    pub(crate) fn make_terminal(&mut self, score: f32, payload: Option<&[u8]>) {
        self.flags = TERMINAL;
        self.score = score;
        self.payload = payload.map(Box::from);
    }

    /// Tombstone a live node. Returns whether it was live.
    pub(crate) fn tombstone(&mut self) -> bool {
        if !self.is_live() {
            return false;
        }
        self.flags |= DELETED;
        self.score = 0.0;
        self.payload = None;
        true
    }

    #[inline]
    pub(crate) fn set_score(&mut self, score: f32) {
        debug_assert!(self.is_live());
        self.score = score;
    }

    #[inline]
    pub(crate) fn set_payload(&mut self, payload: Option<&[u8]>) {
        self.payload = payload.map(Box::from);
    }

    /// Recompute `max_child_score` from the own live score and the children.
    pub(crate) fn refresh_max_score(&mut self) {
        self.max_child_score = self
            .children
            .iter()
            .fold(self.live_score(), |acc, ch| acc.max(ch.max_child_score));
    }

    /// Split the fragment at `offset`, pushing the suffix down into a new
    /// single child that inherits this node's state, payload and children.
    ///
    /// Afterwards this node is a non-terminal holding `fragment[..offset]`
    /// with room reserved for one more child. All storage is reserved before
    /// anything is moved, so on error the node is untouched.
    pub(crate) fn split(&mut self, offset: usize) -> Result<()> {
        debug_assert!(offset < self.fragment.len());

        let mut suffix = Fragment::new();
        suffix.try_reserve(self.fragment.len() - offset)?;
        let mut children = Vec::new();
        children.try_reserve(2)?;

        suffix.extend_from_slice(&self.fragment[offset..]);
        let child = TrieNode {
            fragment: suffix,
            flags: self.flags,
            score: self.score,
            max_child_score: self.max_child_score,
            payload: self.payload.take(),
            children: std::mem::take(&mut self.children),
        };
        children.push(child);

        self.fragment.truncate(offset);
        self.flags = 0;
        self.score = 0.0;
        self.children = children;
        // max_child_score is unchanged: the subtree holds the same live scores.
        Ok(())
    }

    /// Merge a non-live node that has exactly one child into that child.
    ///
    /// The merged node keeps this node's position and leading code point, so
    /// the parent's ordering is preserved. Returns whether a merge happened.
    pub(crate) fn merge_with_single_child(&mut self) -> Result<bool> {
        if self.is_live() || self.children.len() != 1 || self.fragment.is_empty() {
            return Ok(false);
        }
        self.fragment.try_reserve(self.children[0].fragment.len())?;

        let Some(child) = self.children.pop() else {
            return Ok(false);
        };
        self.fragment.extend_from_slice(&child.fragment);
        self.flags = child.flags;
        self.score = child.score;
        self.max_child_score = child.max_child_score;
        self.payload = child.payload;
        self.children = child.children;
        Ok(true)
    }

    /// Remove children that are neither live nor lead anywhere.
    /// Returns how many were removed.
    pub(crate) fn prune_dead_children(&mut self) -> usize {
        let before = self.children.len();
        self.children
            .retain(|ch| ch.is_live() || !ch.children.is_empty());
        let removed = before - self.children.len();
        if removed > 0 {
            self.children.shrink_to_fit();
        }
        removed
    }

    pub(crate) fn children_mut(&mut self) -> &mut [TrieNode] {
        &mut self.children
    }

    /// Approximate heap bytes owned by this subtree, including the node itself.
    pub(crate) fn mem_usage(&self) -> usize {
        let inline = std::mem::size_of::<Self>();
        let frag = if self.fragment.spilled() {
            self.fragment.capacity() * std::mem::size_of::<char>()
        } else {
            0
        };
        let payload = self.payload.as_ref().map_or(0, |p| p.len());
        let spare = (self.children.capacity() - self.children.len()) * inline;
        inline
            + frag
            + payload
            + spare
            + self.children.iter().map(TrieNode::mem_usage).sum::<usize>()
    }
}
