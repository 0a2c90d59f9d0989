//! Insertion, deletion, exact lookup and maintenance over the node graph.

use log::debug;

use crate::error::{Result, TrieError};
use crate::node::TrieNode;
use crate::runes::{self, common_prefix_len, Runes, MAX_TERM_LEN};

/// How `add` treats a term that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddMode {
    /// Overwrite the stored score.
    #[default]
    Replace,
    /// Add to the stored score.
    Increment,
}

/// What `add` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The term was absent (or tombstoned) and is now live.
    Inserted,
    /// The term was live and its score was replaced or incremented.
    Updated,
}

impl AddOutcome {
    #[inline]
    pub fn is_new(self) -> bool {
        self == AddOutcome::Inserted
    }
}

/// Which entries `Trie::visit` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Live,
    /// Live entries and tombstones.
    IncludeDeleted,
}

/// A borrowed view of one entry, handed to `Trie::visit` callbacks.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef<'a> {
    pub term: &'a [char],
    /// `0` for tombstones.
    pub score: f32,
    pub payload: Option<&'a [u8]>,
    pub deleted: bool,
}

impl EntryRef<'_> {
    pub fn term_string(&self) -> String {
        runes::to_string(self.term)
    }
}

/// Counters reported by `Trie::compact`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    /// Dead nodes unlinked.
    pub removed: usize,
    /// Single-child chains collapsed.
    pub merged: usize,
}

/// A compressed prefix trie of scored terms.
///
/// The trie owns its whole node graph. Terms are compared as raw code-point
/// sequences; callers normalize before inserting and querying.
#[derive(Debug, Clone)]
pub struct Trie {
    root: TrieNode,
    len: usize,
}

impl Trie {
    pub fn new() -> Self {
        Self {
            root: TrieNode::root(),
            len: 0,
        }
    }

    /// Build a trie from `(term, score, payload)` triples in any order.
    /// Later duplicates replace earlier ones.
    pub fn from_entries<'a, I, P>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, f32, Option<P>)>,
        P: AsRef<[u8]>,
    {
        let mut trie = Self::new();
        for (term, score, payload) in entries {
            trie.add(term, score, payload.as_ref().map(P::as_ref), AddMode::Replace)?;
        }
        Ok(trie)
    }

    /// Number of live terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn root(&self) -> &TrieNode {
        &self.root
    }

    /// Approximate heap usage of the node graph in bytes.
    pub fn mem_usage(&self) -> usize {
        self.root.mem_usage()
    }

    /// Insert `term`, or update it if it is already live.
    ///
    /// Fails without touching the trie if `score` is not a finite positive
    /// number, if the term is empty or longer than [`MAX_TERM_LEN`], or if
    /// node storage cannot be reserved.
    pub fn add(
        &mut self,
        term: &str,
        score: f32,
        payload: Option<&[u8]>,
        mode: AddMode,
    ) -> Result<AddOutcome> {
        let term = runes::checked_runes(term)?;
        self.add_runes(&term, score, payload, mode)
    }

    /// Like [`Trie::add`], for an already decoded term.
    pub fn add_runes(
        &mut self,
        term: &[char],
        score: f32,
        payload: Option<&[u8]>,
        mode: AddMode,
    ) -> Result<AddOutcome> {
        if !(score > 0.0 && score.is_finite()) {
            return Err(TrieError::InvalidScore(score));
        }
        runes::validate(term)?;

        let outcome = add_at(&mut self.root, term, score, payload, mode)?;
        if outcome.is_new() {
            self.len += 1;
        }
        Ok(outcome)
    }

    /// Score of `term`, or `0` if it is absent, internal or tombstoned.
    pub fn find(&self, term: &str) -> f32 {
        self.find_runes(&runes::runes(term))
    }

    pub fn find_runes(&self, term: &[char]) -> f32 {
        self.locate(term).map_or(0.0, TrieNode::live_score)
    }

    #[inline]
    pub fn contains(&self, term: &str) -> bool {
        self.find(term) > 0.0
    }

    /// Score and payload of a live `term`.
    pub fn get(&self, term: &str) -> Option<(f32, Option<&[u8]>)> {
        self.locate(&runes::runes(term))
            .filter(|node| node.is_live())
            .map(|node| (node.score(), node.payload()))
    }

    /// Tombstone `term`. Returns `false` if it was not live.
    ///
    /// No node is unlinked; see [`Trie::compact`].
    pub fn delete(&mut self, term: &str) -> bool {
        self.delete_runes(&runes::runes(term))
    }

    pub fn delete_runes(&mut self, term: &[char]) -> bool {
        if term.is_empty() || term.len() > MAX_TERM_LEN {
            return false;
        }
        let removed = delete_at(&mut self.root, term);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Walk the exact node spelling `term`, matching whole fragments only.
    fn locate(&self, term: &[char]) -> Option<&TrieNode> {
        let mut node = &self.root;
        let mut rest = term;
        loop {
            let frag = node.fragment();
            if rest.len() < frag.len() || rest[..frag.len()] != *frag {
                return None;
            }
            rest = &rest[frag.len()..];
            match rest.first() {
                None => return Some(node),
                Some(&c) => node = node.child(c)?,
            }
        }
    }

    /// Visit every entry depth-first, children in code-point order.
    pub fn visit<F>(&self, visibility: Visibility, mut f: F)
    where
        F: FnMut(EntryRef<'_>),
    {
        let mut buf = Runes::new();
        visit_at(&self.root, visibility, &mut buf, &mut f);
    }

    /// Rewrite away tombstones: unlink dead leaves, collapse single-child
    /// chains and recompute every `max_child_score`.
    ///
    /// Logical content is unchanged. This is never run implicitly.
    pub fn compact(&mut self) -> Result<CompactStats> {
        let mut stats = CompactStats::default();
        compact_at(&mut self.root, &mut stats)?;
        debug!(
            "trie compaction: removed {} nodes, merged {} chains, {} live terms",
            stats.removed, stats.merged, self.len
        );
        Ok(stats)
    }
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert below `node`, where `term` is the part not yet matched by the
/// ancestors. `max_child_score` is refreshed on the way back up.
fn add_at(
    node: &mut TrieNode,
    term: &[char],
    score: f32,
    payload: Option<&[u8]>,
    mode: AddMode,
) -> Result<AddOutcome> {
    let common = common_prefix_len(node.fragment(), term);

    if common < node.fragment().len() {
        // Diverged inside this fragment. Allocate the new leaf before the
        // split so a failure leaves the node as it was.
        let leaf = if common < term.len() {
            Some(TrieNode::leaf(&term[common..], score, payload)?)
        } else {
            None
        };
        node.split(common)?;
        match leaf {
            Some(leaf) => node.attach_child(leaf)?,
            None => node.make_terminal(score, payload),
        }
        node.refresh_max_score();
        return Ok(AddOutcome::Inserted);
    }

    if common == term.len() {
        let outcome = if node.is_live() {
            match mode {
                AddMode::Replace => {
                    node.set_score(score);
                    node.set_payload(payload);
                }
                AddMode::Increment => {
                    let total = node.score() + score;
                    if !total.is_finite() {
                        return Err(TrieError::InvalidScore(total));
                    }
                    node.set_score(total);
                    if payload.is_some() {
                        node.set_payload(payload);
                    }
                }
            }
            AddOutcome::Updated
        } else {
            node.make_terminal(score, payload);
            AddOutcome::Inserted
        };
        node.refresh_max_score();
        return Ok(outcome);
    }

    let rest = &term[common..];
    let outcome = match node.child_mut(rest[0]) {
        Some(child) => add_at(child, rest, score, payload, mode)?,
        None => {
            node.attach_child(TrieNode::leaf(rest, score, payload)?)?;
            AddOutcome::Inserted
        }
    };
    node.refresh_max_score();
    Ok(outcome)
}

fn delete_at(node: &mut TrieNode, term: &[char]) -> bool {
    let frag_len = node.fragment().len();
    if term.len() < frag_len || term[..frag_len] != *node.fragment() {
        return false;
    }
    let rest = &term[frag_len..];
    let removed = match rest.first() {
        None => node.tombstone(),
        Some(&c) => match node.child_mut(c) {
            Some(child) => delete_at(child, rest),
            None => false,
        },
    };
    if removed {
        node.refresh_max_score();
    }
    removed
}

fn visit_at<F>(node: &TrieNode, visibility: Visibility, buf: &mut Runes, f: &mut F)
where
    F: FnMut(EntryRef<'_>),
{
    buf.extend_from_slice(node.fragment());
    let report = node.is_live() || (visibility == Visibility::IncludeDeleted && node.is_deleted());
    if report {
        f(EntryRef {
            term: &buf[..],
            score: node.live_score(),
            payload: node.payload(),
            deleted: node.is_deleted(),
        });
    }
    for child in node.children() {
        visit_at(child, visibility, buf, f);
    }
    buf.truncate(buf.len() - node.fragment().len());
}

fn compact_at(node: &mut TrieNode, stats: &mut CompactStats) -> Result<()> {
    for child in node.children_mut() {
        compact_at(child, stats)?;
    }
    stats.removed += node.prune_dead_children();
    for child in node.children_mut() {
        if child.merge_with_single_child()? {
            stats.merged += 1;
        }
    }
    node.refresh_max_score();
    Ok(())
}
