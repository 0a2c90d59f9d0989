//! Structure dumps for troubleshooting.

use std::fmt::Write;

use crate::node::TrieNode;
use crate::trie::Trie;

impl Trie {
    /// Render the node graph, one node per line, indented by depth.
    ///
    /// ```text
    /// "" max=2
    ///   "hel" max=2
    ///     "lo" score=1 max=1 [terminal]
    ///     "p" score=0 max=0 [deleted]
    /// ```
    pub fn dump(&self) -> String {
        let mut out = String::new();
        dump_node(self.root(), 0, &mut out);
        out
    }
}

fn dump_node(node: &TrieNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let fragment: String = node.fragment().iter().collect();
    let _ = write!(out, "{}{:?}", indent, fragment);
    if node.is_terminal() {
        let _ = write!(out, " score={}", node.score());
    }
    let _ = write!(out, " max={}", node.max_child_score());
    if node.is_deleted() {
        out.push_str(" [deleted]");
    } else if node.is_terminal() {
        out.push_str(" [terminal]");
    }
    if let Some(payload) = node.payload() {
        let _ = write!(out, " payload={}B", payload.len());
    }
    out.push('\n');
    for child in node.children() {
        dump_node(child, depth + 1, out);
    }
}
