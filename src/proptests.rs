use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Check every structural invariant. Returns nothing; panics on violation.
fn validate_trie(t: &Trie) {
    let root = t.root();
    assert!(root.fragment().is_empty(), "root fragment must be empty");
    assert!(!root.is_terminal(), "root is never terminal");

    let (_, live) = validate_node(root, 0);
    assert_eq!(live, t.len(), "live terminal count must match Trie::len");
}

/// Returns the true maximum live score of the subtree and its live count.
fn validate_node(node: &TrieNode, depth: usize) -> (f32, usize) {
    let depth = depth + node.fragment().len();
    assert!(depth <= MAX_TERM_LEN, "path longer than MAX_TERM_LEN");

    let mut best = 0.0f32;
    let mut live = 0usize;
    if node.is_live() {
        assert!(node.score() > 0.0, "live node must have a positive score");
        best = node.score();
        live += 1;
    }
    if node.is_deleted() {
        assert!(node.payload().is_none(), "tombstones drop their payload");
    }

    let children = node.children();
    for pair in children.windows(2) {
        assert!(
            pair[0].fragment()[0] < pair[1].fragment()[0],
            "children must have distinct, sorted leading code points"
        );
    }
    for child in children {
        assert!(!child.fragment().is_empty(), "child fragment is empty");
        let (child_best, child_live) = validate_node(child, depth);
        best = best.max(child_best);
        live += child_live;
    }

    assert_eq!(
        node.max_child_score(),
        best,
        "stored max_child_score must equal the best live score below"
    );
    (best, live)
}

#[derive(Clone, Debug)]
enum Op {
    Add(String, f32, AddMode),
    Delete(String),
    Find(String),
    Compact,
}

fn term_strategy() -> impl Strategy<Value = String> + Clone {
    // A tiny alphabet forces shared prefixes, splits and deep chains.
    prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'ß']), 1..=12)
        .prop_map(|chars| chars.into_iter().collect())
}

fn score_strategy() -> impl Strategy<Value = f32> {
    (1u16..=1000).prop_map(|s| s as f32 / 4.0)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    let term = term_strategy();
    let mode = prop_oneof![Just(AddMode::Replace), Just(AddMode::Increment)];
    let op = prop_oneof![
        50 => (term.clone(), score_strategy(), mode).prop_map(|(t, s, m)| Op::Add(t, s, m)),
        25 => term.clone().prop_map(Op::Delete),
        24 => term.clone().prop_map(Op::Find),
        1 => Just(Op::Compact),
    ];
    prop::collection::vec(op, 0..=500)
}

fn model_add(m: &mut BTreeMap<String, f32>, term: String, score: f32, mode: AddMode) -> bool {
    match m.get_mut(&term) {
        Some(existing) => {
            match mode {
                AddMode::Replace => *existing = score,
                AddMode::Increment => *existing += score,
            }
            false
        }
        None => {
            m.insert(term, score);
            true
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence(ops in ops_strategy()) {
        let mut t = Trie::new();
        let mut m: BTreeMap<String, f32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add(term, score, mode) => {
                    let outcome = t.add(&term, score, None, mode).unwrap();
                    let is_new = model_add(&mut m, term, score, mode);
                    prop_assert_eq!(outcome.is_new(), is_new);
                }
                Op::Delete(term) => {
                    prop_assert_eq!(t.delete(&term), m.remove(&term).is_some());
                }
                Op::Find(term) => {
                    prop_assert_eq!(t.find(&term), m.get(&term).copied().unwrap_or(0.0));
                }
                Op::Compact => {
                    t.compact().unwrap();
                }
            }
            prop_assert_eq!(t.len(), m.len());
        }

        validate_trie(&t);
        let got: Vec<(String, f32)> = t.iter().map(|e| (e.term, e.score)).collect();
        let expected: Vec<(String, f32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        t.compact().unwrap();
        validate_trie(&t);
        let after: Vec<(String, f32)> = t.iter().map(|e| (e.term, e.score)).collect();
        prop_assert_eq!(after, m.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn prop_prefix_iteration_complete(
        terms in prop::collection::btree_set(term_strategy(), 0..200),
        prefix in prop::collection::vec(prop::sample::select(vec!['a', 'b', 'c', 'ß']), 0..=3),
    ) {
        let prefix: String = prefix.into_iter().collect();
        let mut t = Trie::new();
        for (i, term) in terms.iter().enumerate() {
            t.add(term, (i + 1) as f32, None, AddMode::Replace).unwrap();
        }

        let got: Vec<String> = t.iter_prefix(&prefix).map(|e| e.term).collect();
        let expected: Vec<String> = terms
            .iter()
            .filter(|term| term.starts_with(&prefix))
            .cloned()
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_threshold_yields_exactly_high_scores(
        terms in prop::collection::btree_map(term_strategy(), score_strategy(), 0..200),
        threshold in score_strategy(),
    ) {
        let t = Trie::from_entries(terms.iter().map(|(k, v)| (k.as_str(), *v, None::<&[u8]>))).unwrap();
        let got: Vec<String> = t.iter().min_score(threshold).map(|e| e.term).collect();
        let expected: Vec<String> = terms
            .iter()
            .filter(|(_, v)| **v >= threshold)
            .map(|(k, _)| k.clone())
            .collect();
        prop_assert_eq!(got, expected);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

const SMALL_SET: [&str; 6] = ["a", "b", "ab", "abc", "abd", "ba"];

#[test]
fn exhaustive_insert_order_small_set() {
    let mut reference: Option<Vec<(String, f32)>> = None;

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = Trie::new();
        for term in perm {
            let score = (term.len() * 10 + term.as_bytes()[0] as usize) as f32;
            assert!(t.add(term, score, None, AddMode::Replace).unwrap().is_new());
        }

        validate_trie(&t);
        let got: Vec<(String, f32)> = t.iter().map(|e| (e.term, e.score)).collect();
        match &reference {
            Some(expected) => assert_eq!(&got, expected, "\n{}", t.dump()),
            None => reference = Some(got),
        }
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let mut base = Trie::new();
    for (i, term) in SMALL_SET.iter().enumerate() {
        base.add(term, (i + 1) as f32, None, AddMode::Replace).unwrap();
    }

    for_each_permutation(&SMALL_SET, |perm| {
        let mut t = base.clone();
        let mut remaining: Vec<&str> = SMALL_SET.to_vec();

        for term in perm {
            assert!(t.delete(term));
            remaining.retain(|r| *r != term);
            validate_trie(&t);
            for r in &remaining {
                assert!(t.find(r) > 0.0, "{} lost after deleting {}", r, term);
            }
        }
        assert!(t.is_empty());
        assert_eq!(t.root().max_child_score(), 0.0);

        t.compact().unwrap();
        assert!(t.root().children().is_empty());
    });
}
