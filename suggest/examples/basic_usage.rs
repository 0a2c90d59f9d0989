//! Basic usage examples for suggest.

use suggest::{AddMode, SearchOptions, SuggestIndex};

fn main() {
    let index = SuggestIndex::new();
    example_add_and_lookup(&index);
    example_suggest(&index);
    example_sample(&index);
    example_snapshot(&index);
}

fn example_add_and_lookup(index: &SuggestIndex) {
    println!("=== Add & Lookup ===\n");

    let terms = [
        ("hello", 3.0),
        ("help", 5.0),
        ("helium", 1.0),
        ("hero", 4.0),
        ("world", 10.0),
        ("word", 2.0),
    ];
    for (term, score) in terms {
        index.add(term, score, None, AddMode::Replace).unwrap();
    }

    // Increment accumulates onto the stored score
    index.add("hello", 2.5, Some(b"greeting"), AddMode::Increment).unwrap();

    println!("hello = {}", index.score("hello"));
    println!("hel = {} (prefix only, not stored)", index.score("hel"));
    println!("Count: {}\n", index.len());
}

fn example_suggest(index: &SuggestIndex) {
    println!("=== Suggestions ===\n");

    for s in index.complete("he").unwrap() {
        println!("  {:<8} {:.2}", s.term, s.score);
    }

    println!("\nFuzzy 'wrld':");
    let opts = SearchOptions::default().fuzzy(1).with_payloads(true);
    for s in index.suggest("wrld", &opts).unwrap() {
        println!("  {:<8} {:.3} (distance {})", s.term, s.score, s.distance);
    }

    println!("\nGlob 'h*o':");
    for (term, score) in index.glob("h*o", 10) {
        println!("  {} = {}", term, score);
    }
    println!();
}

fn example_sample(index: &SuggestIndex) {
    println!("=== Sampling ===\n");

    let samples: Vec<String> = (0..5).filter_map(|_| index.sample()).collect();
    println!("{:?}\n", samples);
}

fn example_snapshot(index: &SuggestIndex) {
    println!("=== Snapshot ===\n");

    index.delete("helium");
    let stats = index.compact().unwrap();
    println!("Compaction removed {} nodes, merged {}", stats.removed, stats.merged);

    let bytes = index.to_bytes();
    let copy = SuggestIndex::from_bytes(&bytes, index.config().clone()).unwrap();
    println!("Snapshot: {} bytes, {} terms restored", bytes.len(), copy.len());

    let mem = index.memory_usage();
    println!("Node bytes: {}", mem.node_bytes);
    println!("Bytes per term: {:.1}", mem.bytes_per_term);
}
