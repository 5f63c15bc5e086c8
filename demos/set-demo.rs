//! Walks through the value semantics and cursors of `BTreeSet`.

use cow_btree::{BTreeSet, Order};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut set = BTreeSet::with_config(Order::new(4)?);

    for word in ["pear", "fig", "apple", "kiwi", "date", "banana", "cherry"] {
        let (inserted, member) = set.insert(word);
        println!("insert {word:>7}: inserted={inserted} member={member}");
    }
    println!("insert {:>7}: {:?}", "fig", set.insert("fig"));

    println!("\n{} elements, height {}: {set:?}", set.count(), set.height());

    // Copies share all nodes until one of them is written to.
    let snapshot = set.clone();
    set.insert("grape");
    println!("\nafter inserting into the original:");
    println!("  original: {set:?}");
    println!("  snapshot: {snapshot:?}");

    // A cursor taken from the snapshot stays usable because the snapshot never changes.
    let mut cursor = snapshot.begin();
    print!("\ncursor walk over the snapshot:");
    while cursor < snapshot.end() {
        print!(" {}", snapshot.element(&cursor));
        snapshot.advance(&mut cursor);
    }
    println!();

    set.validate();
    println!("\n{}", set.to_dot()?);

    Ok(())
}
