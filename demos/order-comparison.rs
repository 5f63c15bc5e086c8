//! Prints the shape of sets built from the same random input under different orders.
//!
//! Output is CSV: `order,elements,height,inserted`.

use rand::Rng;

use cow_btree::{cache, BTreeSet, Order};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = rand::thread_rng();
    let values: Vec<u32> = (0..100_000).map(|_| rng.gen()).collect();

    let derived = Order::for_element::<u32>(cache::l1_data_cache_size());
    eprintln!(
        "L1 data cache: {:?}, derived order for u32: {}",
        cache::l1_data_cache_size(),
        derived.leaf()
    );

    let mut configs = vec![derived];
    for order in [3, 4, 8, 16, 64, 256] {
        configs.push(Order::new(order)?);
    }
    configs.push(derived.with_internal(16)?);

    println!("order,elements,height,inserted");
    for config in configs {
        let mut set = BTreeSet::with_config(config);
        let mut inserted = 0;
        for &v in &values {
            if set.insert(v).0 {
                inserted += 1;
            }
        }
        set.validate();

        println!(
            "{}/{},{},{},{}",
            config.leaf(),
            config.internal(),
            set.count(),
            set.height(),
            inserted
        );
    }

    Ok(())
}
