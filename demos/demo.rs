use kdspace::KdTree;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=kdspace=debug shows the rebalance events.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut tree = KdTree::new(2)?;
    for p in [[2.0, 3.0], [5.0, 4.0], [9.0, 6.0], [4.0, 7.0], [8.0, 1.0], [7.0, 2.0]] {
        tree.insert(&p)?;
    }

    let target = [5.0, 5.0];
    match tree.nearest(&target)? {
        Some(p) => println!("Nearest to (5, 5): {}", p),
        None => println!("Tree is empty"),
    }

    tree.rebalance();

    match tree.nearest(&target)? {
        Some(p) => println!("Nearest to (5, 5) after rebalance: {}", p),
        None => println!("Tree is empty"),
    }

    Ok(())
}
