use kdspace::KdTree;
use rand::Rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize Rayon explicitly so thread creation (clone3) happens
    // before the heavy calculation we want to profile.
    rayon::ThreadPoolBuilder::new().build_global()?;

    // Sorted insertion is the worst case: the tree degenerates into a list.
    let mut tree = KdTree::with_capacity(3, 20_000)?;
    for i in 0..20_000 {
        let v = i as f64;
        tree.insert(&[v, v, v])?;
    }
    println!("depth before rebalance: {}", tree.depth());

    tree.rebalance();
    println!("depth after rebalance: {}", tree.depth());

    // Add a random cloud on top and query it (this is the hot path).
    tree.random_points(200_000, 0.0, 20_000.0)?;
    tree.rebalance();

    let mut rng = rand::thread_rng();
    let targets: Vec<[f64; 3]> = (0..100_000)
        .map(|_| [rng.gen_range(0.0..20_000.0), rng.gen_range(0.0..20_000.0), rng.gen_range(0.0..20_000.0)])
        .collect();
    let found = tree.nearest_many(&targets)?;
    println!("answered {} queries", found.len());

    Ok(())
}
