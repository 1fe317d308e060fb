//! Partition a synthetic attribute with a sharp outcome step at 50 and print
//! the per-group disparity for both partitioners.
//!
//! Run with `RUST_LOG=debug` to see the fitting log.

use fairpart::{
    conditional_positive_rate, FairGroups, FairKMeans, PartitionConfig, PartitionError,
    Partitioner,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> Result<(), PartitionError> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(7);
    let s: Vec<f64> = (0..5_000).map(|_| rng.gen_range(0.0..100.0)).collect();
    let y: Vec<bool> = s
        .iter()
        .map(|&x| rng.gen_bool(if x < 50.0 { 0.1 } else { 0.9 }))
        .collect();

    println!("raw P(y = 1 | s):");
    for (center, rate) in conditional_positive_rate(&s, &y, 10)? {
        match rate {
            Some(rate) => println!("  s ~ {center:6.2}  {rate:.3}"),
            None => println!("  s ~ {center:6.2}  (no data)"),
        }
    }

    let config = PartitionConfig::new(3);
    let models: [Box<dyn Partitioner>; 2] = [
        Box::new(FairGroups::new(config)),
        Box::new(FairKMeans::new(config)),
    ];
    for model in &models {
        let fitted = model.fit(&s, &y)?;
        println!(
            "\n{} (base rate {:.3}, cost {:.2}, converged {})",
            model.name(),
            fitted.base_rate(),
            fitted.cost(),
            fitted.converged()
        );
        for ((lo, hi), (stat, (ci_lo, ci_hi))) in fitted
            .partition()
            .intervals()
            .zip(fitted.group_statistics().iter().zip(fitted.phi_by_group_ci()))
        {
            println!(
                "  [{lo:6.2}, {hi:6.2})  n = {:5}  phi = {:+.3}  ({ci_lo:+.3}, {ci_hi:+.3})",
                stat.size, stat.phi
            );
        }
    }
    Ok(())
}
