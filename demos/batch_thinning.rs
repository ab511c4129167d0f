//! Parallel batch thinning across several datasets.
//!
//! Run with: cargo run --example batch_thinning --features parallel

use node_thinner::{thin_batch_parallel, GeoPoint, ThinningStats};
use std::time::Instant;

fn main() {
    // Synthesize one dense grid of nodes per "city"
    let datasets: Vec<Vec<GeoPoint>> = (0..12)
        .map(|d| {
            let base_lat = 40.0 + d as f64 * 0.8;
            (0..400)
                .map(|i| {
                    GeoPoint::new(
                        base_lat + (i % 20) as f64 * 0.0003,
                        11.0 + (i / 20) as f64 * 0.0003,
                    )
                })
                .collect()
        })
        .collect();

    println!(
        "Thinning {} datasets of {} nodes each at 50m\n",
        datasets.len(),
        datasets[0].len()
    );

    let start = Instant::now();
    let results = thin_batch_parallel(&datasets, 50.0).expect("valid input");
    let elapsed = start.elapsed();

    for (i, result) in results.iter().enumerate() {
        println!("  dataset {:>2}: {}", i, ThinningStats::from_result(result));
    }

    println!("\nDone in {:?}", elapsed);
}
