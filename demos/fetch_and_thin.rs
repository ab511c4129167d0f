//! Fetch street nodes for a city from the Overpass API and thin them.
//!
//! Run with: cargo run --example fetch_and_thin --features http -- "Bologna" 50

use node_thinner::overpass::{thin_response, OverpassClient};
use node_thinner::{FilteredExport, ThinningStats};

fn main() {
    let mut args = std::env::args().skip(1);
    let city = args.next().unwrap_or_else(|| "Bologna".to_string());
    let min_distance: f64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(50.0);

    println!("Fetching street nodes for {} ...", city);

    let client = OverpassClient::new().expect("client builds");
    let response = match client.fetch_city_blocking(&city) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("fetch failed: {}", e);
            std::process::exit(1);
        }
    };

    let nodes = response.extract_nodes();
    println!("Got {} nodes, thinning at {}m ...", nodes.len(), min_distance);

    let thinned = thin_response(&response, min_distance).expect("valid threshold");
    let result = node_thinner::thin_points(&nodes, min_distance).expect("valid threshold");
    println!("{}", ThinningStats::from_result(&result));

    let export = FilteredExport::new(&response, thinned.kept);
    let json = export.to_json_pretty().expect("serializes");
    std::fs::write("filtered_nodes.json", &json).expect("write artifact");
    println!("Wrote filtered_nodes.json ({} bytes)", json.len());
}
