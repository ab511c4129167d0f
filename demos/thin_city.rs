//! Basic example of thinning an Overpass node set.
//!
//! Run with: cargo run --example thin_city

use node_thinner::{
    thin_points, FilteredExport, LayerView, OverpassResponse, ThinningStats,
};

const SAMPLE_RESPONSE: &str = r#"{
    "version": 0.6,
    "generator": "Overpass API 0.7.62",
    "elements": [
        {"type": "node", "id": 1001, "lat": 44.4949, "lon": 11.3426},
        {"type": "node", "id": 1002, "lat": 44.4950, "lon": 11.3427},
        {"type": "node", "id": 1003, "lat": 44.4955, "lon": 11.3440},
        {"type": "node", "id": 1004, "lat": 44.4970, "lon": 11.3470},
        {"type": "node", "id": 1005, "lat": 44.4971, "lon": 11.3471},
        {"type": "node", "id": 1006, "lat": 44.5050, "lon": 11.3550}
    ]
}"#;

fn main() {
    let response = OverpassResponse::from_json(SAMPLE_RESPONSE).expect("sample parses");
    let nodes = response.extract_nodes();

    println!("Spatial Thinning Example\n");
    println!("Loaded {} street nodes\n", nodes.len());

    // Thin at a few thresholds to show how the kept set shrinks
    for min_distance in [25.0, 100.0, 500.0] {
        let result = thin_points(&nodes, min_distance).expect("valid input");
        let stats = ThinningStats::from_result(&result);
        println!("min distance {:>5}m: {}", min_distance, stats);
    }

    // Walk the layer toggle the way a map front end would
    let result = thin_points(&nodes, 100.0).expect("valid input");
    let mut view = LayerView::new(&nodes, &result);

    println!("\nLayer toggle (100m threshold):");
    for _ in 0..3 {
        println!(
            "  {:<10} {} points ({})",
            view.active().name(),
            view.active_points().len(),
            view.active().color()
        );
        view.cycle();
    }

    if let Some(center) = view.center() {
        println!(
            "\nMap center: {:.4}, {:.4}",
            center.latitude, center.longitude
        );
    }

    // The downloadable artifact keeps the source metadata
    let thinned = node_thinner::overpass::thin_response(&response, 100.0).expect("valid input");
    let export = FilteredExport::new(&response, thinned.kept);
    println!(
        "\nExport artifact:\n{}",
        export.to_json_pretty().expect("serializes")
    );
}
