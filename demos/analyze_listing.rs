//! Listing photo analysis demo
//!
//! Prints the JSON report for one listing photo and its description.
//!
//! Run with: cargo run --example analyze_listing -- <image_path> [description] [config.json]

use std::{env, path::Path};

use listing_trust::{
    AnalysisConfig, ListingAnalyzer, error::Result, report::JsonReport, scoring::label_for,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: {} <image_path> [description] [config.json]", args[0]);
        return Ok(());
    }

    let image_path = &args[1];
    let description = args.get(2).map(String::as_str).unwrap_or("");

    if !Path::new(image_path).exists() {
        eprintln!("Error: Image file '{}' not found", image_path);
        std::process::exit(1);
    }

    let config = match args.get(3) {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    let analyzer = ListingAnalyzer::new(config);
    let detailed = analyzer.analyze_detailed(image_path, description);

    println!("Image:     {}", image_path);
    println!(
        "Quality:   {} (variance {:.2})",
        detailed.sharpness.quality_label, detailed.sharpness.blur_score
    );
    println!(
        "Condition: {} ({:.0}%, {:?})",
        detailed.condition.label,
        detailed.condition.confidence * 100.0,
        detailed.condition.kind
    );
    println!(
        "Trust:     {} - {}",
        detailed.report.trust_score,
        label_for(detailed.report.trust_score).label
    );
    println!();

    let json = JsonReport::from(&detailed.report)
        .to_json()
        .map_err(|e| listing_trust::error::TrustError::AnalysisFailed(e.to_string()))?;
    println!("{}", json);

    Ok(())
}
