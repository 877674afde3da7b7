use anyhow::{Context, Result, anyhow};
use std::env;
use tracing::info;

use brand_gap::models::Product;
use brand_gap::processor::{CategoryBreakdown, GapAggregator, MatchStrategy, ProductMatcher};

fn load_products(path: &str) -> Result<Vec<Product>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read product file: {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse product file: {}", path))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let independent = args.iter().any(|arg| arg == "--independent");
    let files: Vec<&String> = args.iter().filter(|arg| !arg.starts_with("--")).collect();

    let [path_a, path_b] = files.as_slice() else {
        return Err(anyhow!("Usage: compare_catalogs <a.json> <b.json> [--independent]"));
    };

    let products_a = load_products(path_a)?;
    let products_b = load_products(path_b)?;
    info!("Loaded {} products from {} and {} from {}", products_a.len(), path_a, products_b.len(), path_b);

    let strategy = if independent {
        MatchStrategy::Independent
    } else {
        MatchStrategy::SingleAssignment
    };
    let result = GapAggregator::new(ProductMatcher::default(), strategy).analyze(&products_a, &products_b);
    let summary = result.summary();

    info!("Strategy: {}", strategy);
    info!("Common: {}", summary.common_count);
    info!("Unique to A: {} of {}", summary.unique_a_count, summary.total_a);
    info!("Unique to B: {} of {}", summary.unique_b_count, summary.total_b);

    for stats in CategoryBreakdown::from_result(&result) {
        info!(
            "  {:<16} common {:>3}  only A {:>3}  only B {:>3}",
            stats.category, stats.common, stats.unique_a, stats.unique_b
        );
    }

    println!("{}", serde_json::to_string_pretty(result.summary())?);
    Ok(())
}
