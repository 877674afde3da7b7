use anyhow::{Context, Result, anyhow};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use brand_gap::config::AppConfig;
use brand_gap::fetcher::{CatalogSource, ProductSource, SearchSource};
use brand_gap::models::GapAnalysisResult;
use brand_gap::pipeline::{AnalysisRequest, GapAnalysisPipeline};
use brand_gap::processor::CategoryBreakdown;
use brand_gap::progress::TracingSink;
use brand_gap::storage::{AnalysisReport, ReportStore};

const DEFAULT_CONFIG_PATH: &str = "configs/brand_gap.toml";

struct CliArgs {
    store_url: String,
    brand_a: String,
    brand_b: String,
    demo: bool,
    config_path: String,
}

fn parse_args() -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut demo = false;
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--demo" | "-d" => demo = true,
            "--config" | "-c" => {
                config_path = args.next().ok_or_else(|| anyhow!("--config needs a path"))?;
            }
            _ => positional.push(arg),
        }
    }

    if positional.len() != 3 {
        return Err(anyhow!(
            "Usage: brand-gap <store_url> <brand_a> <brand_b> [--demo] [--config path]"
        ));
    }

    let brand_b = positional.pop().unwrap_or_default();
    let brand_a = positional.pop().unwrap_or_default();
    let store_url = positional.pop().unwrap_or_default();

    Ok(CliArgs {
        store_url,
        brand_a,
        brand_b,
        demo,
        config_path,
    })
}

fn build_source(config: &mut AppConfig, demo: bool) -> Result<Arc<dyn ProductSource>> {
    if demo {
        info!("Demo mode: using the built-in catalog");
        return Ok(Arc::new(CatalogSource::new(config.catalog.clone())));
    }

    match config.search.load_api_key() {
        Ok(()) => {
            let source = SearchSource::new(config.search.clone(), config.catalog.clone())
                .context("Failed to initialize search source")?;
            Ok(Arc::new(source))
        }
        Err(e) => {
            warn!("{:#}; falling back to the built-in catalog", e);
            Ok(Arc::new(CatalogSource::new(config.catalog.clone())))
        }
    }
}

fn print_summary(request: &AnalysisRequest, result: &GapAnalysisResult) {
    let summary = result.summary();
    info!("\n=== Gap Analysis: {} vs {} ===", request.brand_a, request.brand_b);
    info!("{} products: {}", request.brand_a, summary.total_a);
    info!("{} products: {}", request.brand_b, summary.total_b);
    info!("Common products: {}", summary.common_count);
    info!("Unique to {}: {}", request.brand_a, summary.unique_a_count);
    info!("Unique to {}: {}", request.brand_b, summary.unique_b_count);

    for stats in CategoryBreakdown::from_result(result) {
        let price = stats
            .avg_price_difference
            .map(|diff| format!(", avg price difference {:+.2}", diff))
            .unwrap_or_default();
        info!(
            "  {}: {} common, {} only {}, {} only {}{}",
            stats.category,
            stats.common,
            stats.unique_a,
            request.brand_a,
            stats.unique_b,
            request.brand_b,
            price
        );
    }

    for pair in result.common_products() {
        info!("  = {} <-> {}", pair.product_a().name, pair.product_b().name);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let args = parse_args()?;

    let mut config = AppConfig::from_file_or_default(&args.config_path)
        .context("Failed to load configuration")?;
    config.validate()?;
    info!(
        "Loaded configuration from {} (strategy: {})",
        args.config_path, config.matching.strategy
    );

    let source = build_source(&mut config, args.demo)?;
    let pipeline = GapAnalysisPipeline::new(
        source,
        config.aggregator(),
        Duration::from_secs(config.search.request_timeout_seconds),
    );

    let request = AnalysisRequest::new(&args.store_url, &args.brand_a, &args.brand_b);
    let outcome = pipeline.run(&request, TracingSink).await?;

    if outcome.used_fallback_data() {
        warn!(
            "Results are based on {:?} data, not on products found on {}",
            outcome.data_origin, request.store_url
        );
    }
    print_summary(&request, &outcome.result);

    let report = AnalysisReport::new(
        outcome.run_id,
        &request.store_url,
        &request.brand_a,
        &request.brand_b,
        config.matching.strategy,
        outcome.data_origin,
        outcome.result,
    );
    let store = ReportStore::new(&config.output.report_dir);
    let path = store.save(&report).await?;
    info!("Report written to {}", path.display());

    Ok(())
}
