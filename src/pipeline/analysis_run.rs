use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::fetcher::ProductSource;
use crate::models::{Brand, DataOrigin, GapAnalysisResult};
use crate::processor::GapAggregator;
use crate::progress::{BrandSlot, ProgressReporter, ProgressSink};

/// The store and the two brands to compare.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub store_url: String,
    pub brand_a: String,
    pub brand_b: String,
}

impl AnalysisRequest {
    pub fn new(store_url: &str, brand_a: &str, brand_b: &str) -> Self {
        Self {
            store_url: store_url.trim().to_string(),
            brand_a: brand_a.trim().to_string(),
            brand_b: brand_b.trim().to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_url.is_empty() {
            return Err(anyhow!("Store URL cannot be empty"));
        }
        if self.brand_a.is_empty() || self.brand_b.is_empty() {
            return Err(anyhow!("Both brands must be named"));
        }
        if self.brand_a.eq_ignore_ascii_case(&self.brand_b) {
            return Err(anyhow!("Please select two different brands to compare"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub brands: Vec<Brand>,
    /// Least trustworthy origin among the discovered brands and the products.
    pub data_origin: DataOrigin,
    pub result: GapAnalysisResult,
}

impl AnalysisOutcome {
    pub fn used_fallback_data(&self) -> bool {
        !self.data_origin.is_live()
    }
}

/// Runs brand discovery, both product searches and the gap analysis,
/// narrating every stage through a [`ProgressReporter`].
pub struct GapAnalysisPipeline {
    source: Arc<dyn ProductSource>,
    aggregator: GapAggregator,
    request_timeout: Duration,
}

impl GapAnalysisPipeline {
    pub fn new(source: Arc<dyn ProductSource>, aggregator: GapAggregator, request_timeout: Duration) -> Self {
        Self {
            source,
            aggregator,
            request_timeout,
        }
    }

    /// Any failure before both product lists are available ends the run with
    /// an error snapshot; the gap analysis is then never performed.
    pub async fn run<S: ProgressSink>(&self, request: &AnalysisRequest, sink: S) -> Result<AnalysisOutcome> {
        let run_id = Uuid::new_v4();
        let mut reporter = ProgressReporter::new(sink, &request.brand_a, &request.brand_b);

        info!(
            "Starting gap analysis {}: {} vs {} on {} (source: {})",
            run_id,
            request.brand_a,
            request.brand_b,
            request.store_url,
            self.source.name()
        );

        match self.execute(run_id, request, &mut reporter).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                let message = format!("{:#}", e);
                error!("Gap analysis {} failed: {}", run_id, message);
                if let Err(report_err) = reporter.fail(&message) {
                    warn!("Could not report failure of {}: {}", run_id, report_err);
                }
                Err(e)
            }
        }
    }

    async fn execute<S: ProgressSink>(
        &self,
        run_id: Uuid,
        request: &AnalysisRequest,
        reporter: &mut ProgressReporter<S>,
    ) -> Result<AnalysisOutcome> {
        request.validate()?;

        reporter.start_discovery(&request.store_url)?;
        let brands = self
            .bounded("Brand discovery", self.source.discover_brands(&request.store_url))
            .await?;
        info!("Discovered {} brands on {}", brands.len(), request.store_url);

        for name in [&request.brand_a, &request.brand_b] {
            if !brands.iter().any(|brand| brand.name.eq_ignore_ascii_case(name)) {
                warn!("Brand {} was not among the discovered brands", name);
            }
        }
        reporter.brands_discovered(brands.len())?;

        let data_origin = brands
            .iter()
            .map(|brand| brand.origin)
            .chain([self.source.data_origin()])
            .max()
            .unwrap_or_default();
        if !data_origin.is_live() {
            warn!("Gap analysis {} runs on {:?} data, not live store data", run_id, data_origin);
        }

        reporter.brand_products_progress(BrandSlot::First, 0)?;
        let products_a = self
            .bounded(
                &format!("Product search for {}", request.brand_a),
                self.source.fetch_products(&request.brand_a, &request.store_url),
            )
            .await?;
        info!("Fetched {} products for {}", products_a.len(), request.brand_a);
        reporter.brand_analyzed(BrandSlot::First, products_a.len())?;

        reporter.brand_products_progress(BrandSlot::Second, 0)?;
        let products_b = self
            .bounded(
                &format!("Product search for {}", request.brand_b),
                self.source.fetch_products(&request.brand_b, &request.store_url),
            )
            .await?;
        info!("Fetched {} products for {}", products_b.len(), request.brand_b);
        reporter.brand_analyzed(BrandSlot::Second, products_b.len())?;

        let result = self.aggregator.analyze(&products_a, &products_b);
        reporter.complete(result.summary())?;

        let summary = result.summary();
        info!(
            "Gap analysis {} completed: {} common, {} unique to {}, {} unique to {}",
            run_id,
            summary.common_count,
            summary.unique_a_count,
            request.brand_a,
            summary.unique_b_count,
            request.brand_b
        );

        Ok(AnalysisOutcome {
            run_id,
            brands,
            data_origin,
            result,
        })
    }

    async fn bounded<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.with_context(|| format!("{} failed", what)),
            Err(_) => Err(anyhow!(
                "{} timed out after {}s",
                what,
                self.request_timeout.as_secs_f64()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::models::{AnalysisProgress, AnalysisStage, Product, StepStatus};
    use crate::processor::{MatchStrategy, ProductMatcher};
    use crate::progress::ChannelSink;

    enum Behavior {
        Ok,
        FallbackBrands,
        FailProducts(&'static str),
        Hang,
    }

    struct FixedSource {
        behavior: Behavior,
    }

    #[async_trait]
    impl ProductSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn discover_brands(&self, store_url: &str) -> Result<Vec<Brand>> {
            let origin = match self.behavior {
                Behavior::FallbackBrands => DataOrigin::Fallback,
                _ => DataOrigin::Live,
            };
            Ok(vec![
                Brand::discovered(0, "Bosch", store_url).with_origin(origin),
                Brand::discovered(1, "Valeo", store_url).with_origin(origin),
            ])
        }

        async fn fetch_products(&self, brand_name: &str, _store_url: &str) -> Result<Vec<Product>> {
            match self.behavior {
                Behavior::FailProducts(brand) if brand == brand_name => {
                    Err(anyhow!("Search API error: 502 Bad Gateway"))
                }
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
                _ => Ok(vec![
                    Product::new(
                        format!("{}-1", brand_name),
                        format!("{} Wiper Blade Aerotwin", brand_name),
                        "Body Parts",
                        brand_name,
                    ),
                    Product::new(
                        format!("{}-2", brand_name),
                        format!("{} Alternator 14V {}", brand_name, brand_name.len()),
                        "Electrical",
                        brand_name,
                    ),
                ]),
            }
        }
    }

    fn pipeline(behavior: Behavior) -> GapAnalysisPipeline {
        GapAnalysisPipeline::new(
            Arc::new(FixedSource { behavior }),
            GapAggregator::new(ProductMatcher::default(), MatchStrategy::SingleAssignment),
            Duration::from_millis(200),
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AnalysisProgress>) -> Vec<AnalysisProgress> {
        let mut snapshots = Vec::new();
        while let Ok(snapshot) = rx.try_recv() {
            snapshots.push(snapshot);
        }
        snapshots
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "Valeo");

        let outcome = pipeline(Behavior::Ok).run(&request, ChannelSink::new(tx)).await.unwrap();

        // "wiper", "blade" and "aerotwin" are shared; the alternators share nothing long enough.
        let summary = outcome.result.summary();
        assert_eq!(summary.common_count, 1);
        assert_eq!(summary.unique_a_count, 1);
        assert_eq!(summary.unique_b_count, 1);
        assert_eq!(outcome.brands.len(), 2);
        assert_eq!(outcome.data_origin, DataOrigin::Live);
        assert!(!outcome.used_fallback_data());

        let snapshots = drain(&mut rx);
        let stages: Vec<AnalysisStage> = snapshots.iter().map(|s| s.status).collect();
        assert_eq!(
            stages,
            vec![
                AnalysisStage::DiscoveringBrands,
                AnalysisStage::AnalyzingBrand1,
                AnalysisStage::AnalyzingBrand1,
                AnalysisStage::AnalyzingBrand2,
                AnalysisStage::AnalyzingBrand2,
                AnalysisStage::Finalizing,
                AnalysisStage::Completed,
            ]
        );
        let progress: Vec<u8> = snapshots.iter().map(|s| s.progress).collect();
        assert_eq!(progress, vec![5, 20, 20, 55, 55, 90, 100]);
    }

    #[tokio::test]
    async fn test_fallback_brands_mark_the_outcome() {
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "Valeo");

        let outcome = pipeline(Behavior::FallbackBrands)
            .run(&request, crate::progress::NoopSink)
            .await
            .unwrap();

        assert_eq!(outcome.data_origin, DataOrigin::Fallback);
        assert!(outcome.used_fallback_data());
    }

    #[tokio::test]
    async fn test_demo_catalog_marks_the_outcome() {
        let pipeline = GapAnalysisPipeline::new(
            Arc::new(crate::fetcher::CatalogSource::new(crate::config::CatalogConfig::default())),
            GapAggregator::default(),
            Duration::from_secs(1),
        );
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "Valeo");

        let outcome = pipeline.run(&request, crate::progress::NoopSink).await.unwrap();
        assert_eq!(outcome.data_origin, DataOrigin::Demo);
        assert_eq!(outcome.result.summary().total_a, 12);
    }

    #[tokio::test]
    async fn test_failed_fetch_ends_with_error_snapshot() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "Valeo");

        let outcome = pipeline(Behavior::FailProducts("Valeo")).run(&request, ChannelSink::new(tx)).await;
        assert!(outcome.is_err());

        let snapshots = drain(&mut rx);
        let last = snapshots.last().unwrap();
        assert_eq!(last.status, AnalysisStage::Error);
        assert_eq!(last.steps.brand1_analysis.status, StepStatus::Completed);
        assert_eq!(last.steps.brand2_analysis.status, StepStatus::Error);
        let message = last.error.as_deref().unwrap();
        assert!(message.contains("Product search for Valeo failed"));
        assert!(message.contains("502 Bad Gateway"));
        assert!(snapshots.iter().all(|s| s.status != AnalysisStage::Completed));
    }

    #[tokio::test]
    async fn test_timeout_ends_with_error_snapshot() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "Valeo");

        let err = pipeline(Behavior::Hang).run(&request, ChannelSink::new(tx)).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));

        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.status, AnalysisStage::Error);
        assert_eq!(last.steps.brand1_analysis.status, StepStatus::Error);
    }

    #[tokio::test]
    async fn test_same_brand_twice_is_rejected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let request = AnalysisRequest::new("https://www.autodoc.de", "Bosch", "bosch");

        assert!(pipeline(Behavior::Ok).run(&request, ChannelSink::new(tx)).await.is_err());

        let snapshots = drain(&mut rx);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].status, AnalysisStage::Error);
        assert!(snapshots[0].is_consistent());
    }
}
