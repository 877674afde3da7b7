use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::models::{DataOrigin, GapAnalysisResult};
use crate::processor::{CategoryBreakdown, CategoryStats, MatchStrategy};
use crate::storage::StoragePaths;

/// A finished analysis as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub store_url: String,
    pub brand_a: String,
    pub brand_b: String,
    pub strategy: MatchStrategy,
    /// Non-live when brands came from the fallback list or products from the demo catalog.
    #[serde(default)]
    pub data_origin: DataOrigin,
    pub result: GapAnalysisResult,
    pub breakdown: Vec<CategoryStats>,
}

impl AnalysisReport {
    pub fn new(
        run_id: Uuid,
        store_url: &str,
        brand_a: &str,
        brand_b: &str,
        strategy: MatchStrategy,
        data_origin: DataOrigin,
        result: GapAnalysisResult,
    ) -> Self {
        let breakdown = CategoryBreakdown::from_result(&result);
        Self {
            run_id,
            generated_at: Utc::now(),
            store_url: store_url.to_string(),
            brand_a: brand_a.to_string(),
            brand_b: brand_b.to_string(),
            strategy,
            data_origin,
            result,
            breakdown,
        }
    }
}

pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, report: &AnalysisReport) -> Result<PathBuf> {
        let path = StoragePaths::report_path(
            &self.root,
            &report.brand_a,
            &report.brand_b,
            report.run_id,
            report.generated_at,
        );

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create report directory {}", parent.display()))?;
        }

        let body = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        tokio::fs::write(&path, body)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;

        info!("Saved report {} to {}", report.run_id, path.display());
        Ok(path)
    }

    pub async fn load(&self, path: &Path) -> Result<AnalysisReport> {
        let body = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read report {}", path.display()))?;
        serde_json::from_str(&body).with_context(|| format!("Failed to parse report {}", path.display()))
    }

    /// Most recently generated report under the root, if any. Files that do
    /// not parse as reports are skipped.
    pub async fn latest(&self) -> Result<Option<AnalysisReport>> {
        let mut latest: Option<AnalysisReport> = None;

        for path in self.report_files().await? {
            match self.load(&path).await {
                Ok(report) => {
                    if latest
                        .as_ref()
                        .is_none_or(|current| report.generated_at > current.generated_at)
                    {
                        latest = Some(report);
                    }
                }
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        Ok(latest)
    }

    async fn report_files(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
            if !root.exists() {
                return Ok(Vec::new());
            }

            let mut files = Vec::new();
            for entry in WalkDir::new(&root) {
                let entry = entry.with_context(|| format!("Failed to list {}", root.display()))?;
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
                {
                    files.push(entry.into_path());
                }
            }
            Ok(files)
        })
        .await
        .context("Report listing task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::processor::GapAggregator;
    use chrono::Duration;

    fn report(brand_a: &str, brand_b: &str) -> AnalysisReport {
        let a = vec![
            Product::new("a1", "Bosch Fuel Filter Cartridge", "Filters", "Bosch").with_price(20.0),
        ];
        let b = vec![
            Product::new("b1", "MAHLE Fuel Filter Cartridge", "Filters", "MAHLE").with_price(18.5),
        ];
        let result = GapAggregator::default().analyze(&a, &b);
        AnalysisReport::new(
            Uuid::new_v4(),
            "https://www.autodoc.de",
            brand_a,
            brand_b,
            MatchStrategy::SingleAssignment,
            DataOrigin::Live,
            result,
        )
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let report = report("Bosch", "MAHLE");

        let path = store.save(&report).await.unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(path.to_string_lossy().ends_with(&format!("bosch_vs_mahle_{}.json", report.run_id)));

        let loaded = store.load(&path).await.unwrap();
        assert_eq!(loaded, report);
        assert_eq!(loaded.breakdown.len(), 1);
        assert_eq!(loaded.breakdown[0].common, 1);
    }

    #[tokio::test]
    async fn test_fallback_origin_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());
        let mut report = report("Bosch", "MAHLE");
        report.data_origin = DataOrigin::Fallback;

        let path = store.save(&report).await.unwrap();
        let body = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(body.contains("\"data_origin\": \"fallback\""));
        assert_eq!(store.load(&path).await.unwrap().data_origin, DataOrigin::Fallback);
    }

    #[tokio::test]
    async fn test_report_files_walks_dated_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        let report = report("Bosch", "MAHLE");
        let path = store.save(&report).await.unwrap();
        // YYYY/MM/DD/<file>.json
        assert_eq!(path.strip_prefix(dir.path()).unwrap().components().count(), 4);
        tokio::fs::write(dir.path().join("README.txt"), "ignored").await.unwrap();

        let files = store.report_files().await.unwrap();
        assert_eq!(files, vec![path]);
    }

    #[tokio::test]
    async fn test_latest_picks_newest_report() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path());

        let mut older = report("Bosch", "MAHLE");
        older.generated_at = older.generated_at - Duration::days(3);
        let newer = report("Valeo", "Brembo");

        store.save(&newer).await.unwrap();
        store.save(&older).await.unwrap();
        tokio::fs::write(dir.path().join("notes.json"), "not a report").await.unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest.run_id, newer.run_id);
    }

    #[tokio::test]
    async fn test_latest_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = ReportStore::new(dir.path().join("nothing-here"));
        assert!(store.latest().await.unwrap().is_none());
    }
}
