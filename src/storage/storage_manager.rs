use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::fetcher::slug;

pub struct StoragePaths;

impl StoragePaths {
    /// `<root>/YYYY/MM/DD/<brand-a>_vs_<brand-b>_<run_id>.json`
    pub fn report_path(
        root: &Path,
        brand_a: &str,
        brand_b: &str,
        run_id: Uuid,
        generated_at: DateTime<Utc>,
    ) -> PathBuf {
        let date = generated_at.format("%Y/%m/%d").to_string();
        root.join(date).join(format!(
            "{}_vs_{}_{}.json",
            file_slug(brand_a),
            file_slug(brand_b),
            run_id
        ))
    }
}

fn file_slug(name: &str) -> String {
    slug(name)
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}
