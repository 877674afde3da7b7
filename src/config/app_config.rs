use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;

use crate::models::DEFAULT_CATEGORIES;
use crate::processor::{
    DEFAULT_MIN_SHARED_TOKENS, DEFAULT_MIN_TOKEN_LEN, GapAggregator, MatchStrategy, ProductMatcher,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
}

/// Web search provider used to discover brands and products on a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_url: String,
    /// Name of the environment variable holding the API key.
    pub env_api_key: String,
    pub search_depth: String,
    pub max_results: u32,
    pub request_timeout_seconds: u64,
    // Loaded from the environment, never from the file
    #[serde(skip)]
    pub api_key: Option<String>,
}

/// Brands and taxonomy used when live data is missing or incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub fallback_brands: Vec<String>,
    pub known_brands: Vec<String>,
    pub categories: Vec<String>,
    pub max_brands: usize,
    pub max_products: usize,
    pub demo_products_per_brand: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub strategy: MatchStrategy,
    pub min_token_len: usize,
    pub min_shared_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_dir: String,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// Reads `path` when it exists, otherwise falls back to defaults.
    pub fn from_file_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn aggregator(&self) -> GapAggregator {
        GapAggregator::new(
            ProductMatcher::new(self.matching.min_token_len, self.matching.min_shared_tokens),
            self.matching.strategy,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.api_url.is_empty() {
            return Err(anyhow!("Search API url cannot be empty"));
        }

        if self.catalog.fallback_brands.is_empty() {
            return Err(anyhow!("At least one fallback brand is required"));
        }

        if self.catalog.categories.is_empty() {
            return Err(anyhow!("Product category list cannot be empty"));
        }

        if self.matching.min_shared_tokens == 0 {
            return Err(anyhow!("min_shared_tokens must be at least 1"));
        }

        Ok(())
    }
}

impl SearchConfig {
    pub fn load_api_key(&mut self) -> Result<()> {
        let key = env::var(&self.env_api_key)
            .with_context(|| format!("Missing environment variable: {}", self.env_api_key))?;

        if key.trim().is_empty() {
            return Err(anyhow!("Environment variable {} is empty", self.env_api_key));
        }

        self.api_key = Some(key);
        Ok(())
    }

    pub fn get_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Search API key not loaded"))
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.tavily.com/search".to_string(),
            env_api_key: "TAVILY_API_KEY".to_string(),
            search_depth: "basic".to_string(),
            max_results: 10,
            request_timeout_seconds: 10,
            api_key: None,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let to_strings =
            |names: &[&str]| -> Vec<String> { names.iter().map(|s| s.to_string()).collect() };

        Self {
            fallback_brands: to_strings(&[
                "Bosch",
                "Continental",
                "Valeo",
                "MAHLE",
                "SACHS",
                "febi bilstein",
                "MANN-FILTER",
                "PIERBURG",
            ]),
            known_brands: to_strings(&[
                "Bosch", "Continental", "Valeo", "MAHLE", "SACHS", "febi bilstein",
                "MANN-FILTER", "PIERBURG", "Lemförder", "TRW", "Brembo", "Bilstein",
                "Monroe", "KYB", "Denso", "NGK", "Champion", "Hella", "Osram",
                "Philips", "Castrol", "Mobil", "Shell", "Total", "Liqui Moly",
                "Motul", "Elring", "Corteco", "Reinz", "Goetze", "ATE", "Textar",
                "Pagid", "Ferodo", "Jurid", "Zimmermann", "Optimal", "Meyle",
                "Swag", "Topran", "Trucktec", "Vemo", "Ackoja", "Blue Print",
            ]),
            categories: to_strings(&DEFAULT_CATEGORIES),
            max_brands: 15,
            max_products: 10,
            demo_products_per_brand: 12,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::default(),
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
            min_shared_tokens: DEFAULT_MIN_SHARED_TOKENS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: "reports".to_string(),
        }
    }
}
