use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::{CatalogConfig, SearchConfig};
use crate::fetcher::{CatalogSource, ProductSource, slug, store_domain};
use crate::models::{Availability, Brand, DataOrigin, Product};

/// Part types recognized in search results, with the category each belongs to.
const PART_TYPES: [(&str, &str); 18] = [
    ("brake pad", "Brake System"),
    ("brake disc", "Brake System"),
    ("oil filter", "Filters"),
    ("air filter", "Filters"),
    ("spark plug", "Electrical"),
    ("shock absorber", "Suspension"),
    ("strut", "Suspension"),
    ("belt", "Engine Parts"),
    ("pump", "Cooling System"),
    ("sensor", "Electrical"),
    ("valve", "Engine Parts"),
    ("gasket", "Engine Parts"),
    ("bearing", "Suspension"),
    ("joint", "Steering"),
    ("hose", "Cooling System"),
    ("fluid", "Brake System"),
    ("bulb", "Electrical"),
    ("fuse", "Electrical"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

impl SearchHit {
    fn text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

/// Pulls brand names and product records out of free-text search hits.
pub struct SearchResultParser {
    known_brands: Vec<String>,
    brand_patterns: Vec<Regex>,
    price_patterns: Vec<Regex>,
    max_brands: usize,
    max_products: usize,
}

impl SearchResultParser {
    pub fn new(catalog: &CatalogConfig) -> Result<Self> {
        let brand_patterns = vec![
            // Capitalized words followed by a parts keyword: "Brembo parts"
            Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\s+(?i:parts|components|automotive|auto)\b")?,
            // Acronyms, optionally hyphenated: "MANN-FILTER components"
            Regex::new(r"\b([A-Z]{2,}(?:-[A-Z]+)*)\s+(?i:parts|components|automotive|auto)\b")?,
        ];

        // Amounts keep their grouping separators: "1.299,00", "1,299.00".
        let price_patterns = vec![
            Regex::new(r"[€$£]\s?(\d(?:[\d.,]*\d)?)")?,
            Regex::new(r"(\d(?:[\d.,]*\d)?)\s?(?:€|EUR\b)")?,
        ];

        Ok(Self {
            known_brands: catalog.known_brands.clone(),
            brand_patterns,
            price_patterns,
            max_brands: catalog.max_brands,
            max_products: catalog.max_products,
        })
    }

    /// Brand names mentioned in the hits: known brands first, then names
    /// found by pattern, deduplicated case-insensitively.
    pub fn extract_brand_names(&self, hits: &[SearchHit]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();

        let mut push = |name: &str| {
            if seen.insert(name.to_lowercase()) {
                names.push(name.to_string());
            }
        };

        let content = hits.iter().map(SearchHit::text).collect::<Vec<_>>().join(" ").to_lowercase();
        for brand in &self.known_brands {
            if content.contains(&brand.to_lowercase()) {
                push(brand.as_str());
            }
        }

        for hit in hits {
            let text = hit.text();
            for pattern in &self.brand_patterns {
                for captures in pattern.captures_iter(&text) {
                    if let Some(name) = captures.get(1) {
                        let name = name.as_str().trim();
                        if name.len() > 2 && name.len() < 30 {
                            push(name);
                        }
                    }
                }
            }
        }

        names.truncate(self.max_brands);
        names
    }

    /// First price mentioned in `text`, by position in the text.
    pub fn extract_price(&self, text: &str) -> Option<f64> {
        self.price_patterns
            .iter()
            .filter_map(|pattern| pattern.captures(text))
            .filter_map(|captures| captures.get(1))
            .min_by_key(|amount| amount.start())
            .and_then(|amount| parse_amount(amount.as_str()))
    }

    /// One product per part type mentioned in each hit, in hit order.
    pub fn extract_products(&self, hits: &[SearchHit], brand_name: &str) -> Vec<Product> {
        let brand_slug = slug(brand_name);
        let mut products = Vec::new();

        for (hit_index, hit) in hits.iter().enumerate() {
            let text = hit.text();
            let lowered = text.to_lowercase();
            let price = self.extract_price(&text);

            let found = PART_TYPES.iter().filter(|(part_type, _)| lowered.contains(part_type));
            for (type_index, (part_type, category)) in found.enumerate() {
                if products.len() >= self.max_products {
                    return products;
                }

                let mut product = Product::new(
                    format!("{}_{}_{}_{}", brand_slug, slug(part_type), hit_index, type_index),
                    format!("{} {}", brand_name, title_case(part_type)),
                    *category,
                    brand_name,
                )
                .with_availability(Availability::Unknown)
                .with_description(format!("{} from {}", title_case(part_type), brand_name));

                product.price = price;
                if !hit.url.is_empty() {
                    product.url = Some(hit.url.clone());
                }
                products.push(product);
            }
        }

        products
    }
}

/// Reads "1.299,00", "1,299.00", "12,5" or "1299". The last separator is the
/// decimal point only when one or two digits follow it; every other separator
/// groups thousands.
fn parse_amount(raw: &str) -> Option<f64> {
    let is_separator = |c: char| c == '.' || c == ',';
    let digits = |part: &str| part.chars().filter(|c| !is_separator(*c)).collect::<String>();

    let normalized = match raw.rfind(is_separator) {
        Some(idx) if (1..=2).contains(&(raw.len() - idx - 1)) => {
            format!("{}.{}", digits(&raw[..idx]), &raw[idx + 1..])
        }
        _ => digits(raw),
    };

    normalized.parse::<f64>().ok()
}

fn title_case(words: &str) -> String {
    words
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Discovers brands and products through a web search API scoped to the store's domain.
pub struct SearchSource {
    client: Client,
    config: SearchConfig,
    parser: SearchResultParser,
    fallback: CatalogSource,
}

impl SearchSource {
    pub fn new(config: SearchConfig, catalog: CatalogConfig) -> Result<Self> {
        config.get_api_key().context("Search source needs an API key")?;

        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;
        let parser = SearchResultParser::new(&catalog)?;

        Ok(SearchSource {
            client,
            config,
            parser,
            fallback: CatalogSource::new(catalog),
        })
    }

    async fn search(&self, query: &str, domain: &str) -> Result<SearchResponse> {
        let search_query = format!("site:{} {}", domain, query);
        info!("Searching: {}", search_query);

        let body = serde_json::json!({
            "api_key": self.config.get_api_key()?,
            "query": search_query,
            "search_depth": self.config.search_depth,
            "include_answer": true,
            "include_images": false,
            "include_raw_content": false,
            "max_results": self.config.max_results,
        });

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Search request to {} failed", self.config.api_url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Search API error: {}", response.status()));
        }

        let data: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search API response")?;

        info!("Search returned {} results", data.results.len());
        Ok(data)
    }
}

#[async_trait]
impl ProductSource for SearchSource {
    fn name(&self) -> &str {
        "search"
    }

    async fn discover_brands(&self, store_url: &str) -> Result<Vec<Brand>> {
        let domain = store_domain(store_url);
        let query = format!("automotive parts brands {}", domain);

        let names = match self.search(&query, &domain).await {
            Ok(response) => self.parser.extract_brand_names(&response.results),
            Err(e) => {
                warn!("Brand discovery failed for {}: {:#}", domain, e);
                Vec::new()
            }
        };

        if names.is_empty() {
            warn!("No brands found for {}, using fallback catalog", domain);
            return Ok(self
                .fallback
                .brands(store_url)
                .into_iter()
                .map(|brand| brand.with_origin(DataOrigin::Fallback))
                .collect());
        }

        info!("Discovered {} brands on {}", names.len(), domain);
        Ok(names
            .iter()
            .enumerate()
            .map(|(index, name)| Brand::discovered(index, name, store_url))
            .collect())
    }

    async fn fetch_products(&self, brand_name: &str, store_url: &str) -> Result<Vec<Product>> {
        let domain = store_domain(store_url);
        let query = format!("{} automotive parts products prices", brand_name);

        let response = self
            .search(&query, &domain)
            .await
            .with_context(|| format!("Failed to search products for {}", brand_name))?;

        let products = self.parser.extract_products(&response.results, brand_name);
        if products.is_empty() {
            warn!("No products recognized for {} on {}", brand_name, domain);
        } else {
            info!("Found {} products for {} on {}", products.len(), brand_name, domain);
        }

        Ok(products)
    }
}
