use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Brand, DataOrigin, Product};

/// Supplies candidate brands and per-brand product lists for a store.
///
/// An empty list is a valid answer from either method. Implementations own
/// any fallback behavior for missing live data; errors are reserved for
/// failures the caller cannot work around.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Origin of the products this source returns.
    fn data_origin(&self) -> DataOrigin {
        DataOrigin::Live
    }

    /// Brands offered by the store at `store_url`.
    async fn discover_brands(&self, store_url: &str) -> Result<Vec<Brand>>;

    /// Products of `brand_name` offered by the store at `store_url`.
    async fn fetch_products(&self, brand_name: &str, store_url: &str) -> Result<Vec<Product>>;
}

/// Host part of a store URL, or the input itself when it does not parse.
pub fn store_domain(store_url: &str) -> String {
    url::Url::parse(store_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| store_url.trim().to_string())
}

/// Lower-cased name with whitespace removed, for building ids.
pub fn slug(name: &str) -> String {
    name.split_whitespace().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_domain() {
        assert_eq!(store_domain("https://www.autodoc.de/search?keyword=bosch"), "www.autodoc.de");
        assert_eq!(store_domain("http://localhost:8080/"), "localhost");
        assert_eq!(store_domain(" autodoc.de "), "autodoc.de");
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("febi bilstein"), "febibilstein");
        assert_eq!(slug("Brake Pad"), "brakepad");
        assert_eq!(slug("MANN-FILTER"), "mann-filter");
    }
}
