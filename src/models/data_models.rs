use serde::{Deserialize, Serialize};

/// Part categories used when a source does not supply its own taxonomy.
pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "Body Parts",
    "Brake System",
    "Cooling System",
    "Electrical",
    "Engine Parts",
    "Exhaust System",
    "Filters",
    "Steering",
    "Suspension",
    "Transmission",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "Available", alias = "available", alias = "in-stock")]
    Available,
    #[serde(rename = "Out of Stock", alias = "out-of-stock", alias = "OutOfStock")]
    OutOfStock,
    #[default]
    #[serde(rename = "Unknown", other)]
    Unknown,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// One catalog item offered by a brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub availability: Availability,
    pub brand: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageUrl")]
    pub image_url: Option<String>,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        brand: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price: None,
            availability: Availability::Unknown,
            brand: brand.into(),
            url: None,
            description: None,
            image_url: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_availability(mut self, availability: Availability) -> Self {
        self.availability = availability;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Where brand and product data came from. Ordered from most to least
/// trustworthy, so the worst origin of a run is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataOrigin {
    /// Found on the store through a live search.
    #[default]
    Live,
    /// Static brand list used because live discovery failed or found nothing.
    Fallback,
    /// Generated demo catalog.
    Demo,
}

impl DataOrigin {
    pub fn is_live(&self) -> bool {
        matches!(self, DataOrigin::Live)
    }
}

/// A manufacturer discovered on a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub name: String,
    pub website: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub origin: DataOrigin,
}

impl Brand {
    /// Brands found on a store are numbered in discovery order.
    pub fn discovered(index: usize, name: &str, website: &str) -> Self {
        Self {
            id: format!("brand_{}", index + 1),
            name: name.to_string(),
            website: website.to_string(),
            description: Some(format!("Automotive parts and components from {}", name)),
            categories: Vec::new(),
            origin: DataOrigin::Live,
        }
    }

    pub fn with_origin(mut self, origin: DataOrigin) -> Self {
        self.origin = origin;
        self
    }
}

/// Two products judged to be the same part, one from each brand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    product_a: Product,
    product_b: Product,
    price_difference: Option<f64>,
}

impl MatchedPair {
    pub(crate) fn new(product_a: &Product, product_b: &Product) -> Self {
        let price_difference = match (product_a.price, product_b.price) {
            (Some(a), Some(b)) => Some(a - b),
            _ => None,
        };

        Self {
            product_a: product_a.clone(),
            product_b: product_b.clone(),
            price_difference,
        }
    }

    pub fn product_a(&self) -> &Product {
        &self.product_a
    }

    pub fn product_b(&self) -> &Product {
        &self.product_b
    }

    /// `a.price - b.price`; positive when brand A is more expensive.
    pub fn price_difference(&self) -> Option<f64> {
        self.price_difference
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GapSummary {
    pub total_a: usize,
    pub total_b: usize,
    pub unique_a_count: usize,
    pub unique_b_count: usize,
    pub common_count: usize,
}

/// Outcome of comparing two brand catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    products_a: Vec<Product>,
    products_b: Vec<Product>,
    unique_to_a: Vec<Product>,
    unique_to_b: Vec<Product>,
    common_products: Vec<MatchedPair>,
    categories: Vec<String>,
    summary: GapSummary,
}

impl GapAnalysisResult {
    pub(crate) fn new(
        products_a: &[Product],
        products_b: &[Product],
        unique_to_a: Vec<Product>,
        unique_to_b: Vec<Product>,
        common_products: Vec<MatchedPair>,
        categories: Vec<String>,
    ) -> Self {
        let summary = GapSummary {
            total_a: products_a.len(),
            total_b: products_b.len(),
            unique_a_count: unique_to_a.len(),
            unique_b_count: unique_to_b.len(),
            common_count: common_products.len(),
        };

        Self {
            products_a: products_a.to_vec(),
            products_b: products_b.to_vec(),
            unique_to_a,
            unique_to_b,
            common_products,
            categories,
            summary,
        }
    }

    pub fn products_a(&self) -> &[Product] {
        &self.products_a
    }

    pub fn products_b(&self) -> &[Product] {
        &self.products_b
    }

    pub fn unique_to_a(&self) -> &[Product] {
        &self.unique_to_a
    }

    pub fn unique_to_b(&self) -> &[Product] {
        &self.unique_to_b
    }

    pub fn common_products(&self) -> &[MatchedPair] {
        &self.common_products
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn summary(&self) -> &GapSummary {
        &self.summary
    }
}
