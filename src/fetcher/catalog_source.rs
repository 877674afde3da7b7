use anyhow::Result;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::CatalogConfig;
use crate::fetcher::{ProductSource, slug};
use crate::models::{Availability, Brand, DataOrigin, Product};

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Part names offered in each category of the demo catalog.
fn part_types_for_category(category: &str) -> &'static [&'static str] {
    match category {
        "Body Parts" => &["Bumper", "Fender", "Hood", "Door Panel", "Mirror"],
        "Brake System" => &["Brake Pad", "Brake Disc", "Brake Fluid", "Brake Hose", "Brake Caliper"],
        "Cooling System" => &["Radiator", "Water Pump", "Thermostat", "Coolant", "Fan"],
        "Electrical" => &["Battery", "Alternator", "Starter", "Ignition Coil", "Spark Plug"],
        "Engine Parts" => &["Piston", "Cylinder Head", "Gasket", "Timing Belt", "Oil Pump"],
        "Exhaust System" => &["Muffler", "Catalytic Converter", "Exhaust Pipe", "Manifold", "Gasket"],
        "Filters" => &["Oil Filter", "Air Filter", "Fuel Filter", "Cabin Filter", "Hydraulic Filter"],
        "Steering" => &["Power Steering Pump", "Steering Rack", "Tie Rod", "Steering Fluid", "Steering Wheel"],
        "Suspension" => &["Shock Absorber", "Strut", "Spring", "Bushing", "Stabilizer Bar"],
        "Transmission" => &["Clutch", "Drive Shaft", "CV Joint", "Transmission Fluid", "Gear"],
        _ => &["Component", "Part", "Assembly"],
    }
}

/// Network-free source backed by the configured fallback catalog.
///
/// Brands come from `fallback_brands`. Products are demo data generated from
/// a seed derived from the brand name, so the same brand always yields the
/// same catalog.
pub struct CatalogSource {
    catalog: CatalogConfig,
}

impl CatalogSource {
    pub fn new(catalog: CatalogConfig) -> Self {
        Self { catalog }
    }

    pub fn brands(&self, store_url: &str) -> Vec<Brand> {
        self.catalog
            .fallback_brands
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let mut brand = Brand::discovered(index, name, store_url).with_origin(DataOrigin::Demo);
                brand.categories = self.catalog.categories.clone();
                brand
            })
            .collect()
    }

    pub fn demo_products(&self, brand_name: &str, store_url: &str) -> Vec<Product> {
        let mut rng = StdRng::seed_from_u64(name_seed(brand_name));
        let brand_slug = slug(brand_name);

        if self.catalog.categories.is_empty() {
            return Vec::new();
        }

        (0..self.catalog.demo_products_per_brand)
            .map(|i| {
                let category = &self.catalog.categories[rng.gen_range(0..self.catalog.categories.len())];
                let part_types = part_types_for_category(category);
                let part_type = part_types[rng.gen_range(0..part_types.len())];
                let code: String = (0..6)
                    .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
                    .collect();
                let price = (rng.gen_range(10.0..210.0_f64) * 100.0).round() / 100.0;
                let availability = if rng.gen_bool(0.9) {
                    Availability::Available
                } else {
                    Availability::OutOfStock
                };

                Product::new(
                    format!("{}_{}", brand_slug, i),
                    format!("{} {} {}", brand_name, part_type, code),
                    category.clone(),
                    brand_name,
                )
                .with_price(price)
                .with_availability(availability)
                .with_url(format!("{}?brand={}&product={}", store_url, brand_slug, i + 1))
                .with_description(format!(
                    "Premium {} from {}",
                    part_type.to_lowercase(),
                    brand_name
                ))
            })
            .collect()
    }
}

#[async_trait]
impl ProductSource for CatalogSource {
    fn name(&self) -> &str {
        "catalog"
    }

    fn data_origin(&self) -> DataOrigin {
        DataOrigin::Demo
    }

    async fn discover_brands(&self, store_url: &str) -> Result<Vec<Brand>> {
        let brands = self.brands(store_url);
        info!("Using {} catalog brands for {}", brands.len(), store_url);
        Ok(brands)
    }

    async fn fetch_products(&self, brand_name: &str, store_url: &str) -> Result<Vec<Product>> {
        let products = self.demo_products(brand_name, store_url);
        info!("Generated {} demo products for {}", products.len(), brand_name);
        Ok(products)
    }
}

/// FNV-1a over the lower-cased name. `DefaultHasher` output may change
/// between Rust releases, and the demo catalog must not.
fn name_seed(name: &str) -> u64 {
    name.to_lowercase()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> CatalogSource {
        CatalogSource::new(CatalogConfig::default())
    }

    #[test]
    fn test_brands_come_from_fallback_list() {
        let brands = source().brands("https://www.autodoc.de");
        assert_eq!(brands.len(), 8);
        assert_eq!(brands[0].id, "brand_1");
        assert_eq!(brands[0].name, "Bosch");
        assert_eq!(brands[5].name, "febi bilstein");
        assert!(brands.iter().all(|b| b.website == "https://www.autodoc.de"));
        assert!(brands.iter().all(|b| b.origin == DataOrigin::Demo));
    }

    #[test]
    fn test_demo_products_are_reproducible() {
        let first = source().demo_products("Bosch", "https://www.autodoc.de");
        let second = source().demo_products("Bosch", "https://www.autodoc.de");
        assert_eq!(first, second);
        assert_eq!(first.len(), 12);

        let other = source().demo_products("Valeo", "https://www.autodoc.de");
        assert_ne!(first, other);
    }

    #[test]
    fn test_demo_products_are_well_formed() {
        let catalog = CatalogConfig::default();
        let products = source().demo_products("MANN-FILTER", "https://www.autodoc.de");

        for (i, product) in products.iter().enumerate() {
            assert_eq!(product.id, format!("mann-filter_{}", i));
            assert_eq!(product.brand, "MANN-FILTER");
            assert!(product.name.starts_with("MANN-FILTER "));
            assert!(catalog.categories.contains(&product.category));
            let price = product.price.unwrap();
            assert!((10.0..=210.0).contains(&price));
        }
    }

    #[test]
    fn test_empty_taxonomy_yields_no_products() {
        let mut catalog = CatalogConfig::default();
        catalog.categories.clear();
        assert!(CatalogSource::new(catalog).demo_products("Bosch", "x").is_empty());
    }

    #[tokio::test]
    async fn test_source_trait() {
        let source = source();
        let brands = source.discover_brands("https://www.autodoc.de").await.unwrap();
        let products = source.fetch_products(&brands[0].name, "https://www.autodoc.de").await.unwrap();
        assert_eq!(products.len(), 12);
        assert_eq!(source.name(), "catalog");
        assert_eq!(source.data_origin(), DataOrigin::Demo);
    }
}
