use serde::{Deserialize, Serialize};

use crate::models::GapAnalysisResult;

/// Per-category counts of a gap analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub total_a: usize,
    pub total_b: usize,
    pub unique_a: usize,
    pub unique_b: usize,
    pub common: usize,
    /// Mean of `a.price - b.price` over pairs in this category with both prices known.
    pub avg_price_difference: Option<f64>,
}

pub struct CategoryBreakdown;

impl CategoryBreakdown {
    /// One row per category, in the result's category order.
    pub fn from_result(result: &GapAnalysisResult) -> Vec<CategoryStats> {
        result
            .categories()
            .iter()
            .map(|category| {
                let in_category = |c: &String| c == category;

                let differences: Vec<f64> = result
                    .common_products()
                    .iter()
                    .filter(|pair| in_category(&pair.product_a().category))
                    .filter_map(|pair| pair.price_difference())
                    .collect();

                let avg_price_difference = if differences.is_empty() {
                    None
                } else {
                    Some(differences.iter().sum::<f64>() / differences.len() as f64)
                };

                CategoryStats {
                    category: category.clone(),
                    total_a: result.products_a().iter().filter(|p| in_category(&p.category)).count(),
                    total_b: result.products_b().iter().filter(|p| in_category(&p.category)).count(),
                    unique_a: result.unique_to_a().iter().filter(|p| in_category(&p.category)).count(),
                    unique_b: result.unique_to_b().iter().filter(|p| in_category(&p.category)).count(),
                    common: result
                        .common_products()
                        .iter()
                        .filter(|pair| in_category(&pair.product_a().category))
                        .count(),
                    avg_price_difference,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::processor::analyze_gap;

    #[test]
    fn test_breakdown_per_category() {
        let list_a = vec![
            Product::new("a1", "Brake Pads Ceramic Front", "Brake System", "Bosch").with_price(50.0),
            Product::new("a2", "Brake Caliper Rebuild Set", "Brake System", "Bosch"),
            Product::new("a3", "Cabin Filter Activated Carbon", "Filters", "Bosch").with_price(20.0),
        ];
        let list_b = vec![
            Product::new("b1", "Ceramic Brake Pads Front", "Brake System", "ATE").with_price(45.0),
            Product::new("b2", "Activated Carbon Cabin Filter", "Filters", "Hella").with_price(24.0),
            Product::new("b3", "Radiator Hose Upper", "Cooling System", "Gates"),
        ];

        let result = analyze_gap(&list_a, &list_b);
        let rows = CategoryBreakdown::from_result(&result);

        let names: Vec<&str> = rows.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(names, vec!["Brake System", "Cooling System", "Filters"]);

        let brakes = &rows[0];
        assert_eq!((brakes.total_a, brakes.total_b), (2, 1));
        assert_eq!((brakes.unique_a, brakes.unique_b, brakes.common), (1, 0, 1));
        assert_eq!(brakes.avg_price_difference, Some(5.0));

        let cooling = &rows[1];
        assert_eq!((cooling.total_a, cooling.unique_b, cooling.common), (0, 1, 0));
        assert_eq!(cooling.avg_price_difference, None);

        let filters = &rows[2];
        assert_eq!(filters.common, 1);
        assert_eq!(filters.avg_price_difference, Some(-4.0));
    }

    #[test]
    fn test_breakdown_of_empty_result() {
        let result = analyze_gap(&[], &[]);
        assert!(CategoryBreakdown::from_result(&result).is_empty());
    }
}
