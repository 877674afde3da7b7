use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{GapAnalysisResult, MatchedPair, Product};
use crate::processor::ProductMatcher;

/// How products of the two catalogs are paired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Each side is scanned on its own for a first match in the other list.
    /// One product of B can be the counterpart of several products of A, and
    /// a product of B is only unique when nothing in A matches it.
    Independent,
    /// Greedy one-to-one pairing in list order. Every product ends up either
    /// in exactly one pair or in its brand's unique list.
    #[default]
    SingleAssignment,
}

impl std::fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStrategy::Independent => f.write_str("independent"),
            MatchStrategy::SingleAssignment => f.write_str("single-assignment"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GapAggregator {
    matcher: ProductMatcher,
    strategy: MatchStrategy,
}

impl GapAggregator {
    pub fn new(matcher: ProductMatcher, strategy: MatchStrategy) -> Self {
        Self { matcher, strategy }
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn analyze(&self, list_a: &[Product], list_b: &[Product]) -> GapAnalysisResult {
        let (unique_to_a, unique_to_b, common) = match self.strategy {
            MatchStrategy::Independent => self.pair_independently(list_a, list_b),
            MatchStrategy::SingleAssignment => self.pair_one_to_one(list_a, list_b),
        };

        let categories = collect_categories(list_a, list_b);

        debug!(
            "Gap analysis ({}): {} vs {} products, {} common, {} unique to A, {} unique to B",
            self.strategy,
            list_a.len(),
            list_b.len(),
            common.len(),
            unique_to_a.len(),
            unique_to_b.len()
        );

        GapAnalysisResult::new(list_a, list_b, unique_to_a, unique_to_b, common, categories)
    }

    fn pair_independently(
        &self,
        list_a: &[Product],
        list_b: &[Product],
    ) -> (Vec<Product>, Vec<Product>, Vec<MatchedPair>) {
        let mut unique_to_a = Vec::new();
        let mut common = Vec::new();

        for a in list_a {
            match list_b.iter().find(|b| self.matcher.is_match(a, b)) {
                Some(b) => common.push(MatchedPair::new(a, b)),
                None => unique_to_a.push(a.clone()),
            }
        }

        // Second pass only decides membership of B's unique list.
        let unique_to_b = list_b
            .iter()
            .filter(|b| !list_a.iter().any(|a| self.matcher.is_match(a, b)))
            .cloned()
            .collect();

        (unique_to_a, unique_to_b, common)
    }

    fn pair_one_to_one(
        &self,
        list_a: &[Product],
        list_b: &[Product],
    ) -> (Vec<Product>, Vec<Product>, Vec<MatchedPair>) {
        let mut taken = vec![false; list_b.len()];
        let mut unique_to_a = Vec::new();
        let mut common = Vec::new();

        for a in list_a {
            let counterpart = list_b
                .iter()
                .enumerate()
                .find(|(index, b)| !taken[*index] && self.matcher.is_match(a, b));

            match counterpart {
                Some((index, b)) => {
                    taken[index] = true;
                    common.push(MatchedPair::new(a, b));
                }
                None => unique_to_a.push(a.clone()),
            }
        }

        let unique_to_b = list_b
            .iter()
            .zip(&taken)
            .filter(|(_, taken)| !**taken)
            .map(|(b, _)| b.clone())
            .collect();

        (unique_to_a, unique_to_b, common)
    }
}

/// Compares two catalogs with the default matcher, scanning each side
/// independently for a first match.
pub fn analyze_gap(list_a: &[Product], list_b: &[Product]) -> GapAnalysisResult {
    GapAggregator::new(ProductMatcher::default(), MatchStrategy::Independent).analyze(list_a, list_b)
}

fn collect_categories(list_a: &[Product], list_b: &[Product]) -> Vec<String> {
    list_a
        .iter()
        .chain(list_b)
        .map(|p| p.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
