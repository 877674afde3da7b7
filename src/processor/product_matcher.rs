use std::collections::BTreeSet;

use crate::models::Product;

pub const DEFAULT_MIN_TOKEN_LEN: usize = 4;
pub const DEFAULT_MIN_SHARED_TOKENS: usize = 2;

/// Decides whether two products from different brands are the same part.
///
/// Products match when they sit in the same category and their names share
/// enough discriminative words. Words that belong to either brand name and
/// short words (units, sizes, stopwords) never count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductMatcher {
    min_token_len: usize,
    min_shared_tokens: usize,
}

impl ProductMatcher {
    pub fn new(min_token_len: usize, min_shared_tokens: usize) -> Self {
        Self {
            min_token_len,
            min_shared_tokens,
        }
    }

    pub fn is_match(&self, p1: &Product, p2: &Product) -> bool {
        if p1.category != p2.category {
            return false;
        }

        self.shared_tokens(p1, p2).len() >= self.min_shared_tokens
    }

    /// Name tokens both products share after brand words and short words are
    /// removed. Does not look at categories.
    pub fn shared_tokens(&self, p1: &Product, p2: &Product) -> BTreeSet<String> {
        let brand1 = p1.brand.to_lowercase();
        let brand2 = p2.brand.to_lowercase();

        let tokens1 = tokenize_name(&p1.name);
        let tokens2 = tokenize_name(&p2.name);

        tokens1
            .intersection(&tokens2)
            .filter(|token| token.chars().count() >= self.min_token_len)
            .filter(|token| !brand1.contains(token.as_str()) && !brand2.contains(token.as_str()))
            .cloned()
            .collect()
    }
}

impl Default for ProductMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOKEN_LEN, DEFAULT_MIN_SHARED_TOKENS)
    }
}

/// Lower-cased, whitespace-separated words of a product name.
pub fn tokenize_name(name: &str) -> BTreeSet<String> {
    name.split_whitespace().map(|word| word.to_lowercase()).collect()
}

/// Matches two products with the default thresholds.
pub fn is_match(p1: &Product, p2: &Product) -> bool {
    ProductMatcher::default().is_match(p1, p2)
}
