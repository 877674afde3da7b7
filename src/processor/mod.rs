pub mod category_breakdown;
pub mod gap_aggregator;
pub mod product_matcher;

pub use category_breakdown::*;
pub use gap_aggregator::*;
pub use product_matcher::*;
