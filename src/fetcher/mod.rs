pub mod catalog_source;
pub mod product_source;
pub mod search_source;

pub use catalog_source::*;
pub use product_source::*;
pub use search_source::*;
