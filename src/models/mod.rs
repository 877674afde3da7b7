pub mod data_models;
pub mod progress_models;

pub use data_models::*;
pub use progress_models::*;
