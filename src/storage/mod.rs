pub mod report_store;
pub mod storage_manager;

pub use report_store::*;
pub use storage_manager::*;
