pub mod reporter;
pub mod sink;

pub use reporter::*;
pub use sink::*;
