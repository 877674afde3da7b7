pub mod analysis_run;

pub use analysis_run::*;
