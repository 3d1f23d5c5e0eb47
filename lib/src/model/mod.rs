pub mod dataset;
pub mod scoring;
pub mod training;
pub mod types;
pub mod update;

pub use dataset::*;
pub use training::*;
pub use types::*;
