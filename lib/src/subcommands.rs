pub use classify::*;
pub use train::*;

pub mod classify;
pub mod train;
