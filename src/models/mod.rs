//! Data models

pub mod features;
pub mod verdict;
pub mod api;

pub use features::*;
pub use verdict::*;
pub use api::*;
