//! Data models for Cost Guard

mod compliance;
mod cost;
mod report;
mod resource;

pub use compliance::*;
pub use cost::*;
pub use report::*;
pub use resource::*;
