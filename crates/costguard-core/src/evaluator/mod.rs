//! Cost spike and tag compliance evaluation
//!
//! Both evaluators are pure functions over already-fetched data; fetching,
//! persistence and notification live in [`crate::jobs`].

pub mod compliance;
pub mod spike;

pub use compliance::evaluate as evaluate_compliance;
pub use spike::{evaluate as evaluate_spike, SpikeThresholds};
