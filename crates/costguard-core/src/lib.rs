//! # Cost Guard
//!
//! Daily cost spike and tag compliance monitor for a cloud environment.
//!
//! Two pipelines share the same shape, fetch → evaluate → report → notify:
//!
//! - **Cost spike**: pulls a per-service daily cost series for one tagged
//!   environment and compares yesterday against the trailing 7-day average.
//! - **Tag audit**: pulls every tagged resource and checks it against the
//!   required-tag and environment-value policy.
//!
//! ## Architecture
//!
//! - **Evaluator**: pure spike and compliance logic
//! - **Collector**: paginated billing and inventory clients
//! - **Storage**: latest + dated snapshot report persistence
//! - **Alerting**: notification rendering and delivery
//! - **Jobs**: the pipelines, with collaborators injected
//!
//! ## Quick Start
//!
//! ```bash
//! export COSTGUARD_REPORTS__ROOT=/var/lib/costguard
//! export COSTGUARD_NOTIFICATIONS__CHANNEL=log
//! costguard run
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod alerting;
pub mod collector;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod jobs;
pub mod models;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::alerting::Notifier;
    pub use crate::collector::{CostFetcher, CostQuery, ResourceFetcher};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::evaluator::{evaluate_compliance, evaluate_spike, SpikeThresholds};
    pub use crate::jobs::{Collaborators, CostSpikeJob, TagAuditJob};
    pub use crate::models::*;
    pub use crate::storage::{ReportKind, ReportSink};
}
