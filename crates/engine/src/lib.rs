//! Validation engine: the validator, the run orchestrator, and the
//! dashboard aggregation layer.
//!
//! The engine is wired from capabilities (`DataSource`, `ResultStore`,
//! `Notifier`) so the serving layer and the tests choose the adapters.

pub mod dashboard;
pub mod orchestrator;
pub mod validator;

#[cfg(test)]
pub(crate) mod testkit;

pub use dashboard::{
    DashboardAggregator, DashboardStats, RecentResults, TrendMetric, TrendPoint, TrendSeries,
};
pub use orchestrator::Orchestrator;
pub use validator::Validator;
