//! Anomaly rule set for IDX dataset validation.
//!
//! This crate provides:
//! - The [`Rule`] capability: stateless, side-effect-free checks over a
//!   [`idxwatch_core::DataSlice`]
//! - Generic checks: completeness, statistical outlier, date/value sanity,
//!   duplicate keys
//! - IDX domain checks: extreme statement changes, accounting identities,
//!   banking ratios, daily price moves, dividend yields, filing price
//!   cross-checks, split timing
//! - The [`RuleCatalog`]: per-table ordered rule lists resolved at startup

pub mod catalog;
pub mod checks;
pub mod rule;

#[cfg(test)]
pub(crate) mod testkit;

pub use catalog::RuleCatalog;
pub use rule::{Rule, RuleContext, RuleEvaluationError};
