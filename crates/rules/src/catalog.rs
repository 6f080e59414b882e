//! Startup-resolved mapping from table kind to its ordered rule list.

use std::collections::HashMap;
use std::sync::Arc;

use idxwatch_core::TableKind;

use crate::checks::{
    AccountingIdentityRule, BankingRatioRule, CompletenessRule, DailyMoveRule, DividendYieldRule,
    DuplicateKeyRule, ExtremeAnnualChangeRule, ExtremeQuarterlyChangeRule, FilingPriceRule,
    OutlierRule, SanityRule, SplitProximityRule,
};
use crate::rule::Rule;

/// The resolved rule sets, one ordered list per table kind.
///
/// Built once at startup from rule applicability; evaluation never looks
/// rules up by name. Declaration order is fixed (generic checks first, then
/// domain checks) and anomalies preserve it.
pub struct RuleCatalog {
    sets: HashMap<TableKind, Vec<Arc<dyn Rule>>>,
}

impl RuleCatalog {
    /// The standard catalog with default rule thresholds. Statistical
    /// thresholds (sigma, window) travel in the `RuleContext`, not here.
    pub fn standard() -> Self {
        let rules: Vec<Arc<dyn Rule>> = vec![
            Arc::new(CompletenessRule),
            Arc::new(OutlierRule),
            Arc::new(SanityRule),
            Arc::new(DuplicateKeyRule),
            Arc::new(ExtremeAnnualChangeRule::default()),
            Arc::new(ExtremeQuarterlyChangeRule::default()),
            Arc::new(AccountingIdentityRule),
            Arc::new(BankingRatioRule),
            Arc::new(DailyMoveRule::default()),
            Arc::new(DividendYieldRule::default()),
            Arc::new(FilingPriceRule::default()),
            Arc::new(SplitProximityRule::default()),
        ];
        Self::from_rules(rules)
    }

    /// Resolve applicability into per-kind lists, preserving declaration order.
    pub fn from_rules(rules: Vec<Arc<dyn Rule>>) -> Self {
        let mut sets = HashMap::new();
        for kind in TableKind::ALL {
            let applicable: Vec<Arc<dyn Rule>> = rules
                .iter()
                .filter(|r| r.applies_to(kind))
                .cloned()
                .collect();
            sets.insert(kind, applicable);
        }
        Self { sets }
    }

    /// The ordered rules for one kind.
    pub fn rules_for(&self, kind: TableKind) -> &[Arc<dyn Rule>] {
        self.sets.get(&kind).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

impl Default for RuleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
