//! Individual validation checks, generic first, then table-specific.

pub mod completeness;
pub mod dividends;
pub mod duplicates;
pub mod filings;
pub mod financials;
pub mod identities;
pub mod outlier;
pub mod prices;
pub mod ratios;
pub mod sanity;
pub mod splits;

pub use completeness::CompletenessRule;
pub use dividends::DividendYieldRule;
pub use duplicates::DuplicateKeyRule;
pub use filings::FilingPriceRule;
pub use financials::{ExtremeAnnualChangeRule, ExtremeQuarterlyChangeRule};
pub use identities::AccountingIdentityRule;
pub use outlier::OutlierRule;
pub use prices::DailyMoveRule;
pub use ratios::BankingRatioRule;
pub use sanity::SanityRule;
pub use splits::SplitProximityRule;
