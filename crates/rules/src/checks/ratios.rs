//! Banking ratio plausibility checks on financial statements.
//!
//! Ratios are computed per row from whatever components are present; a row
//! missing a component simply skips that ratio. Islamic-standard issuers are
//! excluded entirely (their ratio bands differ upstream).

use idxwatch_core::{Anomaly, DataSlice, FinancialRow, Severity, TableKind};

use crate::checks::identities::{ISLAMIC_BANKS, MIN_ROWS};
use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "banking_ratio";

/// Flags banking ratios outside plausible bands: loan-to-deposit, CASA
/// share, capital adequacy, net-interest margin proxy, cost-to-income, and
/// loan-loss coverage.
pub struct BankingRatioRule;

impl BankingRatioRule {
    fn anomaly(
        &self,
        ctx: &RuleContext,
        severity: Severity,
        row: &FinancialRow,
        metric: &str,
        message: String,
        value: f64,
    ) -> Anomaly {
        Anomaly {
            rule: RULE_NAME.to_string(),
            severity,
            entity: (!row.symbol.is_empty()).then(|| row.symbol.clone()),
            date: ctx.anomaly_date(row.date),
            message: format!("{}: {metric}: {message}", row.symbol),
            observed: Some(value),
            expected: None,
        }
    }

    fn check_row(&self, row: &FinancialRow, ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        // Loan-to-deposit ratio.
        if let (Some(gross), Some(deposit)) = (row.gross_loan, row.total_deposit) {
            if deposit != 0.0 {
                let ldr = gross / deposit;
                if !(0.4..=1.3).contains(&ldr) {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Warning,
                        row,
                        "ldr",
                        format!("loan-to-deposit ratio {ldr:.2} outside 0.40–1.30"),
                        ldr,
                    ));
                }
            }
        }

        // CASA share of deposits.
        if let (Some(current), Some(savings)) = (row.current_account, row.savings_account) {
            let parts =
                current + savings + row.time_deposit.unwrap_or(0.0);
            if parts != 0.0 {
                let casa = (current + savings) / parts;
                if !(0.0..=1.0).contains(&casa) {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Warning,
                        row,
                        "casa",
                        format!("CASA share {casa:.2} outside 0–1"),
                        casa,
                    ));
                }
            }
        }

        // Capital adequacy ratio.
        if let (Some(capital), Some(rwa)) = (row.total_capital, row.total_risk_weighted_asset) {
            if rwa != 0.0 {
                let car = capital / rwa;
                if car < 0.1 {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Warning,
                        row,
                        "car",
                        format!("capital adequacy ratio {car:.2} below 0.10"),
                        car,
                    ));
                }
            }
        }

        // Net-interest-margin proxy over total assets.
        if let (Some(nii), Some(assets)) = (row.net_interest_income, row.total_assets) {
            if assets != 0.0 {
                let nim = nii / assets;
                if !(-0.02..=0.25).contains(&nim) {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Info,
                        row,
                        "nim_proxy",
                        format!("NIM proxy {:.2}% outside −2%–25%", nim * 100.0),
                        nim,
                    ));
                }
            }
        }

        // Cost-to-income ratio.
        if let Some(expense) = row.operating_expense {
            let income = row.net_interest_income.unwrap_or(0.0)
                + row.non_interest_income.unwrap_or(0.0);
            if income != 0.0 {
                let cir = expense / income;
                if !(0.0..=3.0).contains(&cir) {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Warning,
                        row,
                        "cost_to_income",
                        format!("cost-to-income ratio {:.0}% outside 0–300%", cir * 100.0),
                        cir,
                    ));
                }
            }
        }

        // Loan-loss coverage.
        if let (Some(allowance), Some(gross)) = (row.allowance_for_loans, row.gross_loan) {
            if gross != 0.0 {
                let coverage = allowance.abs() / gross;
                if !(0.0..=0.5).contains(&coverage) {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Info,
                        row,
                        "coverage_ratio",
                        format!("loan-loss coverage {:.1}% outside 0–50%", coverage * 100.0),
                        coverage,
                    ));
                }
            }
        }
    }
}

impl Rule for BankingRatioRule {
    fn name(&self) -> &'static str {
        RULE_NAME
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn applies_to(&self, kind: TableKind) -> bool {
        matches!(
            kind,
            TableKind::AnnualFinancials | TableKind::QuarterlyFinancials
        )
    }

    fn evaluate(
        &self,
        slice: &DataSlice,
        ctx: &RuleContext,
    ) -> Result<Vec<Anomaly>, RuleEvaluationError> {
        let rows = match slice {
            DataSlice::AnnualFinancials(rows) | DataSlice::QuarterlyFinancials(rows) => rows,
            _ => return Ok(Vec::new()),
        };
        if rows.len() <= MIN_ROWS {
            return Ok(Vec::new());
        }

        let mut anomalies = Vec::new();
        for row in rows {
            if ISLAMIC_BANKS.contains(&row.symbol.as_str()) {
                continue;
            }
            self.check_row(row, ctx, &mut anomalies);
        }
        Ok(anomalies)
    }
}
