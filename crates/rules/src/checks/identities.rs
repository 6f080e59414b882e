//! Core accounting identity checks on financial statements.
//!
//! Each identity is evaluated only on rows where every component is present
//! (missing values are never coerced to zero). Tolerances combine a relative
//! and an absolute materiality floor, in rupiah-scale figures.

use idxwatch_core::{Anomaly, DataSlice, FinancialRow, Severity, TableKind};

use crate::rule::{Rule, RuleContext, RuleEvaluationError};

const RULE_NAME: &str = "accounting_identity";
/// Identity and ratio checks are skipped on thin slices.
pub(crate) const MIN_ROWS: usize = 10;
/// Issuers reporting under Islamic accounting standards; the balance-sheet
/// identity does not hold for them in the upstream data.
pub(crate) const ISLAMIC_BANKS: [&str; 5] =
    ["BANK.JK", "BRIS.JK", "BSIM.JK", "PNBS.JK", "BTPS.JK"];

/// Per-row tolerance combining relative and absolute materiality.
fn tolerance(base: f64, rel: f64, abs_floor: f64) -> f64 {
    (base.abs() * rel).max(abs_floor)
}

/// Validates balance-sheet, P&L, and cash-flow identities.
pub struct AccountingIdentityRule;

impl AccountingIdentityRule {
    fn anomaly(
        &self,
        ctx: &RuleContext,
        severity: Severity,
        row: &FinancialRow,
        metric: &str,
        message: String,
        difference: f64,
        expected: f64,
    ) -> Anomaly {
        Anomaly {
            rule: RULE_NAME.to_string(),
            severity,
            entity: (!row.symbol.is_empty()).then(|| row.symbol.clone()),
            date: ctx.anomaly_date(row.date),
            message: format!("{}: {metric}: {message}", row.symbol),
            observed: Some(difference),
            expected: Some(expected),
        }
    }

    /// Assets = Liabilities + Equity. Severity graded by the relative gap.
    fn balance_sheet(&self, rows: &[FinancialRow], ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        for row in rows {
            if ISLAMIC_BANKS.contains(&row.symbol.as_str()) {
                continue;
            }
            let (Some(assets), Some(liabilities), Some(equity)) =
                (row.total_assets, row.total_liabilities, row.total_equity)
            else {
                continue;
            };
            let rhs = liabilities + equity;
            let diff = assets - rhs;
            if diff.abs() > tolerance(assets, 0.1, 1e9) {
                let base = if assets != 0.0 { assets.abs() } else { 1.0 };
                let diff_pct = diff.abs() / base * 100.0;
                let severity = if diff_pct > 11.0 {
                    Severity::Critical
                } else if diff_pct > 5.0 {
                    Severity::Warning
                } else {
                    Severity::Info
                };
                out.push(self.anomaly(
                    ctx,
                    severity,
                    row,
                    "assets=liabilities+equity",
                    format!("assets differ from liabilities plus equity by {diff_pct:.1}%"),
                    diff,
                    rhs,
                ));
            }
        }
    }

    /// Net loan = Gross loan − |Allowance|.
    fn net_loan(&self, rows: &[FinancialRow], ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        for row in rows {
            let (Some(gross), Some(allowance), Some(net)) =
                (row.gross_loan, row.allowance_for_loans, row.net_loan)
            else {
                continue;
            };
            let expected = gross - allowance.abs();
            let diff = net - expected;
            if diff.abs() > tolerance(expected, 0.02, 1e9) {
                out.push(self.anomaly(
                    ctx,
                    Severity::Warning,
                    row,
                    "net_loan=gross_loan-allowance",
                    "net loan does not equal gross loan minus allowance".to_string(),
                    diff,
                    expected,
                ));
            }
        }
    }

    /// EBT ≈ Earnings + Tax, optionally plus minorities.
    fn pre_tax(&self, rows: &[FinancialRow], ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        for row in rows {
            let (Some(ebt), Some(earnings), Some(tax)) =
                (row.earnings_before_tax, row.earnings, row.tax)
            else {
                continue;
            };
            let without_minorities = earnings + tax;
            let with_minorities = without_minorities + row.minorities.unwrap_or(0.0);
            let tol = tolerance(ebt, 0.05, 1e9);
            if (ebt - without_minorities).abs() > tol && (ebt - with_minorities).abs() > tol {
                out.push(self.anomaly(
                    ctx,
                    Severity::Warning,
                    row,
                    "ebt=earnings+tax(+minorities)",
                    "pre-tax earnings do not reconcile with earnings plus tax".to_string(),
                    ebt - without_minorities,
                    without_minorities,
                ));
            }
        }
    }

    /// Net cash flow = CFO + CFI + CFF. A missing total with all components
    /// present is itself reported (info) and the identity skipped.
    fn cash_flow(&self, rows: &[FinancialRow], ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        for row in rows {
            let components = (
                row.net_operating_cash_flow,
                row.net_investing_cash_flow,
                row.net_financing_cash_flow,
            );
            let (Some(cfo), Some(cfi), Some(cff)) = components else {
                continue;
            };
            let expected = cfo + cfi + cff;
            match row.net_cash_flow {
                None => {
                    out.push(self.anomaly(
                        ctx,
                        Severity::Info,
                        row,
                        "net_cash_flow",
                        "net cash flow missing while components are present".to_string(),
                        0.0,
                        expected,
                    ));
                }
                Some(ncf) => {
                    let diff = ncf - expected;
                    if diff.abs() > tolerance(expected, 0.05, 1e9) {
                        out.push(self.anomaly(
                            ctx,
                            Severity::Warning,
                            row,
                            "net_cash_flow=cfo+cfi+cff",
                            "net cash flow does not equal the sum of CFO, CFI and CFF"
                                .to_string(),
                            diff,
                            expected,
                        ));
                    }
                }
            }
        }
    }

    /// Total deposit = current + savings + time deposits.
    fn deposits(&self, rows: &[FinancialRow], ctx: &RuleContext, out: &mut Vec<Anomaly>) {
        for row in rows {
            let Some(total) = row.total_deposit else {
                continue;
            };
            if row.current_account.is_none()
                && row.savings_account.is_none()
                && row.time_deposit.is_none()
            {
                continue;
            }
            let components = row.current_account.unwrap_or(0.0)
                + row.savings_account.unwrap_or(0.0)
                + row.time_deposit.unwrap_or(0.0);
            let diff = total - components;
            if diff.abs() > tolerance(total, 0.03, 1e9) {
                out.push(self.anomaly(
                    ctx,
                    Severity::Info,
                    row,
                    "total_deposit=casa+time_deposit",
                    "total deposit does not equal the sum of its components".to_string(),
                    diff,
                    components,
                ));
            }
        }
    }
}

impl Rule for AccountingIdentityRule {
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
        self.balance_sheet(rows, ctx, &mut anomalies);
        self.net_loan(rows, ctx, &mut anomalies);
        self.pre_tax(rows, ctx, &mut anomalies);
        self.cash_flow(rows, ctx, &mut anomalies);
        self.deposits(rows, ctx, &mut anomalies);
        Ok(anomalies)
    }
}

#[cfg(test)]
pub(crate) fn padding_rows(n: usize) -> Vec<FinancialRow> {
    use crate::testkit::fin_row;
    (0..n)
        .map(|i| fin_row(&format!("PAD{i}.JK"), "2023-12-31"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ctx_for, fin_row};

    fn ctx() -> RuleContext {
        ctx_for("2020-01-01", "2024-12-31")
    }

    fn balance_row(symbol: &str, assets: f64, liabilities: f64, equity: f64) -> FinancialRow {
        let mut row = fin_row(symbol, "2023-12-31");
        row.total_assets = Some(assets);
        row.total_liabilities = Some(liabilities);
        row.total_equity = Some(equity);
        row
    }

    #[test]
    fn broken_balance_sheet_is_graded_by_gap() {
        // 20% gap → critical.
        let mut rows = padding_rows(10);
        rows.push(balance_row("BMRI.JK", 1.0e13, 6.0e12, 2.0e12));
        let slice = DataSlice::AnnualFinancials(rows);
        let found = AccountingIdentityRule.evaluate(&slice, &ctx()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Critical);
        assert_eq!(found[0].entity.as_deref(), Some("BMRI.JK"));
    }

    #[test]
    fn islamic_banks_are_exempt_from_balance_sheet() {
        let mut rows = padding_rows(10);
        rows.push(balance_row("BRIS.JK", 1.0e13, 6.0e12, 2.0e12));
        let slice = DataSlice::AnnualFinancials(rows);
        let found = AccountingIdentityRule.evaluate(&slice, &ctx()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn thin_slices_are_skipped() {
        let rows = vec![balance_row("BMRI.JK", 1.0e13, 6.0e12, 2.0e12)];
        let slice = DataSlice::AnnualFinancials(rows);
        let found = AccountingIdentityRule.evaluate(&slice, &ctx()).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn missing_cash_flow_total_is_reported_as_info() {
        let mut row = fin_row("ASII.JK", "2023-12-31");
        row.net_operating_cash_flow = Some(5.0e12);
        row.net_investing_cash_flow = Some(-2.0e12);
        row.net_financing_cash_flow = Some(-1.0e12);
        row.net_cash_flow = None;

        let mut rows = padding_rows(10);
        rows.push(row);
        let slice = DataSlice::AnnualFinancials(rows);
        let found = AccountingIdentityRule.evaluate(&slice, &ctx()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Info);
        assert!(found[0].message.contains("missing"));
    }

    #[test]
    fn consistent_statements_pass() {
        let mut row = balance_row("BBCA.JK", 1.0e13, 6.0e12, 4.0e12);
        row.net_operating_cash_flow = Some(5.0e12);
        row.net_investing_cash_flow = Some(-2.0e12);
        row.net_financing_cash_flow = Some(-1.0e12);
        row.net_cash_flow = Some(2.0e12);

        let mut rows = padding_rows(10);
        rows.push(row);
        let slice = DataSlice::AnnualFinancials(rows);
        let found = AccountingIdentityRule.evaluate(&slice, &ctx()).unwrap();
        assert!(found.is_empty());
    }
}
