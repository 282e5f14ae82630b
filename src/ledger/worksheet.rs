//! Worksheet (neraca lajur): unadjusted trial balance, adjustments, adjusted
//! trial balance, and the income statement and balance sheet columns.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::ledger::loader::LedgerRow;
use crate::ledger::trial_balance::{TrialBalance, TrialBalanceRow};
use crate::types::*;

/// A debit/credit column pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Columns {
    pub debit: BigDecimal,
    pub credit: BigDecimal,
}

impl Columns {
    pub fn zero() -> Self {
        Self {
            debit: BigDecimal::from(0),
            credit: BigDecimal::from(0),
        }
    }

    fn of(row: &TrialBalanceRow) -> Self {
        Self {
            debit: row.debit.clone(),
            credit: row.credit.clone(),
        }
    }
}

/// One account across the ten worksheet columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorksheetRow {
    pub account: Account,
    pub unadjusted: Columns,
    pub adjustments: Columns,
    pub adjusted: Columns,
    /// Filled for revenue and expense accounts
    pub income_statement: Columns,
    /// Filled for asset, liability and equity accounts
    pub balance_sheet: Columns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worksheet {
    pub unadjusted: TrialBalance,
    pub adjustments: TrialBalance,
    pub adjusted: TrialBalance,
}

impl Worksheet {
    /// Split the rows into adjustments and everything else, then combine.
    ///
    /// Any partition works, e.g. a journal id threshold:
    /// `Worksheet::build(&chart, &rows, |r| r.journal_id >= 10_000)`.
    pub fn build<F>(chart: &[Account], rows: &[LedgerRow], is_adjustment: F) -> Self
    where
        F: Fn(&LedgerRow) -> bool,
    {
        let unadjusted = TrialBalance::compute_where(chart, rows, |row| !is_adjustment(row));
        let adjustments = TrialBalance::compute_where(chart, rows, &is_adjustment);
        let adjusted = unadjusted.combine(&adjustments);
        Self {
            unadjusted,
            adjustments,
            adjusted,
        }
    }

    /// Partition by entry kind; closing entries are left out
    pub fn from_entry_kinds(chart: &[Account], rows: &[LedgerRow]) -> Self {
        let open: Vec<LedgerRow> = rows
            .iter()
            .filter(|row| row.kind != EntryKind::Closing)
            .cloned()
            .collect();
        Self::build(chart, &open, |row| row.kind == EntryKind::Adjusting)
    }

    /// Ten-column rows, one per account in the adjusted trial balance
    pub fn rows(&self) -> Vec<WorksheetRow> {
        self.adjusted
            .rows
            .iter()
            .map(|adjusted| {
                let code = adjusted.account.code.as_str();
                let unadjusted = self.unadjusted.row(code).map(Columns::of).unwrap_or_else(Columns::zero);
                let adjustments = self.adjustments.row(code).map(Columns::of).unwrap_or_else(Columns::zero);
                let adjusted_cols = Columns::of(adjusted);

                let (income_statement, balance_sheet) = if adjusted.account.account_type.is_temporary() {
                    (adjusted_cols.clone(), Columns::zero())
                } else {
                    (Columns::zero(), adjusted_cols.clone())
                };

                WorksheetRow {
                    account: adjusted.account.clone(),
                    unadjusted,
                    adjustments,
                    adjusted: adjusted_cols,
                    income_statement,
                    balance_sheet,
                }
            })
            .collect()
    }

    /// Net income implied by the income statement columns
    pub fn net_income(&self) -> BigDecimal {
        self.rows()
            .iter()
            .map(|row| &row.income_statement.credit - &row.income_statement.debit)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(journal_id: i64, kind: EntryKind, code: &str, debit: i64, credit: i64) -> LedgerRow {
        LedgerRow {
            journal_id,
            date: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
            description: format!("jurnal {}", journal_id),
            order_id: None,
            kind,
            account: Account::new(code.to_string(), code.to_string()),
            debit: BigDecimal::from(debit),
            credit: BigDecimal::from(credit),
            cash_flow_category: None,
        }
    }

    fn chart() -> Vec<Account> {
        ["1-1100", "1-2100", "1-2200", "3-1100", "3-1300", "4-1100", "6-1400"]
            .iter()
            .map(|code| Account::new(code.to_string(), code.to_string()))
            .collect()
    }

    fn ledger_rows() -> Vec<LedgerRow> {
        vec![
            row(1, EntryKind::Standard, "1-1100", 5000, 0),
            row(1, EntryKind::Standard, "3-1100", 0, 5000),
            row(2, EntryKind::Standard, "1-2100", 2000, 0),
            row(2, EntryKind::Standard, "1-1100", 0, 2000),
            row(3, EntryKind::Standard, "1-1100", 800, 0),
            row(3, EntryKind::Standard, "4-1100", 0, 800),
            row(4, EntryKind::Adjusting, "6-1400", 100, 0),
            row(4, EntryKind::Adjusting, "1-2200", 0, 100),
            row(5, EntryKind::Closing, "4-1100", 800, 0),
            row(5, EntryKind::Closing, "3-1300", 0, 800),
        ]
    }

    #[test]
    fn test_worksheet_from_entry_kinds() {
        let ws = Worksheet::from_entry_kinds(&chart(), &ledger_rows());

        assert_eq!(ws.unadjusted.total_debit, BigDecimal::from(5800));
        assert_eq!(ws.adjustments.total_debit, BigDecimal::from(100));
        assert!(ws.adjusted.is_balanced());
        assert_eq!(ws.adjusted.balance_of("4-1100"), BigDecimal::from(800));
        assert_eq!(ws.adjusted.balance_of("3-1300"), BigDecimal::from(0));
        assert_eq!(ws.adjusted.row("1-2200").unwrap().credit, BigDecimal::from(100));
    }

    #[test]
    fn test_ten_columns() {
        let ws = Worksheet::from_entry_kinds(&chart(), &ledger_rows());
        let rows = ws.rows();

        let depreciation = rows.iter().find(|r| r.account.code == "6-1400").unwrap();
        assert_eq!(depreciation.unadjusted, Columns::zero());
        assert_eq!(depreciation.adjustments.debit, BigDecimal::from(100));
        assert_eq!(depreciation.income_statement.debit, BigDecimal::from(100));
        assert_eq!(depreciation.balance_sheet, Columns::zero());

        let cash = rows.iter().find(|r| r.account.code == "1-1100").unwrap();
        assert_eq!(cash.balance_sheet.debit, BigDecimal::from(3800));
        assert_eq!(cash.income_statement, Columns::zero());

        assert_eq!(ws.net_income(), BigDecimal::from(700));
    }

    #[test]
    fn test_threshold_partition() {
        let ws = Worksheet::build(&chart(), &ledger_rows()[..8], |r| r.journal_id >= 4);
        let by_kind = Worksheet::from_entry_kinds(&chart(), &ledger_rows());
        assert_eq!(ws.adjusted, by_kind.adjusted);
    }
}
