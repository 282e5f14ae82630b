//! Trial balance computation

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ledger::loader::LedgerRow;
use crate::types::*;

/// Account balance line of a trial balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account: Account,
    /// Sum of debit amounts posted to the account
    pub total_debit: BigDecimal,
    /// Sum of credit amounts posted to the account
    pub total_credit: BigDecimal,
    /// Debit balance column
    pub debit: BigDecimal,
    /// Credit balance column
    pub credit: BigDecimal,
}

impl TrialBalanceRow {
    /// Build a row from posted totals; the net lands in exactly one column
    pub fn from_totals(account: Account, total_debit: BigDecimal, total_credit: BigDecimal) -> Self {
        let (debit, credit) = split_net(&total_debit - &total_credit);
        Self {
            account,
            total_debit,
            total_credit,
            debit,
            credit,
        }
    }

    /// Balance on the account's normal side
    pub fn balance(&self) -> BigDecimal {
        self.account.signed_balance(&self.debit, &self.credit)
    }

    /// Debit minus credit
    pub fn net(&self) -> BigDecimal {
        &self.debit - &self.credit
    }

    pub fn is_zero(&self) -> bool {
        self.debit == BigDecimal::from(0) && self.credit == BigDecimal::from(0)
    }
}

/// Put a debit-minus-credit net into the debit or credit column
fn split_net(net: BigDecimal) -> (BigDecimal, BigDecimal) {
    if net >= BigDecimal::from(0) {
        (net, BigDecimal::from(0))
    } else {
        (BigDecimal::from(0), -net)
    }
}

/// Trial balance over a set of ledger rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// One row per chart account, sorted by code
    pub rows: Vec<TrialBalanceRow>,
    /// Total of the debit column
    pub total_debit: BigDecimal,
    /// Total of the credit column
    pub total_credit: BigDecimal,
}

impl TrialBalance {
    /// Sum ledger rows per account. Every chart account appears, including
    /// accounts without activity; rows outside the chart are skipped.
    pub fn compute<'a, I>(chart: &[Account], rows: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerRow>,
    {
        let mut totals: BTreeMap<&str, (BigDecimal, BigDecimal)> = chart
            .iter()
            .map(|a| (a.code.as_str(), (BigDecimal::from(0), BigDecimal::from(0))))
            .collect();

        for row in rows {
            match totals.get_mut(row.account.code.as_str()) {
                Some((debit, credit)) => {
                    *debit += &row.debit;
                    *credit += &row.credit;
                }
                None => tracing::warn!(
                    account_code = %row.account.code,
                    journal_id = row.journal_id,
                    "row outside the chart skipped in trial balance"
                ),
            }
        }

        let mut accounts: Vec<&Account> = chart.iter().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        accounts.dedup_by(|a, b| a.code == b.code);

        let rows = accounts
            .into_iter()
            .map(|account| {
                let (debit, credit) = totals
                    .remove(account.code.as_str())
                    .unwrap_or_else(|| (BigDecimal::from(0), BigDecimal::from(0)));
                TrialBalanceRow::from_totals(account.clone(), debit, credit)
            })
            .collect();

        Self::from_rows(rows)
    }

    /// Trial balance of the rows matching a predicate
    pub fn compute_where<F>(chart: &[Account], rows: &[LedgerRow], predicate: F) -> Self
    where
        F: Fn(&LedgerRow) -> bool,
    {
        Self::compute(chart, rows.iter().filter(|row| predicate(*row)))
    }

    /// Trial balance from lines not yet posted, such as closing drafts
    pub fn from_drafts(chart: &[Account], drafts: &[JournalDraft]) -> Self {
        let rows: Vec<LedgerRow> = drafts
            .iter()
            .flat_map(|draft| {
                draft.lines.iter().filter_map(move |line| {
                    let account = chart.iter().find(|a| a.code == line.account_code)?;
                    Some(LedgerRow {
                        journal_id: 0,
                        date: draft.transaction_date.unwrap_or_default(),
                        description: draft.description.clone(),
                        order_id: draft.order_id,
                        kind: draft.kind,
                        account: account.clone(),
                        debit: line.debit_amount.clone(),
                        credit: line.credit_amount.clone(),
                        cash_flow_category: line.cash_flow_category,
                    })
                })
            })
            .collect();
        Self::compute(chart, &rows)
    }

    /// Signed per-account sum of two trial balances.
    ///
    /// Balances add on each account's normal side and the result is split back
    /// into debit and credit columns.
    pub fn combine(&self, other: &TrialBalance) -> TrialBalance {
        let mut merged: BTreeMap<String, TrialBalanceRow> = self
            .rows
            .iter()
            .map(|row| (row.account.code.clone(), row.clone()))
            .collect();

        for row in &other.rows {
            match merged.get_mut(&row.account.code) {
                Some(existing) => {
                    let total_debit = &existing.total_debit + &row.total_debit;
                    let total_credit = &existing.total_credit + &row.total_credit;
                    let (debit, credit) = split_net(existing.net() + row.net());
                    existing.total_debit = total_debit;
                    existing.total_credit = total_credit;
                    existing.debit = debit;
                    existing.credit = credit;
                }
                None => {
                    merged.insert(row.account.code.clone(), row.clone());
                }
            }
        }

        Self::from_rows(merged.into_values().collect())
    }

    fn from_rows(rows: Vec<TrialBalanceRow>) -> Self {
        let total_debit = rows.iter().map(|r| &r.debit).sum();
        let total_credit = rows.iter().map(|r| &r.credit).sum();
        Self {
            rows,
            total_debit,
            total_credit,
        }
    }

    /// Row for an account code
    pub fn row(&self, code: &str) -> Option<&TrialBalanceRow> {
        self.rows.iter().find(|row| row.account.code == code)
    }

    /// Normal-side balance of an account; zero when the code is unknown
    pub fn balance_of(&self, code: &str) -> BigDecimal {
        self.row(code)
            .map(TrialBalanceRow::balance)
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Rows of one account type
    pub fn rows_of_type(&self, account_type: AccountType) -> impl Iterator<Item = &TrialBalanceRow> {
        self.rows
            .iter()
            .filter(move |row| row.account.account_type == account_type)
    }

    /// Whether the debit and credit columns agree
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Chart accounts covered by this trial balance
    pub fn accounts(&self) -> Vec<Account> {
        self.rows.iter().map(|row| row.account.clone()).collect()
    }
}
