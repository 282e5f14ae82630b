//! General journal listing and per-account general ledger (buku besar)

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ledger::loader::LedgerRow;
use crate::types::*;

/// A line of the general journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralJournalRow {
    pub journal_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub account_code: String,
    pub account_name: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub order_id: Option<i64>,
}

/// Every loaded journal line in ledger order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralJournal {
    pub rows: Vec<GeneralJournalRow>,
}

impl GeneralJournal {
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| GeneralJournalRow {
                    journal_id: row.journal_id,
                    date: row.date,
                    description: row.description.clone(),
                    account_code: row.account.code.clone(),
                    account_name: row.account.name.clone(),
                    debit: row.debit.clone(),
                    credit: row.credit.clone(),
                    order_id: row.order_id,
                })
                .collect(),
        }
    }

    pub fn total_debit(&self) -> BigDecimal {
        self.rows.iter().map(|r| &r.debit).sum()
    }

    pub fn total_credit(&self) -> BigDecimal {
        self.rows.iter().map(|r| &r.credit).sum()
    }
}

/// A posting with the account's balance after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPosting {
    pub journal_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    /// Running balance on the account's normal side
    pub balance: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub account: Account,
    pub postings: Vec<LedgerPosting>,
}

impl AccountLedger {
    /// Balance after the last posting
    pub fn closing_balance(&self) -> BigDecimal {
        self.postings
            .last()
            .map(|p| p.balance.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }
}

/// Postings grouped per account, in chart order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralLedger {
    pub accounts: Vec<AccountLedger>,
}

impl GeneralLedger {
    /// Group rows per chart account. Accounts without postings are omitted.
    pub fn from_rows(chart: &[Account], rows: &[LedgerRow]) -> Self {
        let accounts = chart
            .iter()
            .filter_map(|account| {
                let mut balance = BigDecimal::from(0);
                let postings: Vec<LedgerPosting> = rows
                    .iter()
                    .filter(|row| row.account.code == account.code)
                    .map(|row| {
                        balance += account.signed_balance(&row.debit, &row.credit);
                        LedgerPosting {
                            journal_id: row.journal_id,
                            date: row.date,
                            description: row.description.clone(),
                            debit: row.debit.clone(),
                            credit: row.credit.clone(),
                            balance: balance.clone(),
                        }
                    })
                    .collect();

                (!postings.is_empty()).then(|| AccountLedger {
                    account: account.clone(),
                    postings,
                })
            })
            .collect();

        Self { accounts }
    }

    pub fn account(&self, code: &str) -> Option<&AccountLedger> {
        self.accounts.iter().find(|a| a.account.code == code)
    }
}
