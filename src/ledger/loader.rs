//! Ledger loader: pulls every table the reports need and joins journal lines
//! to their entries and accounts.

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::traits::*;
use crate::types::*;

/// One journal line joined to its entry header and account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub journal_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub order_id: Option<i64>,
    pub kind: EntryKind,
    pub account: Account,
    pub debit: BigDecimal,
    pub credit: BigDecimal,
    pub cash_flow_category: Option<CashFlowCategory>,
}

/// Full copy of the books at one point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Chart of accounts sorted by code
    pub accounts: Vec<Account>,
    /// Joined journal lines sorted by date, journal id, and debit amount descending
    pub rows: Vec<LedgerRow>,
    /// Inventory movements in load order
    pub movements: Vec<InventoryMovement>,
    pub products: Vec<Product>,
    pub loaded_at: NaiveDateTime,
}

impl LedgerSnapshot {
    /// A snapshot with no data
    pub fn empty() -> Self {
        Self {
            accounts: Vec::new(),
            rows: Vec::new(),
            movements: Vec::new(),
            products: Vec::new(),
            loaded_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Join the raw tables.
    ///
    /// Lines without a journal entry and lines whose account code is not in
    /// the chart are dropped and logged.
    pub fn assemble(
        mut accounts: Vec<Account>,
        entries: Vec<JournalEntry>,
        lines: Vec<JournalLine>,
        movements: Vec<InventoryMovement>,
        products: Vec<Product>,
    ) -> Self {
        accounts.sort_by(|a, b| a.code.cmp(&b.code));

        let entries: HashMap<i64, JournalEntry> =
            entries.into_iter().map(|e| (e.id, e)).collect();
        let chart: HashMap<&str, &Account> =
            accounts.iter().map(|a| (a.code.as_str(), a)).collect();

        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            let Some(entry) = entries.get(&line.journal_id) else {
                tracing::warn!(
                    journal_id = line.journal_id,
                    account_code = %line.account_code,
                    "dropping journal line without an entry"
                );
                continue;
            };
            let Some(account) = chart.get(line.account_code.trim()) else {
                tracing::warn!(
                    journal_id = line.journal_id,
                    account_code = %line.account_code,
                    "dropping journal line with an unmapped account code"
                );
                continue;
            };

            rows.push(LedgerRow {
                journal_id: entry.id,
                date: entry.effective_date(),
                description: entry.description.clone(),
                order_id: entry.order_id,
                kind: entry.kind,
                account: (*account).clone(),
                debit: line.debit_amount,
                credit: line.credit_amount,
                cash_flow_category: line.cash_flow_category,
            });
        }

        rows.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then(a.journal_id.cmp(&b.journal_id))
                .then(b.debit.cmp(&a.debit))
        });

        Self {
            accounts,
            rows,
            movements,
            products,
            loaded_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Restrict journal rows and inventory movements to a reporting period
    pub fn within(&self, period: &ReportPeriod) -> Self {
        Self {
            accounts: self.accounts.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| period.contains(row.date))
                .cloned()
                .collect(),
            movements: self
                .movements
                .iter()
                .filter(|m| period.contains(m.movement_date))
                .cloned()
                .collect(),
            products: self.products.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Rows of one journal entry kind
    pub fn rows_of_kind(&self, kind: EntryKind) -> impl Iterator<Item = &LedgerRow> {
        self.rows.iter().filter(move |row| row.kind == kind)
    }

    /// Journal ids whose lines do not balance
    pub fn unbalanced_journals(&self) -> Vec<i64> {
        let mut totals: HashMap<i64, BigDecimal> = HashMap::new();
        for row in &self.rows {
            *totals.entry(row.journal_id).or_insert_with(|| BigDecimal::from(0)) +=
                &row.debit - &row.credit;
        }
        let mut unbalanced: Vec<i64> = totals
            .into_iter()
            .filter(|(_, net)| *net != BigDecimal::from(0))
            .map(|(id, _)| id)
            .collect();
        unbalanced.sort_unstable();
        unbalanced
    }
}

/// Loads snapshots from storage and reuses them for a fixed time
pub struct LedgerLoader<S: LedgerStorage> {
    storage: S,
    ttl: Duration,
    cached: Option<(Instant, Arc<LedgerSnapshot>)>,
}

impl<S: LedgerStorage> LedgerLoader<S> {
    /// Create a loader whose snapshots stay fresh for `ttl`
    pub fn new(storage: S, ttl: Duration) -> Self {
        Self {
            storage,
            ttl,
            cached: None,
        }
    }

    /// Current snapshot, reloading when the cached one has expired
    pub async fn snapshot(&mut self) -> LedgerResult<Arc<LedgerSnapshot>> {
        if let Some((loaded, snapshot)) = &self.cached {
            if loaded.elapsed() < self.ttl {
                tracing::debug!("ledger snapshot cache hit");
                return Ok(Arc::clone(snapshot));
            }
        }
        self.refresh().await
    }

    /// Drop the cached snapshot and load a new one
    pub async fn refresh(&mut self) -> LedgerResult<Arc<LedgerSnapshot>> {
        self.invalidate();
        let snapshot = Arc::new(self.load().await?);
        self.cached = Some((Instant::now(), Arc::clone(&snapshot)));
        Ok(snapshot)
    }

    /// Forget the cached snapshot
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|(loaded, _)| loaded.elapsed() < self.ttl)
    }

    async fn load(&self) -> LedgerResult<LedgerSnapshot> {
        let accounts = self.storage.list_accounts(None).await?;
        let entries = self.storage.list_journal_entries().await?;
        let lines = self.storage.list_journal_lines().await?;
        let movements = self.storage.list_movements(None).await?;
        let products = self.storage.list_products().await?;

        tracing::debug!(
            accounts = accounts.len(),
            entries = entries.len(),
            lines = lines.len(),
            movements = movements.len(),
            "ledger reloaded"
        );

        Ok(LedgerSnapshot::assemble(
            accounts, entries, lines, movements, products,
        ))
    }
}
