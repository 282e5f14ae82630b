//! Main ledger orchestrator that coordinates the chart, journals, the snapshot
//! cache and the reports

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AccountConventions, BooksConfig};
use crate::ledger::closing::closing_entries;
use crate::ledger::loader::{LedgerLoader, LedgerSnapshot};
use crate::ledger::trial_balance::TrialBalance;
use crate::ledger::worksheet::Worksheet;
use crate::ledger::{ChartManager, JournalManager};
use crate::reports::{CashFlowRules, ReportSet};
use crate::storefront::{Cart, Checkout};
use crate::traits::*;
use crate::types::*;

/// Outcome of posting a batch of imported journal drafts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub posted: usize,
    /// Description and error of every draft that was rejected
    pub rejected: Vec<(String, String)>,
}

/// Main ledger system that orchestrates all bookkeeping operations
pub struct Ledger<S: LedgerStorage> {
    chart: ChartManager<S>,
    journals: JournalManager<S>,
    loader: LedgerLoader<S>,
    storage: S,
    conventions: AccountConventions,
    cash_flow_rules: CashFlowRules,
}

impl<S: LedgerStorage + Clone> Ledger<S> {
    /// Create a new ledger with the given storage backend and default settings
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, &BooksConfig::default())
    }

    /// Create a ledger using the account roles and cache lifetime from config
    pub fn with_config(storage: S, config: &BooksConfig) -> Self {
        Self {
            chart: ChartManager::new(storage.clone(), config.accounts.clone()),
            journals: JournalManager::new(storage.clone()),
            loader: LedgerLoader::new(storage.clone(), config.cache_ttl()),
            storage,
            conventions: config.accounts.clone(),
            cash_flow_rules: CashFlowRules::default(),
        }
    }

    /// Create a new ledger with custom validators
    pub fn with_validators(
        storage: S,
        config: &BooksConfig,
        account_validator: Box<dyn AccountValidator>,
        journal_validator: Box<dyn JournalValidator>,
    ) -> Self {
        Self {
            chart: ChartManager::with_validator(
                storage.clone(),
                config.accounts.clone(),
                account_validator,
            ),
            journals: JournalManager::with_validator(storage.clone(), journal_validator),
            loader: LedgerLoader::new(storage.clone(), config.cache_ttl()),
            storage,
            conventions: config.accounts.clone(),
            cash_flow_rules: CashFlowRules::default(),
        }
    }

    /// Replace the cash flow classification table
    pub fn with_cash_flow_rules(mut self, rules: CashFlowRules) -> Self {
        self.cash_flow_rules = rules;
        self
    }

    pub fn conventions(&self) -> &AccountConventions {
        &self.conventions
    }

    // Chart operations
    /// Create a new account with a type inferred from its code
    pub async fn create_account(&mut self, code: &str, name: &str) -> LedgerResult<Account> {
        let account = self.chart.create_account(code, name).await?;
        self.loader.invalidate();
        Ok(account)
    }

    /// Seed a batch of accounts, e.g. from an imported chart
    pub async fn seed_accounts(&mut self, accounts: Vec<Account>) -> LedgerResult<usize> {
        let count = self.chart.seed_accounts(accounts).await?;
        self.loader.invalidate();
        Ok(count)
    }

    /// Setup the storefront's default chart of accounts
    pub async fn setup_storefront_chart(&mut self) -> LedgerResult<Vec<Account>> {
        let accounts = crate::ledger::account::utils::create_storefront_chart(&mut self.chart).await?;
        self.loader.invalidate();
        Ok(accounts)
    }

    /// Get an account by code
    pub async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        self.chart.get_account(code).await
    }

    /// List all accounts
    pub async fn list_accounts(&self) -> LedgerResult<Vec<Account>> {
        self.chart.list_accounts().await
    }

    // Journal operations
    /// Validate and post a journal draft
    pub async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
        let entry = self.journals.post_journal(draft).await?;
        self.loader.invalidate();
        Ok(entry)
    }

    /// Post several drafts as one unit; nothing is stored if any draft fails
    pub async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>> {
        let entries = self.journals.post_journals(drafts).await?;
        self.loader.invalidate();
        Ok(entries)
    }

    /// Post a journal and the inventory movements it caused as one unit
    pub async fn post_journal_with_movements(
        &mut self,
        draft: &JournalDraft,
        movements: &[InventoryMovement],
    ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)> {
        let posted = self
            .journals
            .post_journal_with_movements(draft, movements)
            .await?;
        self.loader.invalidate();
        Ok(posted)
    }

    /// Post imported drafts one by one; rejected drafts are reported, not fatal
    pub async fn import_journals(&mut self, drafts: Vec<JournalDraft>) -> LedgerResult<ImportSummary> {
        let mut summary = ImportSummary::default();
        for draft in drafts {
            match self.journals.post_journal(&draft).await {
                Ok(_) => summary.posted += 1,
                Err(LedgerError::Storage(message)) => {
                    self.loader.invalidate();
                    return Err(LedgerError::Storage(message));
                }
                Err(err) => {
                    tracing::warn!(description = %draft.description, error = %err, "imported journal rejected");
                    summary.rejected.push((draft.description.clone(), err.to_string()));
                }
            }
        }
        self.loader.invalidate();
        tracing::info!(posted = summary.posted, rejected = summary.rejected.len(), "journal import finished");
        Ok(summary)
    }

    /// Get a journal entry by id
    pub async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>> {
        self.journals.get_journal_entry(journal_id).await
    }

    /// Get the lines of a journal entry
    pub async fn get_journal_lines(&self, journal_id: i64) -> LedgerResult<Vec<JournalLine>> {
        self.journals.get_journal_lines(journal_id).await
    }

    /// The journal entry already posted for a sales order, if any
    pub async fn find_journal_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>> {
        self.journals.find_by_order(order_id).await
    }

    // Catalog, stock and orders
    /// Append inventory movements
    pub async fn record_movements(
        &mut self,
        movements: &[InventoryMovement],
    ) -> LedgerResult<Vec<InventoryMovement>> {
        let saved = self.storage.record_movements(movements).await?;
        self.loader.invalidate();
        Ok(saved)
    }

    pub async fn save_product(&mut self, product: &Product) -> LedgerResult<()> {
        self.storage.save_product(product).await?;
        self.loader.invalidate();
        Ok(())
    }

    pub async fn get_product(&self, product_id: i64) -> LedgerResult<Option<Product>> {
        self.storage.get_product(product_id).await
    }

    pub async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        self.storage.list_products().await
    }

    /// Create a pending order from a cart
    pub async fn checkout(
        &mut self,
        cart: &Cart,
        address: &str,
        user_id: Option<String>,
        now: NaiveDateTime,
    ) -> LedgerResult<Checkout> {
        crate::storefront::checkout(&mut self.storage, cart, address, user_id, now).await
    }

    /// Get an order, failing when it does not exist
    pub async fn get_order_required(&self, order_id: i64) -> LedgerResult<Order> {
        self.storage
            .get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))
    }

    pub async fn get_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
        self.storage.get_order_items(order_id).await
    }

    pub async fn update_order_status(
        &mut self,
        order_id: i64,
        status: &OrderStatus,
        gateway_transaction_id: Option<&str>,
    ) -> LedgerResult<Order> {
        self.storage
            .update_order_status(order_id, status, gateway_transaction_id)
            .await
    }

    // Snapshot and reports
    /// Current ledger snapshot, served from cache while fresh
    pub async fn snapshot(&mut self) -> LedgerResult<Arc<LedgerSnapshot>> {
        self.loader.snapshot().await
    }

    /// Reload the snapshot regardless of the cache
    pub async fn refresh(&mut self) -> LedgerResult<Arc<LedgerSnapshot>> {
        self.loader.refresh().await
    }

    /// Trial balance over every row posted in the period
    pub async fn trial_balance(&mut self, period: &ReportPeriod) -> LedgerResult<TrialBalance> {
        let snapshot = self.snapshot().await?.within(period);
        Ok(TrialBalance::compute(&snapshot.accounts, &snapshot.rows))
    }

    /// Worksheet for the period, split by entry kind
    pub async fn worksheet(&mut self, period: &ReportPeriod) -> LedgerResult<Worksheet> {
        let snapshot = self.snapshot().await?.within(period);
        Ok(Worksheet::from_entry_kinds(&snapshot.accounts, &snapshot.rows))
    }

    /// Every report for the period
    pub async fn generate_reports(&mut self, period: &ReportPeriod) -> LedgerResult<ReportSet> {
        let snapshot = self.snapshot().await?;
        Ok(ReportSet::generate(
            &snapshot,
            &self.conventions,
            &self.cash_flow_rules,
            period,
        ))
    }

    /// Compute and post the closing entries for a period, dated `date`.
    /// The entries are stored together or not at all. Fails if closing
    /// entries were already posted inside the period.
    pub async fn post_closing_entries(
        &mut self,
        period: &ReportPeriod,
        date: NaiveDate,
    ) -> LedgerResult<Vec<JournalEntry>> {
        let snapshot = self.refresh().await?.within(period);
        if snapshot.rows_of_kind(EntryKind::Closing).next().is_some() {
            return Err(LedgerError::Validation(
                "Closing entries were already posted for this period".to_string(),
            ));
        }

        let worksheet = Worksheet::from_entry_kinds(&snapshot.accounts, &snapshot.rows);
        let drafts = closing_entries(&worksheet.adjusted, &self.conventions, date);

        let posted = self.post_journals(&drafts).await?;
        tracing::info!(entries = posted.len(), %date, "closing entries posted");
        Ok(posted)
    }

    /// Validate the integrity of the books for a period
    pub async fn validate_integrity(&mut self, period: &ReportPeriod) -> LedgerResult<LedgerIntegrityReport> {
        let snapshot = self.snapshot().await?;
        let reports = ReportSet::generate(&snapshot, &self.conventions, &self.cash_flow_rules, period);
        let unbalanced_journals = snapshot.within(period).unbalanced_journals();

        let mut issues = Vec::new();

        let trial_balance = &reports.worksheet.adjusted;
        if !trial_balance.is_balanced() {
            issues.push(format!(
                "Trial balance is not balanced: debits = {}, credits = {}",
                trial_balance.total_debit, trial_balance.total_credit
            ));
        }

        let balance_sheet = &reports.balance_sheet;
        let total_liabilities_equity = &balance_sheet.total_liabilities + &balance_sheet.total_equity;
        if !balance_sheet.is_balanced {
            issues.push(format!(
                "Balance sheet is not balanced: assets = {}, liabilities + equity = {}",
                balance_sheet.total_assets, total_liabilities_equity
            ));
        }

        for journal_id in &unbalanced_journals {
            issues.push(format!("Journal {} does not balance", journal_id));
        }

        for card in &reports.inventory_cards {
            if card.lines.iter().any(|l| l.running_quantity < BigDecimal::from(0)) {
                issues.push(format!("Stock of '{}' goes negative", card.product_name));
            }
        }

        Ok(LedgerIntegrityReport {
            period: *period,
            is_valid: issues.is_empty(),
            issues,
            unbalanced_journals,
            trial_balance_total_debits: trial_balance.total_debit.clone(),
            trial_balance_total_credits: trial_balance.total_credit.clone(),
            balance_sheet_total_assets: balance_sheet.total_assets.clone(),
            balance_sheet_total_liabilities_equity: total_liabilities_equity,
        })
    }

    /// The storage backend shared by every manager
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable storage access. Writes made through it bypass the snapshot
    /// cache, so call [`Ledger::refresh`] afterwards.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

/// Report on ledger integrity and validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerIntegrityReport {
    pub period: ReportPeriod,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub unbalanced_journals: Vec<i64>,
    pub trial_balance_total_debits: BigDecimal,
    pub trial_balance_total_credits: BigDecimal,
    pub balance_sheet_total_assets: BigDecimal,
    pub balance_sheet_total_liabilities_equity: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::{patterns, JournalBuilder};
    use crate::utils::memory_storage::MemoryStorage;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    #[tokio::test]
    async fn test_ledger_basic_operations() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();

        let investment = patterns::owner_investment(
            date(1),
            "Setoran modal".to_string(),
            "1-1100",
            "3-1100",
            BigDecimal::from(100_000),
        )
        .unwrap();
        ledger.post_journal(&investment).await.unwrap();

        let tb = ledger.trial_balance(&ReportPeriod::all()).await.unwrap();
        assert_eq!(tb.row("1-1100").unwrap().debit, BigDecimal::from(100_000));
        assert_eq!(tb.row("3-1100").unwrap().credit, BigDecimal::from(100_000));
        assert!(tb.is_balanced());

        let report = ledger.validate_integrity(&ReportPeriod::all()).await.unwrap();
        assert!(report.is_valid, "{:?}", report.issues);
    }

    #[tokio::test]
    async fn test_posting_invalidates_cache() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();
        assert!(ledger.snapshot().await.unwrap().rows.is_empty());

        let expense = patterns::expense_payment(
            date(2),
            "Bayar listrik".to_string(),
            "6-1200",
            "1-1100",
            BigDecimal::from(350),
        )
        .unwrap();
        ledger.post_journal(&expense).await.unwrap();
        assert_eq!(ledger.snapshot().await.unwrap().rows.len(), 2);
    }

    #[tokio::test]
    async fn test_closing_entries_posted_once() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();
        let sale = JournalDraft {
            transaction_date: Some(date(5)),
            description: "Penjualan".to_string(),
            order_id: None,
            user_id: None,
            kind: EntryKind::Standard,
            lines: vec![
                JournalLine::debit("1-1100".to_string(), BigDecimal::from(900)),
                JournalLine::credit("4-1100".to_string(), BigDecimal::from(900)),
            ],
        };
        ledger.post_journal(&sale).await.unwrap();

        let period = ReportPeriod::between(date(1), date(30));
        let posted = ledger.post_closing_entries(&period, date(30)).await.unwrap();
        assert_eq!(posted.len(), 2);
        assert!(posted.iter().all(|e| e.kind == EntryKind::Closing));

        let tb = ledger.trial_balance(&period).await.unwrap();
        assert!(tb.row("4-1100").unwrap().is_zero());
        assert_eq!(tb.balance_of("3-1100"), BigDecimal::from(900));

        assert!(ledger.post_closing_entries(&period, date(30)).await.is_err());
    }

    #[tokio::test]
    async fn test_closing_with_offsetting_revenue() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();
        ledger.create_account("4-1200", "Retur Penjualan").await.unwrap();

        let sale = JournalBuilder::new(date(4), "Penjualan tunai".to_string())
            .debit("1-1100", BigDecimal::from(500))
            .credit("4-1100", BigDecimal::from(500))
            .build()
            .unwrap();
        let sales_return = JournalBuilder::new(date(6), "Retur penjualan".to_string())
            .debit("4-1200", BigDecimal::from(500))
            .credit("1-1100", BigDecimal::from(500))
            .build()
            .unwrap();
        ledger.post_journal(&sale).await.unwrap();
        ledger.post_journal(&sales_return).await.unwrap();

        let posted = ledger
            .post_closing_entries(&ReportPeriod::all(), date(30))
            .await
            .unwrap();
        assert_eq!(posted.len(), 1);

        let tb = ledger.trial_balance(&ReportPeriod::all()).await.unwrap();
        assert!(tb.row("4-1100").unwrap().is_zero());
        assert!(tb.row("4-1200").unwrap().is_zero());
        assert!(tb.row("3-1300").unwrap().is_zero());
        assert!(tb.is_balanced());
    }

    #[tokio::test]
    async fn test_journal_batch_is_all_or_nothing() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();

        let good = patterns::expense_payment(
            date(3),
            "Gaji".to_string(),
            "6-1100",
            "1-1100",
            BigDecimal::from(1000),
        )
        .unwrap();
        let mut unknown = good.clone();
        unknown.lines[0].account_code = "6-9999".to_string();

        let result = ledger.post_journals(&[good.clone(), unknown]).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
        assert!(ledger.refresh().await.unwrap().rows.is_empty());

        let posted = ledger.post_journals(&[good.clone(), good]).await.unwrap();
        assert_eq!(posted.len(), 2);
        assert_eq!(ledger.snapshot().await.unwrap().rows.len(), 4);
    }

    #[tokio::test]
    async fn test_import_reports_rejections() {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();

        let good = patterns::expense_payment(
            date(3),
            "Gaji".to_string(),
            "6-1100",
            "1-1100",
            BigDecimal::from(1000),
        )
        .unwrap();
        let mut unknown = good.clone();
        unknown.description = "Akun salah".to_string();
        unknown.lines[0].account_code = "6-9999".to_string();

        let summary = ledger.import_journals(vec![good, unknown]).await.unwrap();
        assert_eq!(summary.posted, 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].0, "Akun salah");
    }
}
