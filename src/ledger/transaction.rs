//! Journal posting and management

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;

/// Parameters for a cash sale with its cost of goods sold
pub struct SalesJournalParams {
    pub date: NaiveDate,
    pub order_id: i64,
    pub user_id: Option<String>,
    pub cash_account: String,
    pub revenue_account: String,
    pub cogs_account: String,
    pub inventory_account: String,
    pub revenue: BigDecimal,
    pub cost: BigDecimal,
}

/// Journal manager for handling journal operations
pub struct JournalManager<S: LedgerStorage> {
    storage: S,
    validator: Box<dyn JournalValidator>,
}

impl<S: LedgerStorage> JournalManager<S> {
    /// Create a new journal manager
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultJournalValidator),
        }
    }

    /// Create a new journal manager with custom validator
    pub fn with_validator(storage: S, validator: Box<dyn JournalValidator>) -> Self {
        Self { storage, validator }
    }

    /// Validate a draft and verify all referenced accounts exist
    async fn check(&self, draft: &JournalDraft) -> LedgerResult<()> {
        self.validator.validate_journal(draft)?;

        for line in &draft.lines {
            if self.storage.get_account(&line.account_code).await?.is_none() {
                return Err(LedgerError::AccountNotFound(line.account_code.clone()));
            }
        }
        Ok(())
    }

    /// Post a journal entry with its lines
    pub async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
        self.check(draft).await?;
        let entry = self.storage.post_journal(draft).await?;
        log_posted(&entry, draft);
        Ok(entry)
    }

    /// Post several entries as one unit. Every draft is checked before any
    /// is stored.
    pub async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>> {
        for draft in drafts {
            self.check(draft).await?;
        }
        let entries = self.storage.post_journals(drafts).await?;
        for (entry, draft) in entries.iter().zip(drafts) {
            log_posted(entry, draft);
        }
        Ok(entries)
    }

    /// Post an entry and the stock movements it caused as one unit
    pub async fn post_journal_with_movements(
        &mut self,
        draft: &JournalDraft,
        movements: &[InventoryMovement],
    ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)> {
        self.check(draft).await?;
        let (entry, saved) = self
            .storage
            .post_journal_with_movements(draft, movements)
            .await?;
        log_posted(&entry, draft);
        Ok((entry, saved))
    }

    /// Get a journal entry by id
    pub async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>> {
        self.storage.get_journal_entry(journal_id).await
    }

    /// Get the lines of one journal entry
    pub async fn get_journal_lines(&self, journal_id: i64) -> LedgerResult<Vec<JournalLine>> {
        Ok(self
            .storage
            .list_journal_lines()
            .await?
            .into_iter()
            .filter(|line| line.journal_id == journal_id)
            .collect())
    }

    /// Find the entry already posted for a sales order
    pub async fn find_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>> {
        self.storage.find_journal_by_order(order_id).await
    }
}

fn log_posted(entry: &JournalEntry, draft: &JournalDraft) {
    tracing::info!(
        journal_id = entry.id,
        kind = ?entry.kind,
        order_id = ?entry.order_id,
        amount = %draft.total_debits(),
        "journal posted"
    );
}

/// Journal builder for assembling entries line by line
#[derive(Debug)]
pub struct JournalBuilder {
    draft: JournalDraft,
}

impl JournalBuilder {
    /// Create a new journal builder
    pub fn new(date: NaiveDate, description: String) -> Self {
        Self {
            draft: JournalDraft::new(Some(date), description),
        }
    }

    /// Mark the entry as adjusting or closing
    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.draft.kind = kind;
        self
    }

    /// Link the entry to a sales order
    pub fn order(mut self, order_id: i64) -> Self {
        self.draft.order_id = Some(order_id);
        self
    }

    /// Record who created the entry
    pub fn user(mut self, user_id: Option<String>) -> Self {
        self.draft.user_id = user_id;
        self
    }

    /// Add a debit line
    pub fn debit(mut self, account_code: &str, amount: BigDecimal) -> Self {
        self.draft
            .add_line(JournalLine::debit(account_code.to_string(), amount));
        self
    }

    /// Add a credit line
    pub fn credit(mut self, account_code: &str, amount: BigDecimal) -> Self {
        self.draft
            .add_line(JournalLine::credit(account_code.to_string(), amount));
        self
    }

    /// Tag the most recently added line with a cash flow section
    pub fn cash_flow(mut self, category: CashFlowCategory) -> Self {
        if let Some(line) = self.draft.lines.last_mut() {
            line.cash_flow_category = Some(category);
        }
        self
    }

    /// Add a custom line
    pub fn line(mut self, line: JournalLine) -> Self {
        self.draft.add_line(line);
        self
    }

    /// Lines added so far, for showing running totals while an entry is composed
    pub fn lines(&self) -> &[JournalLine] {
        &self.draft.lines
    }

    /// Drop the most recently added line
    pub fn pop_line(mut self) -> Self {
        self.draft.lines.pop();
        self
    }

    /// Difference between debits and credits added so far
    pub fn imbalance(&self) -> BigDecimal {
        self.draft.total_debits() - self.draft.total_credits()
    }

    /// Build the draft
    pub fn build(self) -> LedgerResult<JournalDraft> {
        self.draft.validate()?;
        Ok(self.draft)
    }
}

/// Common journal patterns
pub mod patterns {
    use super::*;

    /// Cash sale: debit cash, credit revenue; when the goods had a cost,
    /// debit cost of goods sold and credit inventory as well
    pub fn sales_journal(params: SalesJournalParams) -> LedgerResult<JournalDraft> {
        let mut builder = JournalBuilder::new(
            params.date,
            format!("Jurnal Penjualan Tunai Order ID: {}", params.order_id),
        )
        .order(params.order_id)
        .user(params.user_id)
        .debit(&params.cash_account, params.revenue.clone())
        .cash_flow(CashFlowCategory::Operating)
        .credit(&params.revenue_account, params.revenue);

        if params.cost > BigDecimal::from(0) {
            builder = builder
                .debit(&params.cogs_account, params.cost.clone())
                .credit(&params.inventory_account, params.cost);
        }

        builder.build()
    }

    /// Pay an expense in cash
    pub fn expense_payment(
        date: NaiveDate,
        description: String,
        expense_account: &str,
        cash_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .debit(expense_account, amount.clone())
            .credit(cash_account, amount)
            .build()
    }

    /// Owner puts cash into the business
    pub fn owner_investment(
        date: NaiveDate,
        description: String,
        cash_account: &str,
        capital_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .debit(cash_account, amount.clone())
            .cash_flow(CashFlowCategory::Financing)
            .credit(capital_account, amount)
            .build()
    }

    /// Owner takes cash out of the business
    pub fn owner_drawing(
        date: NaiveDate,
        description: String,
        drawings_account: &str,
        cash_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .debit(drawings_account, amount.clone())
            .credit(cash_account, amount)
            .cash_flow(CashFlowCategory::Financing)
            .build()
    }

    /// Buy stock for cash and record the receipt value
    pub fn inventory_purchase(
        date: NaiveDate,
        description: String,
        inventory_account: &str,
        cash_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .debit(inventory_account, amount.clone())
            .credit(cash_account, amount)
            .build()
    }

    /// Period-end depreciation adjustment
    pub fn depreciation_adjustment(
        date: NaiveDate,
        description: String,
        expense_account: &str,
        accumulated_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .kind(EntryKind::Adjusting)
            .debit(expense_account, amount.clone())
            .credit(accumulated_account, amount)
            .build()
    }

    /// Period-end accrual of an unpaid expense
    pub fn accrued_expense_adjustment(
        date: NaiveDate,
        description: String,
        expense_account: &str,
        payable_account: &str,
        amount: BigDecimal,
    ) -> LedgerResult<JournalDraft> {
        JournalBuilder::new(date, description)
            .kind(EntryKind::Adjusting)
            .debit(expense_account, amount.clone())
            .credit(payable_account, amount)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MemoryStorage;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).unwrap()
    }

    fn sale(cost: i64) -> SalesJournalParams {
        SalesJournalParams {
            date: date(),
            order_id: 15,
            user_id: Some("buyer-1".to_string()),
            cash_account: "1-1100".to_string(),
            revenue_account: "4-1100".to_string(),
            cogs_account: "5-1100".to_string(),
            inventory_account: "1-1300".to_string(),
            revenue: BigDecimal::from(250000),
            cost: BigDecimal::from(cost),
        }
    }

    #[test]
    fn test_sales_journal_with_cost() {
        let draft = patterns::sales_journal(sale(160000)).unwrap();
        assert_eq!(draft.lines.len(), 4);
        assert_eq!(draft.order_id, Some(15));
        assert_eq!(draft.total_debits(), BigDecimal::from(410000));
        assert_eq!(
            draft.lines[0].cash_flow_category,
            Some(CashFlowCategory::Operating)
        );
    }

    #[test]
    fn test_sales_journal_without_cost() {
        let draft = patterns::sales_journal(sale(0)).unwrap();
        assert_eq!(draft.lines.len(), 2);
        assert!(draft.is_balanced());
    }

    #[test]
    fn test_builder_tracks_imbalance() {
        let builder = JournalBuilder::new(date(), "Bayar listrik".to_string())
            .debit("6-1200", BigDecimal::from(300))
            .credit("1-1100", BigDecimal::from(200));
        assert_eq!(builder.imbalance(), BigDecimal::from(100));
        assert!(builder.build().is_err());

        let fixed = JournalBuilder::new(date(), "Bayar listrik".to_string())
            .debit("6-1200", BigDecimal::from(300))
            .credit("1-1100", BigDecimal::from(200))
            .pop_line()
            .credit("1-1100", BigDecimal::from(300));
        assert_eq!(fixed.lines().len(), 2);
        assert!(fixed.build().is_ok());
    }

    #[tokio::test]
    async fn test_post_rejects_unknown_account() {
        let mut manager = JournalManager::new(MemoryStorage::new());
        let draft = patterns::expense_payment(
            date(),
            "Gaji".to_string(),
            "6-1100",
            "1-1100",
            BigDecimal::from(1000),
        )
        .unwrap();
        let result = manager.post_journal(&draft).await;
        assert!(matches!(result, Err(LedgerError::AccountNotFound(_))));
    }
}
