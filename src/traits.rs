//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;

/// Storage abstraction for the books
///
/// Covers the tables the storefront and the bookkeeping module share: chart of
/// accounts, journal entries and lines, inventory movements, products, orders
/// and order items. Implemented by [`crate::utils::SqlStorage`] over a relational
/// database and by [`crate::utils::MemoryStorage`] in process.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    /// Save accounts, replacing any with the same code
    async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()>;

    /// Get an account by code
    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts, optionally filtered by type
    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>>;

    /// Persist a journal header together with its lines.
    ///
    /// Either both are stored or neither is. Returns the saved header with its
    /// assigned id.
    async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry>;

    /// Persist several drafts as one unit: all of them or none
    async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>>;

    /// Persist a journal together with the inventory movements it caused,
    /// as one unit
    async fn post_journal_with_movements(
        &mut self,
        draft: &JournalDraft,
        movements: &[InventoryMovement],
    ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)>;

    /// Get a journal entry by id
    async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>>;

    /// List every journal entry header
    async fn list_journal_entries(&self) -> LedgerResult<Vec<JournalEntry>>;

    /// List every journal line
    async fn list_journal_lines(&self) -> LedgerResult<Vec<JournalLine>>;

    /// Find the journal entry posted for a sales order, if any
    async fn find_journal_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>>;

    /// Append inventory movements, returning them with assigned ids
    async fn record_movements(
        &mut self,
        movements: &[InventoryMovement],
    ) -> LedgerResult<Vec<InventoryMovement>>;

    /// List inventory movements, optionally for a single product
    async fn list_movements(&self, product_id: Option<i64>) -> LedgerResult<Vec<InventoryMovement>>;

    /// Save a product, replacing any with the same id
    async fn save_product(&mut self, product: &Product) -> LedgerResult<()>;

    /// Get a product by id
    async fn get_product(&self, product_id: i64) -> LedgerResult<Option<Product>>;

    /// List the catalog
    async fn list_products(&self) -> LedgerResult<Vec<Product>>;

    /// Create an order with its items; the order id is assigned by storage
    async fn create_order(&mut self, order: &Order, items: &[OrderItem]) -> LedgerResult<Order>;

    /// Get an order by id
    async fn get_order(&self, order_id: i64) -> LedgerResult<Option<Order>>;

    /// List the items of an order
    async fn get_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>>;

    /// Update order status and the gateway transaction id
    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: &OrderStatus,
        gateway_transaction_id: Option<&str>,
    ) -> LedgerResult<Order>;
}

/// Trait for implementing custom account validation rules
pub trait AccountValidator: Send + Sync {
    /// Validate an account before saving
    fn validate_account(&self, account: &Account) -> LedgerResult<()>;
}

/// Trait for implementing custom journal validation rules
pub trait JournalValidator: Send + Sync {
    /// Validate a journal draft before posting
    fn validate_journal(&self, draft: &JournalDraft) -> LedgerResult<()>;
}

/// Default account validator with basic rules
pub struct DefaultAccountValidator;

impl AccountValidator for DefaultAccountValidator {
    fn validate_account(&self, account: &Account) -> LedgerResult<()> {
        if account.code.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account code cannot be empty".to_string(),
            ));
        }

        if account.name.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Default journal validator with basic double-entry rules
pub struct DefaultJournalValidator;

impl JournalValidator for DefaultJournalValidator {
    fn validate_journal(&self, draft: &JournalDraft) -> LedgerResult<()> {
        draft.validate()?;

        if draft.total_debits() <= bigdecimal::BigDecimal::from(0) {
            return Err(LedgerError::InvalidJournal(
                "Journal total must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
