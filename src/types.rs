//! Core types and data structures for the storefront books

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default code of the owner's drawings account, the only debit-normal equity account
pub const DEFAULT_DRAWINGS_ACCOUNT: &str = "3-1200";

/// Account types following standard accounting principles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccountType {
    /// Assets - what the business owns (Kas, Persediaan, Peralatan, etc.)
    Asset,
    /// Liabilities - what the business owes (Utang Usaha, Utang Bank, etc.)
    Liability,
    /// Equity - owner's interest in the business (Modal, Prive, Ikhtisar Laba Rugi)
    Equity,
    /// Revenue - sales and other income
    Revenue,
    /// Expenses - cost of goods sold, operating and other expenses
    Expense,
}

impl AccountType {
    /// Revenue and expense accounts are zeroed by closing entries
    pub fn is_temporary(&self) -> bool {
        matches!(self, AccountType::Revenue | AccountType::Expense)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sides of an entry in double-entry bookkeeping, also used as an account's normal balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryType {
    /// Debit entry - increases Assets and Expenses, decreases Liabilities, Equity, and Revenue
    Debit,
    /// Credit entry - increases Liabilities, Equity, and Revenue, decreases Assets and Expenses
    Credit,
}

impl EntryType {
    pub fn opposite(self) -> Self {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::Debit => f.write_str("Debit"),
            EntryType::Credit => f.write_str("Credit"),
        }
    }
}

/// Infer an account's type and normal balance from its code.
///
/// The first character of the code selects the type: `1` asset, `2` liability,
/// `3` equity, `4` and `8` revenue, anything else expense. The drawings account
/// is the one equity account with a debit normal balance.
pub fn classify_account_code(code: &str, drawings_code: &str) -> (AccountType, EntryType) {
    let code = code.trim();
    match code.chars().next() {
        Some('1') => (AccountType::Asset, EntryType::Debit),
        Some('2') => (AccountType::Liability, EntryType::Credit),
        Some('3') if code == drawings_code.trim() => (AccountType::Equity, EntryType::Debit),
        Some('3') => (AccountType::Equity, EntryType::Credit),
        Some('4') | Some('8') => (AccountType::Revenue, EntryType::Credit),
        _ => (AccountType::Expense, EntryType::Debit),
    }
}

/// Chart of accounts row
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    /// Hierarchical account code, e.g. "1-1100"
    pub code: String,
    /// Human-readable account name
    pub name: String,
    /// Type of account (Asset, Liability, etc.)
    pub account_type: AccountType,
    /// Side on which the balance is conventionally positive
    pub normal_balance: EntryType,
}

impl Account {
    /// Create an account, inferring type and normal balance from the code
    pub fn new(code: String, name: String) -> Self {
        let (account_type, normal_balance) = classify_account_code(&code, DEFAULT_DRAWINGS_ACCOUNT);
        Self::with_classification(code, name, account_type, normal_balance)
    }

    /// Create an account with an explicit classification
    pub fn with_classification(
        code: String,
        name: String,
        account_type: AccountType,
        normal_balance: EntryType,
    ) -> Self {
        Self {
            code: code.trim().to_string(),
            name: name.trim().to_string(),
            account_type,
            normal_balance,
        }
    }

    /// Leading digit of the code
    pub fn prefix(&self) -> Option<char> {
        self.code.chars().next()
    }

    /// Balance on the normal side for the given debit and credit amounts.
    /// Negative when the account sits on its opposite side.
    pub fn signed_balance(&self, debit: &BigDecimal, credit: &BigDecimal) -> BigDecimal {
        match self.normal_balance {
            EntryType::Debit => debit - credit,
            EntryType::Credit => credit - debit,
        }
    }
}

/// What a journal entry is for. Replaces the old convention of treating
/// journal ids above a threshold as adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntryKind {
    /// Ordinary transaction entry
    #[default]
    Standard,
    /// Period-end adjusting entry (depreciation, accruals, stock count)
    Adjusting,
    /// Closing entry moving temporary balances into equity
    Closing,
}

/// Cash flow statement sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CashFlowCategory {
    Operating,
    Investing,
    Financing,
}

impl CashFlowCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CashFlowCategory::Operating => "Operasi",
            CashFlowCategory::Investing => "Investasi",
            CashFlowCategory::Financing => "Pendanaan",
        }
    }
}

/// Saved journal entry header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    /// Date of the transaction, when known
    pub transaction_date: Option<NaiveDate>,
    pub description: String,
    /// Sales order this entry was posted for
    pub order_id: Option<i64>,
    pub user_id: Option<String>,
    pub kind: EntryKind,
    /// When the entry was stored
    pub created_at: NaiveDateTime,
}

impl JournalEntry {
    /// Transaction date, falling back to the day the entry was stored
    pub fn effective_date(&self) -> NaiveDate {
        self.transaction_date
            .unwrap_or_else(|| self.created_at.date())
    }
}

/// Individual line within a journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Owning journal entry; zero until the entry is saved
    pub journal_id: i64,
    /// Account being affected
    pub account_code: String,
    pub debit_amount: BigDecimal,
    pub credit_amount: BigDecimal,
    /// Explicit cash flow section for lines that move cash
    pub cash_flow_category: Option<CashFlowCategory>,
}

impl JournalLine {
    /// Create a debit line
    pub fn debit(account_code: String, amount: BigDecimal) -> Self {
        Self {
            journal_id: 0,
            account_code,
            debit_amount: amount,
            credit_amount: BigDecimal::from(0),
            cash_flow_category: None,
        }
    }

    /// Create a credit line
    pub fn credit(account_code: String, amount: BigDecimal) -> Self {
        Self {
            journal_id: 0,
            account_code,
            debit_amount: BigDecimal::from(0),
            credit_amount: amount,
            cash_flow_category: None,
        }
    }

    /// Side carrying the amount, if exactly one side is non-zero
    pub fn side(&self) -> Option<EntryType> {
        let zero = BigDecimal::from(0);
        match (self.debit_amount != zero, self.credit_amount != zero) {
            (true, false) => Some(EntryType::Debit),
            (false, true) => Some(EntryType::Credit),
            _ => None,
        }
    }
}

/// Unsaved journal entry: header fields plus its lines.
/// Storage persists a draft as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalDraft {
    pub transaction_date: Option<NaiveDate>,
    pub description: String,
    pub order_id: Option<i64>,
    pub user_id: Option<String>,
    pub kind: EntryKind,
    pub lines: Vec<JournalLine>,
}

impl JournalDraft {
    /// Create an empty draft
    pub fn new(transaction_date: Option<NaiveDate>, description: String) -> Self {
        Self {
            transaction_date,
            description,
            order_id: None,
            user_id: None,
            kind: EntryKind::Standard,
            lines: Vec::new(),
        }
    }

    /// Add a line to the draft
    pub fn add_line(&mut self, line: JournalLine) {
        self.lines.push(line);
    }

    /// Calculate total debits
    pub fn total_debits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.debit_amount).sum()
    }

    /// Calculate total credits
    pub fn total_credits(&self) -> BigDecimal {
        self.lines.iter().map(|l| &l.credit_amount).sum()
    }

    /// Check if the draft is balanced (debits = credits)
    pub fn is_balanced(&self) -> bool {
        self.total_debits() == self.total_credits()
    }

    /// Validate the double-entry rules for this draft
    pub fn validate(&self) -> LedgerResult<()> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::InvalidJournal(
                "Journal description cannot be empty".to_string(),
            ));
        }

        if self.lines.len() < 2 {
            return Err(LedgerError::InvalidJournal(
                "Journal must have at least two lines for double-entry bookkeeping".to_string(),
            ));
        }

        let zero = BigDecimal::from(0);
        for line in &self.lines {
            if line.debit_amount < zero || line.credit_amount < zero {
                return Err(LedgerError::InvalidJournal(format!(
                    "Line for account '{}' has a negative amount",
                    line.account_code
                )));
            }
            if line.side().is_none() {
                return Err(LedgerError::InvalidJournal(format!(
                    "Line for account '{}' must carry either a debit or a credit, not both",
                    line.account_code
                )));
            }
        }

        if !self.is_balanced() {
            return Err(LedgerError::InvalidJournal(format!(
                "Journal is not balanced: debits = {}, credits = {}",
                self.total_debits(),
                self.total_credits()
            )));
        }

        Ok(())
    }
}

/// Inventory movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementType {
    Receipt,
    Issue,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Receipt => "RECEIPT",
            MovementType::Issue => "ISSUE",
        }
    }
}

/// Append-only stock movement; running balances are derived, never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryMovement {
    /// Storage sequence number; zero until saved
    pub id: i64,
    pub product_id: i64,
    pub movement_date: NaiveDate,
    pub movement_type: MovementType,
    /// Positive for receipts, negative for issues
    pub quantity_change: BigDecimal,
    pub unit_cost: BigDecimal,
    /// Free-text provenance tag
    pub reference_id: String,
}

impl InventoryMovement {
    /// Stock received at a unit cost
    pub fn receipt(
        product_id: i64,
        movement_date: NaiveDate,
        quantity: BigDecimal,
        unit_cost: BigDecimal,
        reference_id: String,
    ) -> Self {
        Self {
            id: 0,
            product_id,
            movement_date,
            movement_type: MovementType::Receipt,
            quantity_change: quantity.abs(),
            unit_cost,
            reference_id,
        }
    }

    /// Stock issued at a unit cost; the quantity is stored negated
    pub fn issue(
        product_id: i64,
        movement_date: NaiveDate,
        quantity: BigDecimal,
        unit_cost: BigDecimal,
        reference_id: String,
    ) -> Self {
        Self {
            id: 0,
            product_id,
            movement_date,
            movement_type: MovementType::Issue,
            quantity_change: -quantity.abs(),
            unit_cost,
            reference_id,
        }
    }

    /// Signed monetary effect of the movement
    pub fn value_change(&self) -> BigDecimal {
        &self.quantity_change * &self.unit_cost
    }
}

/// Catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Selling price per unit
    pub price: BigDecimal,
    /// Cost per unit, used for cost of goods sold
    pub cost_price: Option<BigDecimal>,
    pub inventory_account_code: String,
    /// Cost of goods sold (HPP) account
    pub hpp_account_code: String,
}

/// Order status, driven by payment gateway notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Settle,
    Failed,
    /// Any other gateway status (refund, partial refund, ...) stored verbatim
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Settle => "settle",
            OrderStatus::Failed => "failed",
            OrderStatus::Other(status) => status,
        }
    }
}

/// Buyer checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<String>,
    pub total_amount: BigDecimal,
    pub address: String,
    pub status: OrderStatus,
    /// Transaction id reported by the payment gateway
    pub gateway_transaction_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub sub_total: BigDecimal,
}

/// Inclusive reporting period; open ends are unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportPeriod {
    /// Period covering every date
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }

    /// True when the date falls before the period starts
    pub fn precedes(&self, date: NaiveDate) -> bool {
        self.start.is_some_and(|start| date < start)
    }
}

/// Errors that can occur in the books
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Invalid journal: {0}")]
    InvalidJournal(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Order not found: {0}")]
    OrderNotFound(i64),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Import error: {0}")]
    Import(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for LedgerError {
    fn from(err: csv::Error) -> Self {
        LedgerError::Import(err.to_string())
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Export(err.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
