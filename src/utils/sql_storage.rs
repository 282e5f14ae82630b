//! Relational storage over SQLite with sqlx
//!
//! One table per entity. Multi-row writes (a journal header with its lines,
//! an order with its items, a journal with its stock movements) run inside a
//! single database transaction. Amounts are stored as decimal text so no
//! precision is lost.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

use crate::traits::*;
use crate::types::*;

/// Connection settings for [`SqlStorage`]
///
/// ```rust
/// use lobster_ledger::utils::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("sqlite://books.db")
///     .max_connections(4)
///     .connect_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_connections, 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// SQLite connection string, e.g. "sqlite://lobster-ledger.db"
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("sqlite://lobster-ledger.db")
    }
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS accounts (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        account_type TEXT NOT NULL,
        normal_balance TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS journal_entries (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        transaction_date TEXT,
        description TEXT NOT NULL,
        order_id INTEGER,
        user_id TEXT,
        kind TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_journal_entries_order ON journal_entries(order_id)",
    r#"
    CREATE TABLE IF NOT EXISTS journal_lines (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        journal_id INTEGER NOT NULL REFERENCES journal_entries(id),
        account_code TEXT NOT NULL REFERENCES accounts(code),
        debit_amount TEXT NOT NULL,
        credit_amount TEXT NOT NULL,
        cash_flow_category TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_journal_lines_journal ON journal_lines(journal_id)",
    r#"
    CREATE TABLE IF NOT EXISTS inventory_movements (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id INTEGER NOT NULL,
        movement_date TEXT NOT NULL,
        movement_type TEXT NOT NULL CHECK (movement_type IN ('RECEIPT', 'ISSUE')),
        quantity_change TEXT NOT NULL,
        unit_cost TEXT NOT NULL,
        reference_id TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_inventory_movements_product ON inventory_movements(product_id)",
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        price TEXT NOT NULL,
        cost_price TEXT,
        inventory_account_code TEXT NOT NULL,
        hpp_account_code TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT,
        total_amount TEXT NOT NULL,
        address TEXT NOT NULL,
        status TEXT NOT NULL,
        gateway_transaction_id TEXT,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        order_id INTEGER NOT NULL REFERENCES orders(id),
        product_id INTEGER NOT NULL,
        quantity INTEGER NOT NULL,
        sub_total TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_order_items_order ON order_items(order_id)",
];

const ACCOUNT_COLUMNS: &str = "SELECT code, name, account_type, normal_balance FROM accounts";
const ENTRY_COLUMNS: &str =
    "SELECT id, transaction_date, description, order_id, user_id, kind, created_at FROM journal_entries";
const MOVEMENT_COLUMNS: &str = "SELECT id, product_id, movement_date, movement_type, quantity_change, unit_cost, reference_id FROM inventory_movements";
const PRODUCT_COLUMNS: &str = "SELECT id, name, description, price, cost_price, inventory_account_code, hpp_account_code FROM products";
const ORDER_COLUMNS: &str =
    "SELECT id, user_id, total_amount, address, status, gateway_transaction_id, created_at FROM orders";

/// Storage backed by a SQLite database
///
/// Clones share the connection pool.
#[derive(Debug, Clone)]
pub struct SqlStorage {
    pool: SqlitePool,
}

impl SqlStorage {
    /// Open (creating if missing) the database and make sure every table exists
    pub async fn connect(config: &DatabaseConfig) -> LedgerResult<Self> {
        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "opening books database"
        );

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| LedgerError::Storage(format!("Failed to connect to {}: {}", config.url, e)))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    /// Wrap an existing pool; the schema is created if missing
    pub async fn from_pool(pool: SqlitePool) -> LedgerResult<Self> {
        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn initialize_schema(&self) -> LedgerResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

async fn insert_journal(conn: &mut SqliteConnection, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
    let created_at = now();
    let journal_id = sqlx::query(
        r#"
        INSERT INTO journal_entries (
            transaction_date, description, order_id, user_id, kind, created_at
        ) VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(draft.transaction_date)
    .bind(draft.description.as_str())
    .bind(draft.order_id)
    .bind(draft.user_id.as_deref())
    .bind(entry_kind_name(draft.kind))
    .bind(created_at)
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    for line in &draft.lines {
        sqlx::query(
            r#"
            INSERT INTO journal_lines (
                journal_id, account_code, debit_amount, credit_amount, cash_flow_category
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(journal_id)
        .bind(line.account_code.as_str())
        .bind(line.debit_amount.to_string())
        .bind(line.credit_amount.to_string())
        .bind(line.cash_flow_category.map(cash_flow_name))
        .execute(&mut *conn)
        .await?;
    }

    Ok(JournalEntry {
        id: journal_id,
        transaction_date: draft.transaction_date,
        description: draft.description.clone(),
        order_id: draft.order_id,
        user_id: draft.user_id.clone(),
        kind: draft.kind,
        created_at,
    })
}

async fn insert_movements(
    conn: &mut SqliteConnection,
    movements: &[InventoryMovement],
) -> LedgerResult<Vec<InventoryMovement>> {
    let mut saved = Vec::with_capacity(movements.len());
    for movement in movements {
        let id = sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                product_id, movement_date, movement_type, quantity_change, unit_cost, reference_id
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.movement_date)
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity_change.to_string())
        .bind(movement.unit_cost.to_string())
        .bind(movement.reference_id.as_str())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let mut movement = movement.clone();
        movement.id = id;
        saved.push(movement);
    }
    Ok(saved)
}

#[async_trait]
impl LedgerStorage for SqlStorage {
    async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()> {
        let mut tx = self.pool.begin().await?;
        for account in accounts {
            sqlx::query(
                r#"
                INSERT INTO accounts (code, name, account_type, normal_balance)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(code) DO UPDATE SET
                    name = excluded.name,
                    account_type = excluded.account_type,
                    normal_balance = excluded.normal_balance
                "#,
            )
            .bind(account.code.as_str())
            .bind(account.name.as_str())
            .bind(account.account_type.as_str())
            .bind(entry_type_name(account.normal_balance))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        let sql = format!("{} WHERE code = ?", ACCOUNT_COLUMNS);
        sqlx::query(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| account_from_row(&row))
            .transpose()
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let sql = format!("{} ORDER BY code", ACCOUNT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let mut accounts = Vec::with_capacity(rows.len());
        for row in &rows {
            let account = account_from_row(row)?;
            if account_type.is_none_or(|t| account.account_type == t) {
                accounts.push(account);
            }
        }
        Ok(accounts)
    }

    async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = insert_journal(&mut tx, draft).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>> {
        let mut tx = self.pool.begin().await?;
        let mut entries = Vec::with_capacity(drafts.len());
        for draft in drafts {
            entries.push(insert_journal(&mut tx, draft).await?);
        }
        tx.commit().await?;
        Ok(entries)
    }

    async fn post_journal_with_movements(
        &mut self,
        draft: &JournalDraft,
        movements: &[InventoryMovement],
    ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)> {
        let mut tx = self.pool.begin().await?;
        let entry = insert_journal(&mut tx, draft).await?;
        let saved = insert_movements(&mut tx, movements).await?;
        tx.commit().await?;
        Ok((entry, saved))
    }

    async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>> {
        let sql = format!("{} WHERE id = ?", ENTRY_COLUMNS);
        sqlx::query(&sql)
            .bind(journal_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| entry_from_row(&row))
            .transpose()
    }

    async fn list_journal_entries(&self) -> LedgerResult<Vec<JournalEntry>> {
        let sql = format!("{} ORDER BY id", ENTRY_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn list_journal_lines(&self) -> LedgerResult<Vec<JournalLine>> {
        let rows = sqlx::query(
            r#"
            SELECT journal_id, account_code, debit_amount, credit_amount, cash_flow_category
            FROM journal_lines
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(line_from_row).collect()
    }

    async fn find_journal_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>> {
        let sql = format!("{} WHERE order_id = ? ORDER BY id LIMIT 1", ENTRY_COLUMNS);
        sqlx::query(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| entry_from_row(&row))
            .transpose()
    }

    async fn record_movements(
        &mut self,
        movements: &[InventoryMovement],
    ) -> LedgerResult<Vec<InventoryMovement>> {
        let mut tx = self.pool.begin().await?;
        let saved = insert_movements(&mut tx, movements).await?;
        tx.commit().await?;
        Ok(saved)
    }

    async fn list_movements(&self, product_id: Option<i64>) -> LedgerResult<Vec<InventoryMovement>> {
        let rows = match product_id {
            Some(product_id) => {
                let sql = format!("{} WHERE product_id = ? ORDER BY id", MOVEMENT_COLUMNS);
                sqlx::query(&sql).bind(product_id).fetch_all(&self.pool).await?
            }
            None => {
                let sql = format!("{} ORDER BY id", MOVEMENT_COLUMNS);
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };
        rows.iter().map(movement_from_row).collect()
    }

    async fn save_product(&mut self, product: &Product) -> LedgerResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price, cost_price, inventory_account_code, hpp_account_code
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                price = excluded.price,
                cost_price = excluded.cost_price,
                inventory_account_code = excluded.inventory_account_code,
                hpp_account_code = excluded.hpp_account_code
            "#,
        )
        .bind(product.id)
        .bind(product.name.as_str())
        .bind(product.description.as_str())
        .bind(product.price.to_string())
        .bind(product.cost_price.as_ref().map(|c| c.to_string()))
        .bind(product.inventory_account_code.as_str())
        .bind(product.hpp_account_code.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_product(&self, product_id: i64) -> LedgerResult<Option<Product>> {
        let sql = format!("{} WHERE id = ?", PRODUCT_COLUMNS);
        sqlx::query(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| product_from_row(&row))
            .transpose()
    }

    async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        let sql = format!("{} ORDER BY id", PRODUCT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(product_from_row).collect()
    }

    async fn create_order(&mut self, order: &Order, items: &[OrderItem]) -> LedgerResult<Order> {
        let created_at = now();
        let mut tx = self.pool.begin().await?;
        let order_id = sqlx::query(
            r#"
            INSERT INTO orders (
                user_id, total_amount, address, status, gateway_transaction_id, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.user_id.as_deref())
        .bind(order.total_amount.to_string())
        .bind(order.address.as_str())
        .bind(order.status.as_str())
        .bind(order.gateway_transaction_id.as_deref())
        .bind(created_at)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, sub_total)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.sub_total.to_string())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        let mut order = order.clone();
        order.id = order_id;
        order.created_at = created_at;
        Ok(order)
    }

    async fn get_order(&self, order_id: i64) -> LedgerResult<Option<Order>> {
        let sql = format!("{} WHERE id = ?", ORDER_COLUMNS);
        sqlx::query(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .map(|row| order_from_row(&row))
            .transpose()
    }

    async fn get_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_id, product_id, quantity, sub_total
            FROM order_items
            WHERE order_id = ?
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(item_from_row).collect()
    }

    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: &OrderStatus,
        gateway_transaction_id: Option<&str>,
    ) -> LedgerResult<Order> {
        let updated = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?, gateway_transaction_id = COALESCE(?, gateway_transaction_id)
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(gateway_transaction_id)
        .bind(order_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(LedgerError::OrderNotFound(order_id));
        }
        self.get_order(order_id)
            .await?
            .ok_or(LedgerError::OrderNotFound(order_id))
    }
}

// Column codecs

fn unknown_value(column: &str, raw: &str) -> LedgerError {
    LedgerError::Storage(format!("Unexpected value '{}' in column '{}'", raw, column))
}

fn decimal(row: &SqliteRow, column: &str) -> LedgerResult<BigDecimal> {
    let raw: String = row.try_get(column)?;
    BigDecimal::from_str(raw.trim()).map_err(|_| unknown_value(column, &raw))
}

fn optional_decimal(row: &SqliteRow, column: &str) -> LedgerResult<Option<BigDecimal>> {
    let raw: Option<String> = row.try_get(column)?;
    raw.map(|raw| BigDecimal::from_str(raw.trim()).map_err(|_| unknown_value(column, &raw)))
        .transpose()
}

fn entry_type_name(side: EntryType) -> &'static str {
    match side {
        EntryType::Debit => "Debit",
        EntryType::Credit => "Credit",
    }
}

fn entry_kind_name(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Standard => "Standard",
        EntryKind::Adjusting => "Adjusting",
        EntryKind::Closing => "Closing",
    }
}

fn cash_flow_name(category: CashFlowCategory) -> &'static str {
    match category {
        CashFlowCategory::Operating => "Operating",
        CashFlowCategory::Investing => "Investing",
        CashFlowCategory::Financing => "Financing",
    }
}

fn account_from_row(row: &SqliteRow) -> LedgerResult<Account> {
    let account_type: String = row.try_get("account_type")?;
    let normal_balance: String = row.try_get("normal_balance")?;
    Ok(Account::with_classification(
        row.try_get("code")?,
        row.try_get("name")?,
        match account_type.as_str() {
            "Asset" => AccountType::Asset,
            "Liability" => AccountType::Liability,
            "Equity" => AccountType::Equity,
            "Revenue" => AccountType::Revenue,
            "Expense" => AccountType::Expense,
            other => return Err(unknown_value("account_type", other)),
        },
        match normal_balance.as_str() {
            "Debit" => EntryType::Debit,
            "Credit" => EntryType::Credit,
            other => return Err(unknown_value("normal_balance", other)),
        },
    ))
}

fn entry_from_row(row: &SqliteRow) -> LedgerResult<JournalEntry> {
    let kind: String = row.try_get("kind")?;
    Ok(JournalEntry {
        id: row.try_get("id")?,
        transaction_date: row.try_get("transaction_date")?,
        description: row.try_get("description")?,
        order_id: row.try_get("order_id")?,
        user_id: row.try_get("user_id")?,
        kind: match kind.as_str() {
            "Standard" => EntryKind::Standard,
            "Adjusting" => EntryKind::Adjusting,
            "Closing" => EntryKind::Closing,
            other => return Err(unknown_value("kind", other)),
        },
        created_at: row.try_get("created_at")?,
    })
}

fn line_from_row(row: &SqliteRow) -> LedgerResult<JournalLine> {
    let category: Option<String> = row.try_get("cash_flow_category")?;
    let cash_flow_category = match category.as_deref() {
        None => None,
        Some("Operating") => Some(CashFlowCategory::Operating),
        Some("Investing") => Some(CashFlowCategory::Investing),
        Some("Financing") => Some(CashFlowCategory::Financing),
        Some(other) => return Err(unknown_value("cash_flow_category", other)),
    };
    Ok(JournalLine {
        journal_id: row.try_get("journal_id")?,
        account_code: row.try_get("account_code")?,
        debit_amount: decimal(row, "debit_amount")?,
        credit_amount: decimal(row, "credit_amount")?,
        cash_flow_category,
    })
}

fn movement_from_row(row: &SqliteRow) -> LedgerResult<InventoryMovement> {
    let movement_type: String = row.try_get("movement_type")?;
    Ok(InventoryMovement {
        id: row.try_get("id")?,
        product_id: row.try_get("product_id")?,
        movement_date: row.try_get("movement_date")?,
        movement_type: match movement_type.as_str() {
            "RECEIPT" => MovementType::Receipt,
            "ISSUE" => MovementType::Issue,
            other => return Err(unknown_value("movement_type", other)),
        },
        quantity_change: decimal(row, "quantity_change")?,
        unit_cost: decimal(row, "unit_cost")?,
        reference_id: row.try_get("reference_id")?,
    })
}

fn product_from_row(row: &SqliteRow) -> LedgerResult<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: decimal(row, "price")?,
        cost_price: optional_decimal(row, "cost_price")?,
        inventory_account_code: row.try_get("inventory_account_code")?,
        hpp_account_code: row.try_get("hpp_account_code")?,
    })
}

fn order_from_row(row: &SqliteRow) -> LedgerResult<Order> {
    let status: String = row.try_get("status")?;
    Ok(Order {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        total_amount: decimal(row, "total_amount")?,
        address: row.try_get("address")?,
        status: match status.as_str() {
            "pending" => OrderStatus::Pending,
            "settle" => OrderStatus::Settle,
            "failed" => OrderStatus::Failed,
            _ => OrderStatus::Other(status),
        },
        gateway_transaction_id: row.try_get("gateway_transaction_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn item_from_row(row: &SqliteRow) -> LedgerResult<OrderItem> {
    Ok(OrderItem {
        order_id: row.try_get("order_id")?,
        product_id: row.try_get("product_id")?,
        quantity: row.try_get("quantity")?,
        sub_total: decimal(row, "sub_total")?,
    })
}
