//! In-memory storage implementation for testing and the demo server

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    accounts: BTreeMap<String, Account>,
    journal_entries: BTreeMap<i64, JournalEntry>,
    journal_lines: Vec<JournalLine>,
    movements: Vec<InventoryMovement>,
    products: BTreeMap<i64, Product>,
    orders: BTreeMap<i64, Order>,
    order_items: Vec<OrderItem>,
    next_journal_id: i64,
    next_movement_id: i64,
    next_order_id: i64,
}

impl Tables {
    fn insert_journal(&mut self, draft: &JournalDraft) -> JournalEntry {
        self.next_journal_id += 1;
        let journal_id = self.next_journal_id;

        let entry = JournalEntry {
            id: journal_id,
            transaction_date: draft.transaction_date,
            description: draft.description.clone(),
            order_id: draft.order_id,
            user_id: draft.user_id.clone(),
            kind: draft.kind,
            created_at: now(),
        };

        self.journal_entries.insert(journal_id, entry.clone());
        self.journal_lines
            .extend(draft.lines.iter().cloned().map(|mut line| {
                line.journal_id = journal_id;
                line
            }));
        entry
    }

    fn insert_movements(&mut self, movements: &[InventoryMovement]) -> Vec<InventoryMovement> {
        let mut saved = Vec::with_capacity(movements.len());
        for movement in movements {
            self.next_movement_id += 1;
            let mut movement = movement.clone();
            movement.id = self.next_movement_id;
            self.movements.push(movement.clone());
            saved.push(movement);
        }
        saved
    }
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        *self.write()? = Tables::default();
        Ok(())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LedgerError::Storage("memory tables lock poisoned".to_string()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LedgerError::Storage("memory tables lock poisoned".to_string()))
    }
}

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

#[async_trait]
impl LedgerStorage for MemoryStorage {
    async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()> {
        let mut tables = self.write()?;
        for account in accounts {
            tables
                .accounts
                .insert(account.code.clone(), account.clone());
        }
        Ok(())
    }

    async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
        Ok(self.read()?.accounts.get(code).cloned())
    }

    async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
        let tables = self.read()?;
        Ok(tables
            .accounts
            .values()
            .filter(|account| account_type.is_none_or(|t| account.account_type == t))
            .cloned()
            .collect())
    }

    async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
        Ok(self.write()?.insert_journal(draft))
    }

    async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>> {
        let mut tables = self.write()?;
        Ok(drafts.iter().map(|draft| tables.insert_journal(draft)).collect())
    }

    async fn post_journal_with_movements(
        &mut self,
        draft: &JournalDraft,
        movements: &[InventoryMovement],
    ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)> {
        let mut tables = self.write()?;
        let entry = tables.insert_journal(draft);
        let saved = tables.insert_movements(movements);
        Ok((entry, saved))
    }

    async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>> {
        Ok(self.read()?.journal_entries.get(&journal_id).cloned())
    }

    async fn list_journal_entries(&self) -> LedgerResult<Vec<JournalEntry>> {
        Ok(self.read()?.journal_entries.values().cloned().collect())
    }

    async fn list_journal_lines(&self) -> LedgerResult<Vec<JournalLine>> {
        Ok(self.read()?.journal_lines.clone())
    }

    async fn find_journal_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>> {
        Ok(self
            .read()?
            .journal_entries
            .values()
            .find(|entry| entry.order_id == Some(order_id))
            .cloned())
    }

    async fn record_movements(
        &mut self,
        movements: &[InventoryMovement],
    ) -> LedgerResult<Vec<InventoryMovement>> {
        Ok(self.write()?.insert_movements(movements))
    }

    async fn list_movements(&self, product_id: Option<i64>) -> LedgerResult<Vec<InventoryMovement>> {
        let tables = self.read()?;
        Ok(tables
            .movements
            .iter()
            .filter(|m| product_id.is_none_or(|id| m.product_id == id))
            .cloned()
            .collect())
    }

    async fn save_product(&mut self, product: &Product) -> LedgerResult<()> {
        self.write()?.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn get_product(&self, product_id: i64) -> LedgerResult<Option<Product>> {
        Ok(self.read()?.products.get(&product_id).cloned())
    }

    async fn list_products(&self) -> LedgerResult<Vec<Product>> {
        Ok(self.read()?.products.values().cloned().collect())
    }

    async fn create_order(&mut self, order: &Order, items: &[OrderItem]) -> LedgerResult<Order> {
        let mut tables = self.write()?;
        tables.next_order_id += 1;
        let order_id = tables.next_order_id;

        let mut order = order.clone();
        order.id = order_id;
        order.created_at = now();
        tables.orders.insert(order_id, order.clone());
        tables
            .order_items
            .extend(items.iter().cloned().map(|mut item| {
                item.order_id = order_id;
                item
            }));

        Ok(order)
    }

    async fn get_order(&self, order_id: i64) -> LedgerResult<Option<Order>> {
        Ok(self.read()?.orders.get(&order_id).cloned())
    }

    async fn get_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
        Ok(self
            .read()?
            .order_items
            .iter()
            .filter(|item| item.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn update_order_status(
        &mut self,
        order_id: i64,
        status: &OrderStatus,
        gateway_transaction_id: Option<&str>,
    ) -> LedgerResult<Order> {
        let mut tables = self.write()?;
        let order = tables
            .orders
            .get_mut(&order_id)
            .ok_or(LedgerError::OrderNotFound(order_id))?;
        order.status = status.clone();
        if let Some(transaction_id) = gateway_transaction_id {
            order.gateway_transaction_id = Some(transaction_id.to_string());
        }
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_post_journal_assigns_ids_to_header_and_lines() {
        let mut storage = MemoryStorage::new();
        let mut draft = JournalDraft::new(
            NaiveDate::from_ymd_opt(2025, 11, 2),
            "Setoran modal".to_string(),
        );
        draft.add_line(JournalLine::debit("1-1100".to_string(), BigDecimal::from(1000)));
        draft.add_line(JournalLine::credit("3-1100".to_string(), BigDecimal::from(1000)));

        let first = storage.post_journal(&draft).await.unwrap();
        let second = storage.post_journal(&draft).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let lines = storage.list_journal_lines().await.unwrap();
        assert_eq!(lines.len(), 4);
        assert!(lines[..2].iter().all(|l| l.journal_id == 1));
        assert!(lines[2..].iter().all(|l| l.journal_id == 2));
    }

    #[tokio::test]
    async fn test_journal_with_movements_saved_together() {
        let mut storage = MemoryStorage::new();
        let date = NaiveDate::from_ymd_opt(2025, 11, 12).unwrap();
        let mut draft = JournalDraft::new(Some(date), "Penjualan".to_string());
        draft.order_id = Some(3);
        draft.add_line(JournalLine::debit("1-1100".to_string(), BigDecimal::from(500)));
        draft.add_line(JournalLine::credit("4-1100".to_string(), BigDecimal::from(500)));
        let issue = InventoryMovement::issue(
            1,
            date,
            BigDecimal::from(2),
            BigDecimal::from(100),
            "SO-3".to_string(),
        );

        let (entry, movements) = storage
            .post_journal_with_movements(&draft, &[issue])
            .await
            .unwrap();
        assert_eq!(storage.find_journal_by_order(3).await.unwrap(), Some(entry));
        assert_eq!(movements[0].id, 1);
        assert_eq!(storage.list_movements(Some(1)).await.unwrap(), movements);

        let batch = storage.post_journals(&[draft.clone(), draft]).await.unwrap();
        assert_eq!(batch.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let mut storage = MemoryStorage::new();
        let view = storage.clone();
        storage
            .save_accounts(&[Account::new("1-1100".to_string(), "Kas".to_string())])
            .await
            .unwrap();
        assert!(view.get_account("1-1100").await.unwrap().is_some());

        view.clear().unwrap();
        assert!(storage.list_accounts(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let mut storage = MemoryStorage::new();
        let result = storage
            .update_order_status(42, &OrderStatus::Settle, Some("tx-1"))
            .await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound(42))));
    }
}
