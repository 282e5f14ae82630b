//! Applying payment notifications to orders and the books

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::PaymentNotification;
use crate::ledger::transaction::{patterns, SalesJournalParams};
use crate::ledger::Ledger;
use crate::traits::*;
use crate::types::*;

/// Result of handling one notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub order_id: i64,
    pub status: OrderStatus,
    /// Whether this notification posted the sales journal
    pub journal_recorded: bool,
}

/// Handle a payment notification.
///
/// A paid status posts the sales journal (once per order) before the order
/// status and gateway transaction id are updated, so a failed posting leaves
/// the order untouched and the gateway's retry can try again.
pub async fn process_notification<S: LedgerStorage + Clone>(
    ledger: &mut Ledger<S>,
    notification: &PaymentNotification,
    received_on: NaiveDate,
) -> LedgerResult<NotificationOutcome> {
    let order_id = notification.order_id()?;
    let transaction_status = notification.status()?;
    tracing::info!(order_id, status = ?transaction_status, "payment notification received");

    let order = ledger.get_order_required(order_id).await?;

    let journal_recorded = if transaction_status.is_paid() {
        record_sales_journal(ledger, &order, received_on).await?
    } else {
        false
    };

    let status = transaction_status.order_status();
    ledger
        .update_order_status(order_id, &status, notification.transaction_id.as_deref())
        .await?;

    tracing::info!(
        order_id,
        status = status.as_str(),
        journal_recorded,
        "payment notification applied"
    );
    Ok(NotificationOutcome {
        order_id,
        status,
        journal_recorded,
    })
}

/// Post the cash sale and its cost of goods sold for an order together with
/// the issue of the sold stock. Returns false when the order already has a
/// journal entry.
pub async fn record_sales_journal<S: LedgerStorage + Clone>(
    ledger: &mut Ledger<S>,
    order: &Order,
    date: NaiveDate,
) -> LedgerResult<bool> {
    if let Some(existing) = ledger.find_journal_by_order(order.id).await? {
        tracing::info!(order_id = order.id, journal_id = existing.id, "sales journal already posted");
        return Ok(false);
    }

    let items = ledger.get_order_items(order.id).await?;
    let mut cost = BigDecimal::from(0);
    let mut movements = Vec::with_capacity(items.len());
    for item in &items {
        let unit_cost = match ledger.get_product(item.product_id).await? {
            Some(product) => product.cost_price.unwrap_or_else(|| BigDecimal::from(0)),
            None => {
                tracing::warn!(
                    order_id = order.id,
                    product_id = item.product_id,
                    "ordered product missing from the catalog, costed at zero"
                );
                BigDecimal::from(0)
            }
        };
        let quantity = BigDecimal::from(item.quantity);
        cost += &quantity * &unit_cost;
        movements.push(InventoryMovement::issue(
            item.product_id,
            date,
            quantity,
            unit_cost,
            format!("SO-{}", order.id),
        ));
    }

    let conventions = ledger.conventions().clone();
    let draft = patterns::sales_journal(SalesJournalParams {
        date,
        order_id: order.id,
        user_id: order.user_id.clone(),
        cash_account: conventions.cash_account,
        revenue_account: conventions.revenue_account,
        cogs_account: conventions.cogs_account,
        inventory_account: conventions.inventory_account,
        revenue: order.total_amount.clone(),
        cost,
    })?;

    let (entry, issued) = ledger.post_journal_with_movements(&draft, &movements).await?;
    tracing::info!(
        order_id = order.id,
        journal_id = entry.id,
        movements = issued.len(),
        "sales journal and stock issue recorded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::Cart;
    use crate::utils::MemoryStorage;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 12).unwrap()
    }

    fn lobster(id: i64, cost_price: Option<i64>) -> Product {
        Product {
            id,
            name: format!("Lobster {}", id),
            description: String::new(),
            price: BigDecimal::from(100_000),
            cost_price: cost_price.map(BigDecimal::from),
            inventory_account_code: "1-1300".to_string(),
            hpp_account_code: "5-1100".to_string(),
        }
    }

    async fn ledger_with_order() -> (Ledger<MemoryStorage>, String) {
        let mut ledger = Ledger::new(MemoryStorage::new());
        ledger.setup_storefront_chart().await.unwrap();
        ledger.save_product(&lobster(1, Some(60_000))).await.unwrap();
        ledger.save_product(&lobster(2, None)).await.unwrap();

        let mut cart = Cart::new();
        cart.add(&lobster(1, Some(60_000)), 2).unwrap();
        cart.add(&lobster(2, None), 1).unwrap();
        let checkout = ledger
            .checkout(&cart, "Jl. Pantai 1", Some("u-1".to_string()), day().and_hms_opt(9, 0, 0).unwrap())
            .await
            .unwrap();
        (ledger, checkout.gateway_order_id)
    }

    fn notification(order_id: &str, status: &str) -> PaymentNotification {
        PaymentNotification {
            order_id: Some(order_id.to_string()),
            transaction_status: Some(status.to_string()),
            transaction_id: Some("trx-1".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_settlement_posts_sales_journal() {
        let (mut ledger, gateway_id) = ledger_with_order().await;
        let outcome = process_notification(&mut ledger, &notification(&gateway_id, "settlement"), day())
            .await
            .unwrap();
        assert!(outcome.journal_recorded);
        assert_eq!(outcome.status, OrderStatus::Settle);

        let entry = ledger.find_journal_by_order(outcome.order_id).await.unwrap().unwrap();
        assert_eq!(entry.user_id.as_deref(), Some("u-1"));
        let lines = ledger.get_journal_lines(entry.id).await.unwrap();
        assert_eq!(lines.len(), 4);

        let tb = ledger.trial_balance(&ReportPeriod::all()).await.unwrap();
        assert_eq!(tb.balance_of("1-1100"), BigDecimal::from(300_000));
        assert_eq!(tb.balance_of("4-1100"), BigDecimal::from(300_000));
        // only product 1 has a cost price
        assert_eq!(tb.balance_of("5-1100"), BigDecimal::from(120_000));

        let snapshot = ledger.snapshot().await.unwrap();
        assert_eq!(snapshot.movements.len(), 2);
        assert!(snapshot.movements.iter().all(|m| m.reference_id == format!("SO-{}", outcome.order_id)));

        let order = ledger.get_order_required(outcome.order_id).await.unwrap();
        assert_eq!(order.gateway_transaction_id.as_deref(), Some("trx-1"));
    }

    #[tokio::test]
    async fn test_repeated_settlement_posts_once() {
        let (mut ledger, gateway_id) = ledger_with_order().await;
        let first = process_notification(&mut ledger, &notification(&gateway_id, "capture"), day())
            .await
            .unwrap();
        let second = process_notification(&mut ledger, &notification(&gateway_id, "settlement"), day())
            .await
            .unwrap();
        assert!(first.journal_recorded);
        assert!(!second.journal_recorded);

        let snapshot = ledger.refresh().await.unwrap();
        assert_eq!(snapshot.unbalanced_journals().len(), 0);
        let sales_rows = snapshot.rows.iter().filter(|r| r.account.code == "4-1100").count();
        assert_eq!(sales_rows, 1);
    }

    #[tokio::test]
    async fn test_unpaid_statuses_only_update_order() {
        let (mut ledger, gateway_id) = ledger_with_order().await;
        let outcome = process_notification(&mut ledger, &notification(&gateway_id, "expire"), day())
            .await
            .unwrap();
        assert_eq!(outcome.status, OrderStatus::Failed);
        assert!(!outcome.journal_recorded);
        assert!(ledger.find_journal_by_order(outcome.order_id).await.unwrap().is_none());

        let refund = process_notification(&mut ledger, &notification(&gateway_id, "refund"), day())
            .await
            .unwrap();
        assert_eq!(refund.status, OrderStatus::Other("refund".to_string()));
    }

    /// Memory tables whose next sale write fails
    #[derive(Clone, Default)]
    struct FailingSaleStorage {
        inner: MemoryStorage,
        fail_next: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl LedgerStorage for FailingSaleStorage {
        async fn save_accounts(&mut self, accounts: &[Account]) -> LedgerResult<()> {
            self.inner.save_accounts(accounts).await
        }
        async fn get_account(&self, code: &str) -> LedgerResult<Option<Account>> {
            self.inner.get_account(code).await
        }
        async fn list_accounts(&self, account_type: Option<AccountType>) -> LedgerResult<Vec<Account>> {
            self.inner.list_accounts(account_type).await
        }
        async fn post_journal(&mut self, draft: &JournalDraft) -> LedgerResult<JournalEntry> {
            self.inner.post_journal(draft).await
        }
        async fn post_journals(&mut self, drafts: &[JournalDraft]) -> LedgerResult<Vec<JournalEntry>> {
            self.inner.post_journals(drafts).await
        }
        async fn post_journal_with_movements(
            &mut self,
            draft: &JournalDraft,
            movements: &[InventoryMovement],
        ) -> LedgerResult<(JournalEntry, Vec<InventoryMovement>)> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(LedgerError::Storage("inventory_movements insert failed".to_string()));
            }
            self.inner.post_journal_with_movements(draft, movements).await
        }
        async fn get_journal_entry(&self, journal_id: i64) -> LedgerResult<Option<JournalEntry>> {
            self.inner.get_journal_entry(journal_id).await
        }
        async fn list_journal_entries(&self) -> LedgerResult<Vec<JournalEntry>> {
            self.inner.list_journal_entries().await
        }
        async fn list_journal_lines(&self) -> LedgerResult<Vec<JournalLine>> {
            self.inner.list_journal_lines().await
        }
        async fn find_journal_by_order(&self, order_id: i64) -> LedgerResult<Option<JournalEntry>> {
            self.inner.find_journal_by_order(order_id).await
        }
        async fn record_movements(
            &mut self,
            movements: &[InventoryMovement],
        ) -> LedgerResult<Vec<InventoryMovement>> {
            self.inner.record_movements(movements).await
        }
        async fn list_movements(&self, product_id: Option<i64>) -> LedgerResult<Vec<InventoryMovement>> {
            self.inner.list_movements(product_id).await
        }
        async fn save_product(&mut self, product: &Product) -> LedgerResult<()> {
            self.inner.save_product(product).await
        }
        async fn get_product(&self, product_id: i64) -> LedgerResult<Option<Product>> {
            self.inner.get_product(product_id).await
        }
        async fn list_products(&self) -> LedgerResult<Vec<Product>> {
            self.inner.list_products().await
        }
        async fn create_order(&mut self, order: &Order, items: &[OrderItem]) -> LedgerResult<Order> {
            self.inner.create_order(order, items).await
        }
        async fn get_order(&self, order_id: i64) -> LedgerResult<Option<Order>> {
            self.inner.get_order(order_id).await
        }
        async fn get_order_items(&self, order_id: i64) -> LedgerResult<Vec<OrderItem>> {
            self.inner.get_order_items(order_id).await
        }
        async fn update_order_status(
            &mut self,
            order_id: i64,
            status: &OrderStatus,
            gateway_transaction_id: Option<&str>,
        ) -> LedgerResult<Order> {
            self.inner
                .update_order_status(order_id, status, gateway_transaction_id)
                .await
        }
    }

    #[tokio::test]
    async fn test_failed_sale_write_leaves_nothing_for_retry() {
        let storage = FailingSaleStorage::default();
        let mut ledger = Ledger::new(storage.clone());
        ledger.setup_storefront_chart().await.unwrap();
        ledger.save_product(&lobster(1, Some(60_000))).await.unwrap();

        let mut cart = Cart::new();
        cart.add(&lobster(1, Some(60_000)), 3).unwrap();
        let checkout = ledger
            .checkout(&cart, "Jl. Pantai 1", None, day().and_hms_opt(9, 0, 0).unwrap())
            .await
            .unwrap();
        let order_id = checkout.order.id;

        storage.fail_next.store(true, Ordering::SeqCst);
        let failed = process_notification(
            &mut ledger,
            &notification(&checkout.gateway_order_id, "settlement"),
            day(),
        )
        .await;
        assert!(matches!(failed, Err(LedgerError::Storage(_))));
        assert!(ledger.find_journal_by_order(order_id).await.unwrap().is_none());
        assert!(storage.list_movements(None).await.unwrap().is_empty());
        assert_eq!(
            ledger.get_order_required(order_id).await.unwrap().status,
            OrderStatus::Pending
        );

        // the gateway retries
        let retried = process_notification(
            &mut ledger,
            &notification(&checkout.gateway_order_id, "settlement"),
            day(),
        )
        .await
        .unwrap();
        assert!(retried.journal_recorded);
        let movements = storage.list_movements(Some(1)).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].quantity_change, BigDecimal::from(-3));
        assert_eq!(movements[0].reference_id, format!("SO-{}", order_id));
    }

    #[tokio::test]
    async fn test_unknown_order() {
        let (mut ledger, _) = ledger_with_order().await;
        let result = process_notification(&mut ledger, &notification("999-1", "settlement"), day()).await;
        assert!(matches!(result, Err(LedgerError::OrderNotFound(999))));
    }
}
