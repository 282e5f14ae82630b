//! Turning a cart into a pending order

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::gateway::composite_order_id;
use crate::storefront::Cart;
use crate::traits::*;
use crate::types::*;

/// A created order and the id to hand to the payment gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkout {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub gateway_order_id: String,
}

/// Create a pending order from the cart.
///
/// Prices are read from the catalog at checkout time, so a stale cart cannot
/// undercharge. Fails on an empty cart, a blank address, or a product that is
/// no longer in the catalog.
pub async fn checkout<S: LedgerStorage>(
    storage: &mut S,
    cart: &Cart,
    address: &str,
    user_id: Option<String>,
    now: NaiveDateTime,
) -> LedgerResult<Checkout> {
    if cart.is_empty() {
        return Err(LedgerError::Validation("Cart is empty".to_string()));
    }
    if address.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Shipping address cannot be empty".to_string(),
        ));
    }

    let mut items = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let product = storage.get_product(line.product_id).await?.ok_or_else(|| {
            LedgerError::Validation(format!("Product {} is no longer available", line.product_id))
        })?;
        items.push(OrderItem {
            order_id: 0,
            product_id: product.id,
            quantity: line.quantity,
            sub_total: &product.price * bigdecimal::BigDecimal::from(line.quantity),
        });
    }

    let pending = Order {
        id: 0,
        user_id,
        total_amount: items.iter().map(|item| &item.sub_total).sum(),
        address: address.trim().to_string(),
        status: OrderStatus::Pending,
        gateway_transaction_id: None,
        created_at: now,
    };

    let order = storage.create_order(&pending, &items).await?;
    let items = storage.get_order_items(order.id).await?;
    let gateway_order_id = composite_order_id(order.id, now.and_utc().timestamp());

    tracing::info!(
        order_id = order.id,
        total = %order.total_amount,
        gateway_order_id = %gateway_order_id,
        "order created"
    );

    Ok(Checkout {
        order,
        items,
        gateway_order_id,
    })
}
