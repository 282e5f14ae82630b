//! Shopping cart owned by the buyer's session

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub name: String,
    pub unit_price: BigDecimal,
    pub quantity: i64,
}

impl CartLine {
    pub fn sub_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product; adding one already in the cart raises its quantity
    pub fn add(&mut self, product: &Product, quantity: i64) -> LedgerResult<()> {
        if quantity <= 0 {
            return Err(LedgerError::Validation(format!(
                "Quantity for '{}' must be positive",
                product.name
            )));
        }

        match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price.clone(),
                quantity,
            }),
        }
        Ok(())
    }

    /// Set a line's quantity; zero or less removes the line
    pub fn set_quantity(&mut self, product_id: i64, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id);
        } else if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn remove(&mut self, product_id: i64) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn total(&self) -> BigDecimal {
        self.lines.iter().map(CartLine::sub_total).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
