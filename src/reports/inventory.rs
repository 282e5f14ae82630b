//! Inventory card (kartu persediaan): per-product movements with running
//! quantity and value.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::reports::workbook::{amount, Sheet, ToSheet};
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCardLine {
    pub date: NaiveDate,
    pub movement_type: MovementType,
    pub reference_id: String,
    pub quantity_change: BigDecimal,
    pub unit_cost: BigDecimal,
    pub value_change: BigDecimal,
    pub running_quantity: BigDecimal,
    pub running_value: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryCard {
    pub product_id: i64,
    pub product_name: String,
    pub lines: Vec<InventoryCardLine>,
}

impl InventoryCard {
    /// Card for one product. Movements are ordered by date; same-day
    /// movements keep their load order.
    pub fn for_product(product_id: i64, movements: &[InventoryMovement], products: &[Product]) -> Self {
        let mut own: Vec<&InventoryMovement> = movements
            .iter()
            .filter(|m| m.product_id == product_id)
            .collect();
        own.sort_by_key(|m| m.movement_date);

        let mut running_quantity = BigDecimal::from(0);
        let mut running_value = BigDecimal::from(0);
        let lines = own
            .into_iter()
            .map(|m| {
                let value_change = m.value_change();
                running_quantity += &m.quantity_change;
                running_value += &value_change;
                InventoryCardLine {
                    date: m.movement_date,
                    movement_type: m.movement_type,
                    reference_id: m.reference_id.clone(),
                    quantity_change: m.quantity_change.clone(),
                    unit_cost: m.unit_cost.clone(),
                    value_change,
                    running_quantity: running_quantity.clone(),
                    running_value: running_value.clone(),
                }
            })
            .collect();

        let product_name = products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Self {
            product_id,
            product_name,
            lines,
        }
    }

    /// Cards for every product with movements, by product id
    pub fn build_all(movements: &[InventoryMovement], products: &[Product]) -> Vec<Self> {
        let ids: BTreeSet<i64> = movements.iter().map(|m| m.product_id).collect();
        ids.into_iter()
            .map(|id| Self::for_product(id, movements, products))
            .collect()
    }

    pub fn ending_quantity(&self) -> BigDecimal {
        self.lines
            .last()
            .map(|l| l.running_quantity.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    pub fn ending_value(&self) -> BigDecimal {
        self.lines
            .last()
            .map(|l| l.running_value.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }
}

/// All cards on one sheet, rows tagged with the product name
pub fn inventory_sheet(cards: &[InventoryCard]) -> Sheet {
    let mut sheet = Sheet::new(
        "Kartu Persediaan",
        &[
            "Produk",
            "Tanggal",
            "Jenis",
            "Referensi",
            "Kuantitas",
            "Harga Satuan",
            "Nilai",
            "Saldo Kuantitas",
            "Saldo Nilai",
        ],
    );
    for card in cards {
        sheet.add_rows(card.to_sheet().rows);
    }
    sheet
}

impl ToSheet for InventoryCard {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(&self.product_name, &[]);
        for line in &self.lines {
            sheet.add_row(vec![
                self.product_name.clone(),
                line.date.to_string(),
                line.movement_type.as_str().to_string(),
                line.reference_id.clone(),
                amount(&line.quantity_change),
                amount(&line.unit_cost),
                amount(&line.value_change),
                amount(&line.running_quantity),
                amount(&line.running_value),
            ]);
        }
        sheet
    }
}
