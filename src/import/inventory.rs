//! Inventory sheet (kartu persediaan export)

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::io;

use crate::import::{cell, clean_rupiah, parse_quantity, read_records, ImportOptions};
use crate::types::*;

const DAY_COL: usize = 2;
const IN_QTY_COL: usize = 4;
const IN_COST_COL: usize = 5;
const OUT_QTY_COL: usize = 7;
const OUT_COST_COL: usize = 8;

/// Parse stock movements.
///
/// The sheet is a series of blocks. An item header row has "ITEM" in column 1
/// and a "Kode" cell followed by the product code; the code is mapped to a
/// product id through `options.product_codes`. Data rows below it have a
/// numeric day in column 2, received quantity and cost in columns 4 and 5,
/// and issued quantity and cost in columns 7 and 8. Rows under an unmapped
/// item are skipped.
pub fn parse_inventory<R: io::Read>(
    reader: R,
    options: &ImportOptions,
) -> LedgerResult<Vec<InventoryMovement>> {
    let records = read_records(reader, options, options.inventory_skip_rows)?;
    let zero = BigDecimal::from(0);

    let mut product_id: Option<i64> = None;
    let mut movements = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if cell(record, 1).contains("ITEM") {
            product_id = product_code(record).and_then(|code| {
                let id = options.product_codes.get(code).copied();
                if id.is_none() {
                    tracing::warn!(product_code = code, "inventory item without a product mapping");
                }
                id
            });
            continue;
        }

        let Some(product) = product_id else {
            continue;
        };
        let day = cell(record, DAY_COL);
        if day.is_empty() || !day.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let Some(date) = day
            .parse::<u32>()
            .ok()
            .and_then(|d| NaiveDate::from_ymd_opt(options.default_year, options.default_month, d))
        else {
            tracing::warn!(row = index, day = day, "inventory row with an invalid day skipped");
            continue;
        };

        let qty_in = parse_quantity(cell(record, IN_QTY_COL));
        if qty_in > zero {
            movements.push(InventoryMovement::receipt(
                product,
                date,
                qty_in,
                clean_rupiah(cell(record, IN_COST_COL)),
                format!("IMP-IN-{}", index),
            ));
        }

        let qty_out = parse_quantity(cell(record, OUT_QTY_COL));
        if qty_out > zero {
            movements.push(InventoryMovement::issue(
                product,
                date,
                qty_out,
                clean_rupiah(cell(record, OUT_COST_COL)),
                format!("IMP-OUT-{}", index),
            ));
        }
    }

    tracing::info!(movements = movements.len(), "inventory movements parsed");
    Ok(movements)
}

/// Value of the cell right after the first "Kode" cell
fn product_code(record: &[String]) -> Option<&str> {
    let position = record.iter().position(|c| c.contains("Kode"))?;
    record
        .get(position + 1)
        .map(|code| code.trim())
        .filter(|code| !code.is_empty())
}
