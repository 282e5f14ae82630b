//! Parsers for the bookkeeping spreadsheet exports: chart of accounts,
//! general journal and inventory movements.
//!
//! Each parser reads delimited text and returns values ready to seed or post;
//! nothing here writes to storage.

pub mod coa;
pub mod inventory;
pub mod journal;
pub mod number;

pub use coa::parse_chart;
pub use inventory::parse_inventory;
pub use journal::parse_general_journal;
pub use number::{clean_rupiah, parse_quantity};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;

use crate::types::*;

/// Layout of the spreadsheet exports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Field delimiter, ';' or ','
    pub delimiter: u8,
    /// Title and header lines before the first chart row
    pub chart_skip_rows: usize,
    /// Title and header lines before the first journal row
    pub journal_skip_rows: usize,
    /// Title lines before the first inventory row
    pub inventory_skip_rows: usize,
    /// Year for journal and inventory rows, which only carry a day
    pub default_year: i32,
    pub default_month: u32,
    /// Product code on the inventory sheet to catalog product id
    pub product_codes: HashMap<String, i64>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        let product_codes = [("A01", 1), ("A02", 2), ("B01", 3), ("B02", 4), ("C01", 5), ("C02", 6)]
            .into_iter()
            .map(|(code, id)| (code.to_string(), id))
            .collect();
        Self {
            delimiter: b';',
            chart_skip_rows: 5,
            journal_skip_rows: 6,
            inventory_skip_rows: 5,
            default_year: 2025,
            default_month: 11,
            product_codes,
        }
    }
}

impl ImportOptions {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Read every record after `skip` lines as plain string rows
pub(crate) fn read_records<R: io::Read>(
    reader: R,
    options: &ImportOptions,
    skip: usize,
) -> LedgerResult<Vec<Vec<String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in csv_reader.records().skip(skip) {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.trim().to_string()).collect());
    }
    Ok(rows)
}

/// Cell at `index`, empty when the row is short
pub(crate) fn cell(row: &[String], index: usize) -> &str {
    row.get(index).map(String::as_str).unwrap_or("")
}
