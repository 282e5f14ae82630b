//! Chart of accounts sheet

use std::io;

use crate::config::AccountConventions;
use crate::import::{cell, read_records, ImportOptions};
use crate::types::*;

/// Parse code and name from the first two columns.
///
/// Only codes containing a dash are accounts; group headings and blank rows
/// are skipped. Type and normal balance are inferred from the code.
pub fn parse_chart<R: io::Read>(
    reader: R,
    options: &ImportOptions,
    conventions: &AccountConventions,
) -> LedgerResult<Vec<Account>> {
    let rows = read_records(reader, options, options.chart_skip_rows)?;
    let accounts: Vec<Account> = rows
        .iter()
        .filter(|row| cell(row, 0).contains('-'))
        .map(|row| conventions.account(cell(row, 0), cell(row, 1)))
        .collect();

    tracing::info!(accounts = accounts.len(), "chart of accounts parsed");
    Ok(accounts)
}
