//! General journal sheet

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::io;

use crate::import::{cell, clean_rupiah, read_records, ImportOptions};
use crate::types::*;

struct JournalRow {
    date: NaiveDate,
    description: String,
    account_code: String,
    debit: BigDecimal,
    credit: BigDecimal,
}

/// Parse the general journal into drafts.
///
/// Columns 1 to 5 hold day, description, account ref, debit and credit. Day
/// and description carry down to the rows below them; rows without a ref are
/// skipped. Rows are grouped into one draft per (date, description), ordered
/// by date and then description. Groups whose amounts are all zero are dropped.
pub fn parse_general_journal<R: io::Read>(
    reader: R,
    options: &ImportOptions,
) -> LedgerResult<Vec<JournalDraft>> {
    let records = read_records(reader, options, options.journal_skip_rows)?;

    let mut day = String::new();
    let mut description = String::new();
    let mut rows = Vec::new();
    for record in &records {
        if !cell(record, 1).is_empty() {
            day = cell(record, 1).to_string();
        }
        if !cell(record, 2).is_empty() {
            description = cell(record, 2).to_string();
        }

        let account_code = cell(record, 3);
        if account_code.is_empty() {
            continue;
        }

        rows.push(JournalRow {
            date: transaction_date(&day, options),
            description: description.clone(),
            account_code: account_code.to_string(),
            debit: clean_rupiah(cell(record, 4)),
            credit: clean_rupiah(cell(record, 5)),
        });
    }

    let mut groups: BTreeMap<(NaiveDate, String), Vec<JournalRow>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.date, row.description.clone()))
            .or_default()
            .push(row);
    }

    let zero = BigDecimal::from(0);
    let drafts: Vec<JournalDraft> = groups
        .into_iter()
        .filter_map(|((date, description), rows)| {
            let mut draft = JournalDraft::new(Some(date), description);
            for row in rows {
                if row.debit > zero {
                    draft.add_line(JournalLine::debit(row.account_code.clone(), row.debit.clone()));
                }
                if row.credit > zero {
                    draft.add_line(JournalLine::credit(row.account_code, row.credit));
                }
            }
            (!draft.lines.is_empty()).then_some(draft)
        })
        .collect();

    tracing::info!(entries = drafts.len(), "general journal parsed");
    Ok(drafts)
}

/// Date for a day cell such as "5" or "5.0"; an unusable day falls back to the 1st
fn transaction_date(day: &str, options: &ImportOptions) -> NaiveDate {
    let first = || {
        NaiveDate::from_ymd_opt(options.default_year, options.default_month, 1)
            .unwrap_or_default()
    };

    let parsed = day
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 1.0)
        .and_then(|d| NaiveDate::from_ymd_opt(options.default_year, options.default_month, d as u32));

    parsed.unwrap_or_else(|| {
        tracing::debug!(day = day, "unusable day, using the first of the month");
        first()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
JURNAL UMUM;;;;;
PT Lobster Nusantara;;;;;
November 2025;;;;;
;;;;;
;;;;;
No;Day;Description;Ref;Debet;Credit
1;1;Setoran modal awal;1-1100;Rp 50.000.000;
2;;;3-1100;;Rp 50.000.000
3;3.0;Pembelian lobster;1-1300;8.000.000;
4;;;1-1100;;8.000.000
5;;Catatan tanpa ref;;;
6;x;Bayar listrik;6-1200;350.000;
7;;;1-1100;;350.000
8;40;Nol;6-1100;0;0
";

    #[test]
    fn test_parse_general_journal() {
        let drafts = parse_general_journal(SHEET.as_bytes(), &ImportOptions::default()).unwrap();
        assert_eq!(drafts.len(), 3);

        let day = |d| NaiveDate::from_ymd_opt(2025, 11, d);
        // bad day falls back to the 1st and sorts before "Setoran"
        assert_eq!(drafts[0].description, "Bayar listrik");
        assert_eq!(drafts[0].transaction_date, day(1));
        assert_eq!(drafts[1].description, "Setoran modal awal");
        assert_eq!(drafts[1].total_debits(), BigDecimal::from(50_000_000));
        assert!(drafts[1].is_balanced());
        assert_eq!(drafts[2].transaction_date, day(3));
        assert_eq!(drafts[2].lines.len(), 2);
        assert_eq!(drafts[2].lines[1].account_code, "1-1100");
    }
}
