//! Cash flow statement (laporan arus kas)

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::AccountConventions;
use crate::ledger::loader::LedgerRow;
use crate::reports::workbook::{amount, Sheet, ToSheet};
use crate::types::*;

/// Maps counterpart account-code prefixes to cash flow sections.
/// The longest matching prefix wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRules {
    rules: Vec<(String, CashFlowCategory)>,
    fallback: CashFlowCategory,
}

impl Default for CashFlowRules {
    fn default() -> Self {
        Self::new(CashFlowCategory::Operating)
            .with_rule("1-2", CashFlowCategory::Investing)
            .with_rule("2-2", CashFlowCategory::Financing)
            .with_rule("3", CashFlowCategory::Financing)
    }
}

impl CashFlowRules {
    /// An empty table; every code falls back to `fallback`
    pub fn new(fallback: CashFlowCategory) -> Self {
        Self {
            rules: Vec::new(),
            fallback,
        }
    }

    pub fn with_rule(mut self, prefix: &str, category: CashFlowCategory) -> Self {
        self.rules.retain(|(p, _)| p != prefix);
        self.rules.push((prefix.to_string(), category));
        self
    }

    pub fn classify(&self, account_code: &str) -> CashFlowCategory {
        self.rules
            .iter()
            .filter(|(prefix, _)| account_code.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, category)| *category)
            .unwrap_or(self.fallback)
    }
}

/// Cash effect of one journal entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowItem {
    pub journal_id: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: CashFlowCategory,
    /// Cash debits less cash credits
    pub amount: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub operating: Vec<CashFlowItem>,
    pub investing: Vec<CashFlowItem>,
    pub financing: Vec<CashFlowItem>,
    pub total_operating: BigDecimal,
    pub total_investing: BigDecimal,
    pub total_financing: BigDecimal,
    pub net_change: BigDecimal,
    /// Cash balance before the period starts
    pub opening_cash: BigDecimal,
    pub closing_cash: BigDecimal,
}

impl CashFlowStatement {
    /// Walk every entry that touches a cash account.
    ///
    /// `rows` is the whole ledger: rows before the period feed the opening
    /// balance and rows inside it become items.
    pub fn generate(
        rows: &[LedgerRow],
        period: &ReportPeriod,
        conventions: &AccountConventions,
        rules: &CashFlowRules,
    ) -> Self {
        let cash_codes = conventions.cash_account_codes();
        let is_cash = |row: &LedgerRow| cash_codes.iter().any(|c| *c == row.account.code);

        let opening_cash: BigDecimal = rows
            .iter()
            .filter(|row| period.precedes(row.date) && is_cash(*row))
            .map(|row| &row.debit - &row.credit)
            .sum();

        // Group the period's rows by entry, keeping first-seen order
        let mut order: Vec<i64> = Vec::new();
        let mut entries: HashMap<i64, Vec<&LedgerRow>> = HashMap::new();
        for row in rows.iter().filter(|row| period.contains(row.date)) {
            entries
                .entry(row.journal_id)
                .or_insert_with(|| {
                    order.push(row.journal_id);
                    Vec::new()
                })
                .push(row);
        }

        let zero = BigDecimal::from(0);
        let mut operating = Vec::new();
        let mut investing = Vec::new();
        let mut financing = Vec::new();

        for journal_id in order {
            let Some(lines) = entries.get(&journal_id) else {
                continue;
            };
            let (cash, others): (Vec<&LedgerRow>, Vec<&LedgerRow>) =
                lines.iter().copied().partition(|row| is_cash(*row));
            if cash.is_empty() {
                continue;
            }

            let movement: BigDecimal = cash.iter().map(|row| &row.debit - &row.credit).sum();
            if movement == zero {
                continue;
            }

            let category = lines
                .iter()
                .find_map(|row| row.cash_flow_category)
                .unwrap_or_else(|| {
                    others
                        .iter()
                        .copied()
                        .fold(None::<&LedgerRow>, |largest, row| match largest {
                            Some(current) if line_amount(current) >= line_amount(row) => Some(current),
                            _ => Some(row),
                        })
                        .map(|row| rules.classify(&row.account.code))
                        .unwrap_or(rules.fallback)
                });

            let item = CashFlowItem {
                journal_id,
                date: lines[0].date,
                description: lines[0].description.clone(),
                category,
                amount: movement,
            };
            match category {
                CashFlowCategory::Operating => operating.push(item),
                CashFlowCategory::Investing => investing.push(item),
                CashFlowCategory::Financing => financing.push(item),
            }
        }

        let total_operating = total(&operating);
        let total_investing = total(&investing);
        let total_financing = total(&financing);
        let net_change = &total_operating + &total_investing + &total_financing;
        let closing_cash = &opening_cash + &net_change;

        Self {
            operating,
            investing,
            financing,
            total_operating,
            total_investing,
            total_financing,
            net_change,
            opening_cash,
            closing_cash,
        }
    }
}

fn total(items: &[CashFlowItem]) -> BigDecimal {
    items.iter().map(|i| &i.amount).sum()
}

fn line_amount(row: &LedgerRow) -> BigDecimal {
    &row.debit + &row.credit
}

impl ToSheet for CashFlowStatement {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new("Laporan Arus Kas", &["Aktivitas", "Tanggal", "Keterangan", "Jumlah"]);
        let sections = [
            (CashFlowCategory::Operating, &self.operating, &self.total_operating),
            (CashFlowCategory::Investing, &self.investing, &self.total_investing),
            (CashFlowCategory::Financing, &self.financing, &self.total_financing),
        ];
        for (category, items, total) in sections {
            for item in items {
                sheet.add_row(vec![
                    category.as_str().to_string(),
                    item.date.to_string(),
                    item.description.clone(),
                    amount(&item.amount),
                ]);
            }
            sheet.add_row(vec![
                format!("Arus Kas Bersih dari Aktivitas {}", category.as_str()),
                String::new(),
                String::new(),
                amount(total),
            ]);
        }
        for (label, value) in [
            ("Kenaikan (Penurunan) Kas", &self.net_change),
            ("Saldo Kas Awal", &self.opening_cash),
            ("Saldo Kas Akhir", &self.closing_cash),
        ] {
            sheet.add_row(vec![label.to_string(), String::new(), String::new(), amount(value)]);
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(journal_id: i64, day: u32, code: &str, debit: i64, credit: i64) -> LedgerRow {
        LedgerRow {
            journal_id,
            date: NaiveDate::from_ymd_opt(2025, 11, day).unwrap(),
            description: format!("jurnal {}", journal_id),
            order_id: None,
            kind: EntryKind::Standard,
            account: Account::new(code.to_string(), code.to_string()),
            debit: BigDecimal::from(debit),
            credit: BigDecimal::from(credit),
            cash_flow_category: None,
        }
    }

    fn ledger() -> Vec<LedgerRow> {
        vec![
            // Owner investment before the period
            row(1, 1, "1-1100", 10000, 0),
            row(1, 1, "3-1100", 0, 10000),
            // Cash sale with cost of goods sold
            row(2, 5, "1-1100", 2500, 0),
            row(2, 5, "4-1100", 0, 2500),
            row(2, 5, "5-1100", 1600, 0),
            row(2, 5, "1-1300", 0, 1600),
            // Equipment purchase
            row(3, 6, "1-2100", 4000, 0),
            row(3, 6, "1-1100", 0, 4000),
            // Bank loan received
            row(4, 7, "1-1100", 3000, 0),
            row(4, 7, "2-2100", 0, 3000),
            // Depreciation, no cash
            row(5, 30, "6-1400", 100, 0),
            row(5, 30, "1-2200", 0, 100),
        ]
    }

    #[test]
    fn test_rules_longest_prefix() {
        let rules = CashFlowRules::default().with_rule("1-21", CashFlowCategory::Operating);
        assert_eq!(rules.classify("1-2100"), CashFlowCategory::Operating);
        assert_eq!(rules.classify("1-2200"), CashFlowCategory::Investing);
        assert_eq!(rules.classify("3-1200"), CashFlowCategory::Financing);
        assert_eq!(rules.classify("6-1100"), CashFlowCategory::Operating);
    }

    #[test]
    fn test_sections_and_opening_cash() {
        let period = ReportPeriod::between(
            NaiveDate::from_ymd_opt(2025, 11, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 30).unwrap(),
        );
        let statement = CashFlowStatement::generate(
            &ledger(),
            &period,
            &AccountConventions::default(),
            &CashFlowRules::default(),
        );

        assert_eq!(statement.opening_cash, BigDecimal::from(10000));
        assert_eq!(statement.total_operating, BigDecimal::from(2500));
        assert_eq!(statement.total_investing, BigDecimal::from(-4000));
        assert_eq!(statement.total_financing, BigDecimal::from(3000));
        assert_eq!(statement.net_change, BigDecimal::from(1500));
        assert_eq!(statement.closing_cash, BigDecimal::from(11500));
        assert_eq!(statement.operating.len(), 1);
    }

    #[test]
    fn test_explicit_tag_wins() {
        let mut rows = ledger();
        rows[6].cash_flow_category = Some(CashFlowCategory::Operating);
        let statement = CashFlowStatement::generate(
            &rows,
            &ReportPeriod::all(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
        );
        assert!(statement.investing.is_empty());
        assert_eq!(statement.financing.len(), 2);
        assert_eq!(statement.closing_cash, BigDecimal::from(11500));
    }
}
