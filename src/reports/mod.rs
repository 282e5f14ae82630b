//! Financial statements and the report workbook.
//!
//! Every report is recomputed from a ledger snapshot; nothing here touches
//! storage.

pub mod balance_sheet;
pub mod cash_flow;
pub mod equity;
pub mod income;
pub mod inventory;
pub mod workbook;

pub use balance_sheet::*;
pub use cash_flow::*;
pub use equity::*;
pub use income::*;
pub use inventory::*;
pub use workbook::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::AccountConventions;
use crate::ledger::closing::{closing_entries, post_closing_trial_balance};
use crate::ledger::general_ledger::{GeneralJournal, GeneralLedger};
use crate::ledger::loader::LedgerSnapshot;
use crate::ledger::trial_balance::TrialBalance;
use crate::ledger::worksheet::Worksheet;
use crate::types::*;

/// An account and its amount on a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLine {
    pub code: String,
    pub name: String,
    pub amount: BigDecimal,
}

impl StatementLine {
    pub fn new(account: &Account, amount: BigDecimal) -> Self {
        Self {
            code: account.code.clone(),
            name: account.name.clone(),
            amount,
        }
    }

    /// Line showing the row's balance on its normal side
    pub fn from_row(row: &crate::ledger::trial_balance::TrialBalanceRow) -> Self {
        Self::new(&row.account, row.balance())
    }

    pub fn total(lines: &[StatementLine]) -> BigDecimal {
        lines.iter().map(|l| &l.amount).sum()
    }
}

/// Every report for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSet {
    pub period: ReportPeriod,
    pub worksheet: Worksheet,
    pub income_statement: IncomeStatement,
    pub equity_statement: EquityStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow: CashFlowStatement,
    /// Closing drafts computed from the adjusted trial balance
    pub closing_entries: Vec<JournalDraft>,
    pub post_closing: TrialBalance,
    pub general_journal: GeneralJournal,
    pub general_ledger: GeneralLedger,
    pub inventory_cards: Vec<InventoryCard>,
}

impl ReportSet {
    /// Compute every report from a snapshot.
    ///
    /// Journal rows and movements are restricted to the period. The balance
    /// sheet is a position at the period end, so it reads every row up to
    /// that date, and the cash flow statement reads earlier rows for its
    /// opening balance.
    pub fn generate(
        snapshot: &LedgerSnapshot,
        conventions: &AccountConventions,
        rules: &CashFlowRules,
        period: &ReportPeriod,
    ) -> Self {
        let scoped = snapshot.within(period);

        let worksheet = Worksheet::from_entry_kinds(&scoped.accounts, &scoped.rows);
        let income_statement = IncomeStatement::from_trial_balance(&worksheet.adjusted);
        let equity_statement = EquityStatement::from_trial_balance(
            &worksheet.adjusted,
            &income_statement.net_income,
            conventions,
        );
        let balance_sheet = if period.start.is_some() {
            position_at(snapshot, period, conventions)
        } else {
            BalanceSheet::from_trial_balance(
                &worksheet.adjusted,
                &equity_statement.closing_capital,
                conventions,
            )
        };
        let cash_flow = CashFlowStatement::generate(&snapshot.rows, period, conventions, rules);

        let closing_date = closing_date(period, &scoped);
        let closing_entries = closing_entries(&worksheet.adjusted, conventions, closing_date);
        let post_closing = post_closing_trial_balance(&worksheet.adjusted, &closing_entries);

        tracing::debug!(
            rows = scoped.rows.len(),
            net_income = %income_statement.net_income,
            "reports generated"
        );

        Self {
            period: *period,
            income_statement,
            equity_statement,
            balance_sheet,
            cash_flow,
            closing_entries,
            post_closing,
            general_journal: GeneralJournal::from_rows(&scoped.rows),
            general_ledger: GeneralLedger::from_rows(&scoped.accounts, &scoped.rows),
            inventory_cards: InventoryCard::build_all(&scoped.movements, &scoped.products),
            worksheet,
        }
    }

    pub fn net_income(&self) -> &BigDecimal {
        &self.income_statement.net_income
    }

    /// Unadjusted trial balance
    pub fn trial_balance(&self) -> &TrialBalance {
        &self.worksheet.unadjusted
    }

    /// One sheet per report
    pub fn to_workbook(&self) -> Workbook {
        let mut workbook = Workbook::new();
        workbook.add_sheet(self.worksheet.unadjusted.to_sheet());
        workbook.add_sheet(self.worksheet.to_sheet());
        workbook.add_sheet(
            self.worksheet
                .adjusted
                .to_sheet()
                .renamed("Neraca Saldo Setelah Penyesuaian"),
        );
        workbook.add_sheet(self.income_statement.to_sheet());
        workbook.add_sheet(self.equity_statement.to_sheet());
        workbook.add_sheet(self.balance_sheet.to_sheet());
        workbook.add_sheet(self.cash_flow.to_sheet());
        workbook.add_sheet(closing_sheet(&self.closing_entries));
        workbook.add_sheet(self.post_closing.to_sheet().renamed("Neraca Saldo Setelah Penutupan"));
        workbook.add_sheet(self.general_journal.to_sheet());
        workbook.add_sheet(self.general_ledger.to_sheet());
        workbook.add_sheet(inventory_sheet(&self.inventory_cards));
        workbook
    }
}

/// Balance sheet over every row up to the period end
fn position_at(
    snapshot: &LedgerSnapshot,
    period: &ReportPeriod,
    conventions: &AccountConventions,
) -> BalanceSheet {
    let to_date = snapshot.within(&ReportPeriod {
        start: None,
        end: period.end,
    });
    let adjusted = Worksheet::from_entry_kinds(&to_date.accounts, &to_date.rows).adjusted;
    let net_income = IncomeStatement::from_trial_balance(&adjusted).net_income;
    let capital = EquityStatement::from_trial_balance(&adjusted, &net_income, conventions).closing_capital;
    BalanceSheet::from_trial_balance(&adjusted, &capital, conventions)
}

/// Period end, else the last dated row, else the load date
fn closing_date(period: &ReportPeriod, scoped: &LedgerSnapshot) -> NaiveDate {
    period
        .end
        .or_else(|| scoped.rows.iter().map(|r| r.date).max())
        .unwrap_or_else(|| scoped.loaded_at.date())
}

impl ToSheet for TrialBalance {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new("Neraca Saldo", &["Kode Akun", "Nama Akun", "Tipe Akun", "Debit", "Kredit"]);
        for row in &self.rows {
            sheet.add_row(vec![
                row.account.code.clone(),
                row.account.name.clone(),
                row.account.account_type.to_string(),
                amount(&row.debit),
                amount(&row.credit),
            ]);
        }
        sheet.add_row(vec![
            "Total".to_string(),
            String::new(),
            String::new(),
            amount(&self.total_debit),
            amount(&self.total_credit),
        ]);
        sheet
    }
}

impl ToSheet for Worksheet {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(
            "Neraca Lajur",
            &[
                "Kode Akun",
                "Nama Akun",
                "NS Debit",
                "NS Kredit",
                "Penyesuaian Debit",
                "Penyesuaian Kredit",
                "NSD Debit",
                "NSD Kredit",
                "Laba Rugi Debit",
                "Laba Rugi Kredit",
                "Neraca Debit",
                "Neraca Kredit",
            ],
        );
        for row in self.rows() {
            let mut cells = vec![row.account.code.clone(), row.account.name.clone()];
            for columns in [
                &row.unadjusted,
                &row.adjustments,
                &row.adjusted,
                &row.income_statement,
                &row.balance_sheet,
            ] {
                cells.push(amount(&columns.debit));
                cells.push(amount(&columns.credit));
            }
            sheet.add_row(cells);
        }
        sheet
    }
}

impl ToSheet for GeneralJournal {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(
            "Jurnal Umum",
            &["Tanggal", "Keterangan", "Kode Akun", "Nama Akun", "Debit", "Kredit", "Order ID"],
        );
        for row in &self.rows {
            sheet.add_row(vec![
                row.date.to_string(),
                row.description.clone(),
                row.account_code.clone(),
                row.account_name.clone(),
                amount(&row.debit),
                amount(&row.credit),
                row.order_id.map(|id| id.to_string()).unwrap_or_default(),
            ]);
        }
        sheet
    }
}

impl ToSheet for GeneralLedger {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new(
            "Buku Besar",
            &["Kode Akun", "Nama Akun", "Tanggal", "Keterangan", "Debit", "Kredit", "Saldo"],
        );
        for ledger in &self.accounts {
            for posting in &ledger.postings {
                sheet.add_row(vec![
                    ledger.account.code.clone(),
                    ledger.account.name.clone(),
                    posting.date.to_string(),
                    posting.description.clone(),
                    amount(&posting.debit),
                    amount(&posting.credit),
                    amount(&posting.balance),
                ]);
            }
        }
        sheet
    }
}

/// Closing drafts, one row per line
pub fn closing_sheet(drafts: &[JournalDraft]) -> Sheet {
    let mut sheet = Sheet::new("Jurnal Penutup", &["Tanggal", "Keterangan", "Kode Akun", "Debit", "Kredit"]);
    for draft in drafts {
        let date = draft.transaction_date.map(|d| d.to_string()).unwrap_or_default();
        for line in &draft.lines {
            sheet.add_row(vec![
                date.clone(),
                draft.description.clone(),
                line.account_code.clone(),
                amount(&line.debit_amount),
                amount(&line.credit_amount),
            ]);
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, d).unwrap()
    }

    fn snapshot() -> LedgerSnapshot {
        let conventions = AccountConventions::default();
        let accounts: Vec<Account> = crate::ledger::account::utils::STOREFRONT_CHART
            .iter()
            .map(|(code, name)| conventions.account(code, name))
            .collect();

        let entry = |id: i64, d: u32, kind: EntryKind| JournalEntry {
            id,
            transaction_date: Some(day(d)),
            description: format!("jurnal {}", id),
            order_id: None,
            user_id: None,
            kind,
            created_at: day(d).and_hms_opt(9, 0, 0).unwrap(),
        };
        let line = |journal_id: i64, code: &str, debit: i64, credit: i64| JournalLine {
            journal_id,
            account_code: code.to_string(),
            debit_amount: BigDecimal::from(debit),
            credit_amount: BigDecimal::from(credit),
            cash_flow_category: None,
        };

        LedgerSnapshot::assemble(
            accounts,
            vec![
                entry(1, 1, EntryKind::Standard),
                entry(2, 3, EntryKind::Standard),
                entry(3, 4, EntryKind::Standard),
                entry(4, 10, EntryKind::Standard),
                entry(5, 30, EntryKind::Adjusting),
            ],
            vec![
                line(1, "1-1100", 50_000, 0),
                line(1, "3-1100", 0, 50_000),
                line(2, "1-1300", 8_000, 0),
                line(2, "1-1100", 0, 8_000),
                line(3, "1-1100", 12_000, 0),
                line(3, "4-1100", 0, 12_000),
                line(3, "5-1100", 5_000, 0),
                line(3, "1-1300", 0, 5_000),
                line(4, "3-1200", 1_000, 0),
                line(4, "1-1100", 0, 1_000),
                line(5, "6-1200", 700, 0),
                line(5, "2-1100", 0, 700),
            ],
            vec![InventoryMovement::receipt(
                1,
                day(3),
                BigDecimal::from(10),
                BigDecimal::from(800),
                "PO-1".to_string(),
            )],
            Vec::new(),
        )
    }

    #[test]
    fn test_statements_tie_together() {
        let reports = ReportSet::generate(
            &snapshot(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
            &ReportPeriod::all(),
        );

        assert!(reports.trial_balance().is_balanced());
        assert!(reports.worksheet.adjusted.is_balanced());
        // 12000 - 5000 - 700
        assert_eq!(reports.net_income(), &BigDecimal::from(6300));
        let equity = &reports.equity_statement;
        assert_eq!(
            reports.net_income(),
            &(&equity.closing_capital - &equity.opening_capital + &equity.drawings)
        );
        assert!(reports.balance_sheet.is_balanced);
        assert_eq!(reports.cash_flow.closing_cash, reports.worksheet.adjusted.balance_of("1-1100"));
        assert!(reports
            .post_closing
            .rows
            .iter()
            .filter(|r| r.account.account_type.is_temporary())
            .all(|r| r.is_zero()));
        assert_eq!(reports.inventory_cards.len(), 1);
    }

    #[test]
    fn test_balance_sheet_is_position_at_period_end() {
        let later = ReportPeriod::between(day(4), day(30));
        let reports = ReportSet::generate(
            &snapshot(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
            &later,
        );

        // the capital contribution on day 1 is outside the period
        assert_eq!(reports.equity_statement.opening_capital, BigDecimal::from(0));

        let sheet = &reports.balance_sheet;
        assert!(sheet.is_balanced);
        // cash 53000 + inventory 3000
        assert_eq!(sheet.total_assets, BigDecimal::from(56_000));
        assert_eq!(sheet.total_liabilities, BigDecimal::from(700));
        // 50000 + 6300 - 1000
        assert_eq!(sheet.total_equity, BigDecimal::from(55_300));

        let up_to_day_3 = ReportPeriod::between(day(2), day(3));
        let early = ReportSet::generate(
            &snapshot(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
            &up_to_day_3,
        );
        assert_eq!(early.balance_sheet.total_assets, BigDecimal::from(50_000));
        assert!(early.balance_sheet.is_balanced);
    }

    #[test]
    fn test_workbook_has_every_sheet() {
        let reports = ReportSet::generate(
            &snapshot(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
            &ReportPeriod::all(),
        );
        let workbook = reports.to_workbook();
        assert_eq!(workbook.sheets.len(), 12);
        assert!(workbook.sheets.iter().all(|s| s.name.chars().count() <= MAX_SHEET_NAME_LEN));
        assert!(workbook.sheet("Neraca Saldo").is_some());
        assert!(workbook.sheet("Kartu Persediaan").is_some());

        let tb = workbook.sheet("Neraca Saldo").unwrap();
        assert_eq!(tb.headers[..2], ["Kode Akun".to_string(), "Nama Akun".to_string()]);
    }

    #[test]
    fn test_period_scopes_income() {
        let reports = ReportSet::generate(
            &snapshot(),
            &AccountConventions::default(),
            &CashFlowRules::default(),
            &ReportPeriod::between(day(4), day(30)),
        );
        assert_eq!(reports.cash_flow.opening_cash, BigDecimal::from(42_000));
        assert_eq!(reports.income_statement.total_revenue, BigDecimal::from(12_000));
        assert_eq!(reports.closing_entries[0].transaction_date, Some(day(30)));
    }
}
