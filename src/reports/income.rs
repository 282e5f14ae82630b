//! Income statement (laporan laba rugi)

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::ledger::trial_balance::TrialBalance;
use crate::reports::workbook::{amount, Sheet, ToSheet};
use crate::reports::StatementLine;
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Vec<StatementLine>,
    pub other_income: Vec<StatementLine>,
    pub cost_of_goods_sold: Vec<StatementLine>,
    pub operating_expenses: Vec<StatementLine>,
    pub other_expenses: Vec<StatementLine>,
    pub total_revenue: BigDecimal,
    pub total_other_income: BigDecimal,
    pub total_cost_of_goods_sold: BigDecimal,
    pub total_operating_expenses: BigDecimal,
    pub total_other_expenses: BigDecimal,
    /// Revenue less cost of goods sold
    pub gross_profit: BigDecimal,
    /// Gross profit less operating expenses
    pub operating_profit: BigDecimal,
    pub net_income: BigDecimal,
}

impl IncomeStatement {
    /// Build from an adjusted trial balance.
    ///
    /// Revenue accounts starting with 4 are sales, other revenue accounts are
    /// other income. Expense accounts starting with 5 are cost of goods sold,
    /// 6 operating expenses, and anything else other expenses.
    pub fn from_trial_balance(tb: &TrialBalance) -> Self {
        let mut revenue = Vec::new();
        let mut other_income = Vec::new();
        let mut cost_of_goods_sold = Vec::new();
        let mut operating_expenses = Vec::new();
        let mut other_expenses = Vec::new();

        for row in &tb.rows {
            if row.is_zero() {
                continue;
            }
            let line = StatementLine::from_row(row);
            match (row.account.account_type, row.account.prefix()) {
                (AccountType::Revenue, Some('4')) => revenue.push(line),
                (AccountType::Revenue, _) => other_income.push(line),
                (AccountType::Expense, Some('5')) => cost_of_goods_sold.push(line),
                (AccountType::Expense, Some('6')) => operating_expenses.push(line),
                (AccountType::Expense, _) => other_expenses.push(line),
                _ => {}
            }
        }

        let total_revenue = StatementLine::total(&revenue);
        let total_other_income = StatementLine::total(&other_income);
        let total_cost_of_goods_sold = StatementLine::total(&cost_of_goods_sold);
        let total_operating_expenses = StatementLine::total(&operating_expenses);
        let total_other_expenses = StatementLine::total(&other_expenses);

        let gross_profit = &total_revenue - &total_cost_of_goods_sold;
        let operating_profit = &gross_profit - &total_operating_expenses;
        let net_income = &operating_profit + &total_other_income - &total_other_expenses;

        Self {
            revenue,
            other_income,
            cost_of_goods_sold,
            operating_expenses,
            other_expenses,
            total_revenue,
            total_other_income,
            total_cost_of_goods_sold,
            total_operating_expenses,
            total_other_expenses,
            gross_profit,
            operating_profit,
            net_income,
        }
    }
}

impl ToSheet for IncomeStatement {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new("Laporan Laba Rugi", &["Keterangan", "Kode Akun", "Jumlah"]);

        let sections = [
            ("Pendapatan", &self.revenue, &self.total_revenue),
            ("Harga Pokok Penjualan", &self.cost_of_goods_sold, &self.total_cost_of_goods_sold),
        ];
        for (title, lines, total) in sections {
            sheet.add_section(title, lines, total);
        }
        sheet.add_row(vec!["Laba Kotor".to_string(), String::new(), amount(&self.gross_profit)]);

        sheet.add_section("Beban Operasional", &self.operating_expenses, &self.total_operating_expenses);
        sheet.add_row(vec!["Laba Operasional".to_string(), String::new(), amount(&self.operating_profit)]);

        sheet.add_section("Pendapatan Lain-lain", &self.other_income, &self.total_other_income);
        sheet.add_section("Beban Lain-lain", &self.other_expenses, &self.total_other_expenses);
        sheet.add_row(vec!["Laba Bersih".to_string(), String::new(), amount(&self.net_income)]);
        sheet
    }
}
