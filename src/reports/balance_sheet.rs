//! Balance sheet (laporan posisi keuangan)

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::config::AccountConventions;
use crate::ledger::trial_balance::TrialBalance;
use crate::reports::workbook::{amount, Sheet, ToSheet};
use crate::reports::StatementLine;
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub current_assets: Vec<StatementLine>,
    pub fixed_assets: Vec<StatementLine>,
    pub liabilities: Vec<StatementLine>,
    pub equity: Vec<StatementLine>,
    pub total_current_assets: BigDecimal,
    pub total_fixed_assets: BigDecimal,
    pub total_assets: BigDecimal,
    pub total_liabilities: BigDecimal,
    pub total_equity: BigDecimal,
    pub is_balanced: bool,
}

/// Current assets have a '1' right after the dash ("1-1xxx"); codes without
/// a dash use their second character.
pub fn is_current_asset(code: &str) -> bool {
    let group = match code.split_once('-') {
        Some((_, rest)) => rest.chars().next(),
        None => code.chars().nth(1),
    };
    group == Some('1')
}

impl BalanceSheet {
    /// Build from the adjusted trial balance and the period's closing capital.
    ///
    /// The capital line shows closing capital; drawings and income summary
    /// show zero since both are already folded into it.
    pub fn from_trial_balance(
        tb: &TrialBalance,
        closing_capital: &BigDecimal,
        conventions: &AccountConventions,
    ) -> Self {
        let mut current_assets = Vec::new();
        let mut fixed_assets = Vec::new();
        let mut liabilities = Vec::new();
        let mut equity = Vec::new();
        let mut capital_listed = false;

        for row in &tb.rows {
            let code = row.account.code.as_str();
            match row.account.account_type {
                AccountType::Asset => {
                    let line = StatementLine::new(&row.account, &row.debit - &row.credit);
                    if is_current_asset(code) {
                        current_assets.push(line);
                    } else {
                        fixed_assets.push(line);
                    }
                }
                AccountType::Liability => {
                    liabilities.push(StatementLine::new(&row.account, &row.credit - &row.debit));
                }
                AccountType::Equity => {
                    let value = if code == conventions.capital_account {
                        capital_listed = true;
                        closing_capital.clone()
                    } else if code == conventions.drawings_account
                        || code == conventions.income_summary_account
                    {
                        BigDecimal::from(0)
                    } else {
                        &row.credit - &row.debit
                    };
                    equity.push(StatementLine::new(&row.account, value));
                }
                AccountType::Revenue | AccountType::Expense => {}
            }
        }

        if !capital_listed {
            equity.insert(
                0,
                StatementLine {
                    code: conventions.capital_account.clone(),
                    name: "Modal Akhir".to_string(),
                    amount: closing_capital.clone(),
                },
            );
        }

        let total_current_assets = StatementLine::total(&current_assets);
        let total_fixed_assets = StatementLine::total(&fixed_assets);
        let total_assets = &total_current_assets + &total_fixed_assets;
        let total_liabilities = StatementLine::total(&liabilities);
        let total_equity = StatementLine::total(&equity);
        let is_balanced = total_assets == &total_liabilities + &total_equity;

        if !is_balanced {
            tracing::warn!(
                total_assets = %total_assets,
                total_liabilities = %total_liabilities,
                total_equity = %total_equity,
                "balance sheet does not balance"
            );
        }

        Self {
            current_assets,
            fixed_assets,
            liabilities,
            equity,
            total_current_assets,
            total_fixed_assets,
            total_assets,
            total_liabilities,
            total_equity,
            is_balanced,
        }
    }
}

impl ToSheet for BalanceSheet {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new("Laporan Posisi Keuangan", &["Keterangan", "Kode Akun", "Jumlah"]);
        sheet.add_section("Aset Lancar", &self.current_assets, &self.total_current_assets);
        sheet.add_section("Aset Tetap", &self.fixed_assets, &self.total_fixed_assets);
        sheet.add_row(vec!["Total Aset".to_string(), String::new(), amount(&self.total_assets)]);
        sheet.add_section("Liabilitas", &self.liabilities, &self.total_liabilities);
        sheet.add_section("Ekuitas", &self.equity, &self.total_equity);
        sheet.add_row(vec![
            "Total Liabilitas dan Ekuitas".to_string(),
            String::new(),
            amount(&(&self.total_liabilities + &self.total_equity)),
        ]);
        sheet
    }
}
