//! Statement of changes in equity (laporan perubahan modal)

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::config::AccountConventions;
use crate::ledger::trial_balance::TrialBalance;
use crate::reports::workbook::{amount, Sheet, ToSheet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityStatement {
    pub capital_account: String,
    pub opening_capital: BigDecimal,
    pub net_income: BigDecimal,
    pub drawings: BigDecimal,
    pub closing_capital: BigDecimal,
}

impl EquityStatement {
    /// Opening capital is the credit-side balance of the capital account and
    /// drawings the debit-side balance of the drawings account.
    pub fn from_trial_balance(
        tb: &TrialBalance,
        net_income: &BigDecimal,
        conventions: &AccountConventions,
    ) -> Self {
        let opening_capital = tb
            .row(&conventions.capital_account)
            .map(|row| &row.credit - &row.debit)
            .unwrap_or_else(|| BigDecimal::from(0));
        let drawings = tb
            .row(&conventions.drawings_account)
            .map(|row| &row.debit - &row.credit)
            .unwrap_or_else(|| BigDecimal::from(0));
        let closing_capital = &opening_capital + net_income - &drawings;

        Self {
            capital_account: conventions.capital_account.clone(),
            opening_capital,
            net_income: net_income.clone(),
            drawings,
            closing_capital,
        }
    }
}

impl ToSheet for EquityStatement {
    fn to_sheet(&self) -> Sheet {
        let mut sheet = Sheet::new("Laporan Perubahan Modal", &["Keterangan", "Jumlah"]);
        for (label, value) in [
            ("Modal Awal", &self.opening_capital),
            ("Laba Bersih", &self.net_income),
            ("Prive", &self.drawings),
            ("Modal Akhir", &self.closing_capital),
        ] {
            sheet.add_row(vec![label.to_string(), amount(value)]);
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::loader::LedgerRow;
    use crate::types::*;
    use chrono::NaiveDate;

    #[test]
    fn test_closing_capital() {
        let modal = Account::new("3-1100".to_string(), "Modal".to_string());
        let prive = Account::new("3-1200".to_string(), "Prive".to_string());
        let kas = Account::new("1-1100".to_string(), "Kas".to_string());
        let chart = vec![kas.clone(), modal.clone(), prive.clone()];
        let row = |account: &Account, debit: i64, credit: i64| LedgerRow {
            journal_id: 1,
            date: NaiveDate::from_ymd_opt(2025, 11, 1).unwrap(),
            description: String::new(),
            order_id: None,
            kind: EntryKind::Standard,
            account: account.clone(),
            debit: BigDecimal::from(debit),
            credit: BigDecimal::from(credit),
            cash_flow_category: None,
        };
        let tb = TrialBalance::compute(
            &chart,
            &[row(&kas, 9000, 0), row(&modal, 0, 10000), row(&prive, 1000, 0)],
        );

        let statement =
            EquityStatement::from_trial_balance(&tb, &BigDecimal::from(2500), &AccountConventions::default());
        assert_eq!(statement.opening_capital, BigDecimal::from(10000));
        assert_eq!(statement.drawings, BigDecimal::from(1000));
        assert_eq!(statement.closing_capital, BigDecimal::from(11500));
        assert_eq!(
            &statement.net_income,
            &(&statement.closing_capital - &statement.opening_capital + &statement.drawings)
        );
    }
}
