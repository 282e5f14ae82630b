//! Closing entries (jurnal penutup) and the post-closing trial balance

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::config::AccountConventions;
use crate::ledger::trial_balance::TrialBalance;
use crate::types::*;

/// Closing drafts for an adjusted trial balance, in posting order:
/// revenue, expenses, income summary, drawings.
///
/// Zero balances produce no lines and empty drafts are left out. When a
/// type's balances net to zero the draft carries no income summary line.
pub fn closing_entries(
    adjusted: &TrialBalance,
    conventions: &AccountConventions,
    date: NaiveDate,
) -> Vec<JournalDraft> {
    let zero = BigDecimal::from(0);
    let summary = conventions.income_summary_account.as_str();
    let capital = conventions.capital_account.as_str();
    let mut drafts = Vec::new();

    // Revenue: debit each account, credit income summary
    let mut revenue = draft(date, "Penutupan akun pendapatan");
    let mut total_revenue = BigDecimal::from(0);
    for row in adjusted.rows_of_type(AccountType::Revenue) {
        let balance = row.balance();
        if balance == zero {
            continue;
        }
        revenue.add_line(side_line(&row.account.code, balance.clone(), EntryType::Debit));
        total_revenue += balance;
    }
    if !revenue.lines.is_empty() {
        // Offsetting balances (sales against returns) close against each other
        if total_revenue != zero {
            revenue.add_line(side_line(summary, total_revenue.clone(), EntryType::Credit));
        }
        drafts.push(revenue);
    }

    // Expenses: credit each account, debit income summary
    let mut expenses = draft(date, "Penutupan akun beban");
    let mut expense_lines = Vec::new();
    let mut total_expense = BigDecimal::from(0);
    for row in adjusted.rows_of_type(AccountType::Expense) {
        let balance = row.balance();
        if balance == zero {
            continue;
        }
        expense_lines.push(side_line(&row.account.code, balance.clone(), EntryType::Credit));
        total_expense += balance;
    }
    if !expense_lines.is_empty() {
        if total_expense != zero {
            expenses.add_line(side_line(summary, total_expense.clone(), EntryType::Debit));
        }
        expenses.lines.extend(expense_lines);
        drafts.push(expenses);
    }

    // Income summary into capital
    let net_income = &total_revenue - &total_expense;
    if net_income != zero {
        let mut close_summary = draft(date, "Penutupan ikhtisar laba rugi");
        if net_income > zero {
            close_summary.add_line(side_line(summary, net_income.clone(), EntryType::Debit));
            close_summary.add_line(side_line(capital, net_income, EntryType::Credit));
        } else {
            let loss = -net_income;
            close_summary.add_line(side_line(capital, loss.clone(), EntryType::Debit));
            close_summary.add_line(side_line(summary, loss, EntryType::Credit));
        }
        drafts.push(close_summary);
    }

    // Drawings into capital
    let drawings = adjusted
        .row(&conventions.drawings_account)
        .map(|row| &row.debit - &row.credit)
        .unwrap_or_else(|| BigDecimal::from(0));
    if drawings != zero {
        let mut close_drawings = draft(date, "Penutupan prive");
        if drawings > zero {
            close_drawings.add_line(side_line(capital, drawings.clone(), EntryType::Debit));
            close_drawings.add_line(side_line(&conventions.drawings_account, drawings, EntryType::Credit));
        } else {
            let reversal = -drawings;
            close_drawings.add_line(side_line(&conventions.drawings_account, reversal.clone(), EntryType::Debit));
            close_drawings.add_line(side_line(capital, reversal, EntryType::Credit));
        }
        drafts.push(close_drawings);
    }

    drafts
}

/// Adjusted trial balance with the closing drafts applied
pub fn post_closing_trial_balance(adjusted: &TrialBalance, closing: &[JournalDraft]) -> TrialBalance {
    adjusted.combine(&TrialBalance::from_drafts(&adjusted.accounts(), closing))
}

fn draft(date: NaiveDate, description: &str) -> JournalDraft {
    let mut draft = JournalDraft::new(Some(date), description.to_string());
    draft.kind = EntryKind::Closing;
    draft
}

/// A line that moves `amount` to the given side. Negative balances
/// (an account sitting on its opposite side) are flipped to the other side.
fn side_line(code: &str, amount: BigDecimal, side: EntryType) -> JournalLine {
    let (amount, side) = if amount < BigDecimal::from(0) {
        (-amount, side.opposite())
    } else {
        (amount, side)
    };
    match side {
        EntryType::Debit => JournalLine::debit(code.to_string(), amount),
        EntryType::Credit => JournalLine::credit(code.to_string(), amount),
    }
}
