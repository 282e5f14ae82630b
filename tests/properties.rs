//! Property tests for the bookkeeping identities

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use lobster_ledger::reports::InventoryCard;
use lobster_ledger::{
    AccountConventions, CashFlowRules, LedgerRow, LedgerSnapshot, ReportPeriod, ReportSet,
    TrialBalance, Worksheet,
};
use lobster_ledger::{Account, EntryKind, InventoryMovement, JournalDraft, JournalLine};
use proptest::prelude::*;

/// Accounts a generated journal may touch; the income summary is left to closing
const CODES: [&str; 10] = [
    "1-1100", "1-1300", "1-2200", "2-1100", "3-1100", "3-1200", "4-1100", "4-1200", "5-1100",
    "6-1100",
];

fn chart() -> Vec<Account> {
    let mut accounts: Vec<Account> = CODES
        .iter()
        .map(|code| Account::new(code.to_string(), format!("Akun {}", code)))
        .collect();
    accounts.push(Account::new("3-1300".to_string(), "Ikhtisar Laba Rugi".to_string()));
    accounts
}

fn rupiah(minor: i64) -> BigDecimal {
    BigDecimal::new(minor.into(), 2)
}

/// One debit/credit pair of a journal: (debit account, credit account, amount in sen)
fn leg_strategy() -> impl Strategy<Value = (usize, usize, i64)> {
    (0..CODES.len(), 0..CODES.len(), 1i64..1_000_000_000i64)
}

fn kind_strategy() -> impl Strategy<Value = EntryKind> {
    prop_oneof![Just(EntryKind::Standard), Just(EntryKind::Adjusting)]
}

/// A balanced draft: every leg adds one debit line and one credit line of the same amount
fn draft_strategy() -> impl Strategy<Value = JournalDraft> {
    (
        1u32..=28u32,
        kind_strategy(),
        proptest::collection::vec(leg_strategy(), 1..5),
    )
        .prop_map(|(day, kind, legs)| {
            let mut draft = JournalDraft::new(NaiveDate::from_ymd_opt(2025, 11, day), "Transaksi".to_string());
            draft.kind = kind;
            for (debit, credit, amount) in legs {
                draft.add_line(JournalLine::debit(CODES[debit].to_string(), rupiah(amount)));
                draft.add_line(JournalLine::credit(CODES[credit].to_string(), rupiah(amount)));
            }
            draft
        })
}

fn journals_strategy() -> impl Strategy<Value = Vec<JournalDraft>> {
    proptest::collection::vec(draft_strategy(), 0..30)
}

/// Posted rows for the drafts, journal ids counting from 1
fn ledger_rows(chart: &[Account], drafts: &[JournalDraft]) -> Vec<LedgerRow> {
    drafts
        .iter()
        .enumerate()
        .flat_map(|(index, draft)| {
            draft.lines.iter().map(move |line| LedgerRow {
                journal_id: index as i64 + 1,
                date: draft.transaction_date.unwrap_or_default(),
                description: draft.description.clone(),
                order_id: None,
                kind: draft.kind,
                account: chart
                    .iter()
                    .find(|a| a.code == line.account_code)
                    .cloned()
                    .unwrap(),
                debit: line.debit_amount.clone(),
                credit: line.credit_amount.clone(),
                cash_flow_category: None,
            })
        })
        .collect()
}

/// (product id, day, receipt?, quantity, unit cost)
fn movement_strategy() -> impl Strategy<Value = InventoryMovement> {
    (1i64..4i64, 1u32..=28u32, any::<bool>(), 1i64..50i64, 1_000i64..500_000i64).prop_map(
        |(product_id, day, receipt, quantity, unit_cost)| {
            let date = NaiveDate::from_ymd_opt(2025, 11, day).unwrap();
            let reference = format!("REF-{}-{}", product_id, day);
            if receipt {
                InventoryMovement::receipt(product_id, date, BigDecimal::from(quantity), BigDecimal::from(unit_cost), reference)
            } else {
                InventoryMovement::issue(product_id, date, BigDecimal::from(quantity), BigDecimal::from(unit_cost), reference)
            }
        },
    )
}

proptest! {
    #[test]
    fn balanced_journals_keep_trial_balance_even(drafts in journals_strategy()) {
        let chart = chart();
        for draft in &drafts {
            prop_assert!(draft.validate().is_ok());
        }

        let tb = TrialBalance::compute(&chart, &ledger_rows(&chart, &drafts));
        prop_assert_eq!(&tb.total_debit, &tb.total_credit);
        prop_assert_eq!(TrialBalance::from_drafts(&chart, &drafts), tb);
    }

    #[test]
    fn adjusted_balance_is_unadjusted_plus_adjustments(
        drafts in journals_strategy(),
        threshold in 0i64..32i64
    ) {
        let chart = chart();
        let rows = ledger_rows(&chart, &drafts);
        let worksheet = Worksheet::build(&chart, &rows, |row| row.journal_id >= threshold);

        for account in &chart {
            let unadjusted = worksheet.unadjusted.row(&account.code).unwrap().net();
            let adjustments = worksheet.adjustments.row(&account.code).unwrap().net();
            let adjusted = worksheet.adjusted.row(&account.code).unwrap().net();
            prop_assert_eq!(adjusted, unadjusted + adjustments);
        }
        // The partition never changes the combined result
        prop_assert_eq!(worksheet.adjusted, TrialBalance::compute(&chart, &rows));
    }

    #[test]
    fn running_quantity_is_sum_of_changes(
        movements in proptest::collection::vec(movement_strategy(), 0..40)
    ) {
        let cards = InventoryCard::build_all(&movements, &[]);

        for card in &cards {
            let mut quantity = BigDecimal::from(0);
            let mut value = BigDecimal::from(0);
            for line in &card.lines {
                quantity += &line.quantity_change;
                value += &line.value_change;
                prop_assert_eq!(&line.running_quantity, &quantity);
                prop_assert_eq!(&line.running_value, &value);
            }

            let expected: BigDecimal = movements
                .iter()
                .filter(|m| m.product_id == card.product_id)
                .map(|m| &m.quantity_change)
                .sum();
            prop_assert_eq!(card.ending_quantity(), expected);
        }

        let lines: usize = cards.iter().map(|card| card.lines.len()).sum();
        prop_assert_eq!(lines, movements.len());
    }

    #[test]
    fn net_income_reconciles_with_capital(drafts in journals_strategy()) {
        let chart = chart();
        let conventions = AccountConventions::default();
        let snapshot = LedgerSnapshot {
            rows: ledger_rows(&chart, &drafts),
            accounts: chart,
            ..LedgerSnapshot::empty()
        };

        let reports = ReportSet::generate(&snapshot, &conventions, &CashFlowRules::default(), &ReportPeriod::all());
        let equity = &reports.equity_statement;

        prop_assert_eq!(
            &equity.closing_capital - &equity.opening_capital + &equity.drawings,
            reports.net_income().clone()
        );
        prop_assert_eq!(reports.worksheet.net_income(), reports.net_income().clone());
        prop_assert_eq!(reports.post_closing.balance_of(&conventions.capital_account), equity.closing_capital.clone());
        prop_assert!(reports
            .post_closing
            .rows
            .iter()
            .filter(|row| row.account.account_type.is_temporary() || row.account.code == conventions.drawings_account)
            .all(|row| row.is_zero()));
    }
}
