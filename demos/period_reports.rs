//! A month of storefront bookkeeping, from checkout to the closing entries
//!
//! ```bash
//! cargo run --example period_reports -- ./laporan
//! ```

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use lobster_ledger::gateway::{process_notification, PaymentNotification};
use lobster_ledger::storefront::Cart;
use lobster_ledger::utils::MemoryStorage;
use lobster_ledger::{patterns, InventoryMovement, Ledger, Product, ReportPeriod};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("lobster-ledger-reports"));
    let date = |d| NaiveDate::from_ymd_opt(2025, 11, d).ok_or("invalid date");

    let mut ledger = Ledger::new(MemoryStorage::new());
    let accounts = ledger.setup_storefront_chart().await?;
    println!("Chart of accounts: {} accounts", accounts.len());

    let lobster = Product {
        id: 1,
        name: "Lobster Mutiara".to_string(),
        description: "Lobster mutiara hidup, per ekor".to_string(),
        price: BigDecimal::from(250_000),
        cost_price: Some(BigDecimal::from(150_000)),
        inventory_account_code: "1-1300".to_string(),
        hpp_account_code: "5-1100".to_string(),
    };
    ledger.save_product(&lobster).await?;

    ledger
        .post_journal(&patterns::owner_investment(
            date(1)?,
            "Setoran modal awal".to_string(),
            "1-1100",
            "3-1100",
            BigDecimal::from(20_000_000),
        )?)
        .await?;
    ledger
        .post_journal(&patterns::inventory_purchase(
            date(2)?,
            "Pembelian lobster mutiara".to_string(),
            "1-1300",
            "1-1100",
            BigDecimal::from(3_000_000),
        )?)
        .await?;
    ledger
        .record_movements(&[InventoryMovement::receipt(
            lobster.id,
            date(2)?,
            BigDecimal::from(20),
            BigDecimal::from(150_000),
            "PO-1".to_string(),
        )])
        .await?;

    // A buyer checks out and the gateway reports the payment
    let mut cart = Cart::new();
    cart.add(&lobster, 6)?;
    let checkout = ledger
        .checkout(&cart, "Jl. Pantai Indah 7, Lombok", Some("buyer-1".to_string()), date(10)?.and_hms_opt(14, 0, 0).ok_or("invalid time")?)
        .await?;
    println!("Order {} placed, gateway id {}", checkout.order.id, checkout.gateway_order_id);

    let notification = PaymentNotification {
        order_id: Some(checkout.gateway_order_id.clone()),
        transaction_status: Some("settlement".to_string()),
        transaction_id: Some("demo-trx-1".to_string()),
        ..Default::default()
    };
    let outcome = process_notification(&mut ledger, &notification, date(10)?).await?;
    println!("Payment settled, journal recorded: {}", outcome.journal_recorded);

    ledger
        .post_journal(&patterns::expense_payment(
            date(25)?,
            "Gaji karyawan".to_string(),
            "6-1100",
            "1-1100",
            BigDecimal::from(400_000),
        )?)
        .await?;
    ledger
        .post_journal(&patterns::depreciation_adjustment(
            date(30)?,
            "Penyusutan peralatan".to_string(),
            "6-1400",
            "1-2200",
            BigDecimal::from(50_000),
        )?)
        .await?;

    let november = ReportPeriod::between(date(1)?, date(30)?);
    let reports = ledger.generate_reports(&november).await?;
    println!("\nNet income: {}", reports.net_income());
    println!("Closing capital: {}", reports.equity_statement.closing_capital);
    println!(
        "Balance sheet: assets {} / balanced {}",
        reports.balance_sheet.total_assets, reports.balance_sheet.is_balanced
    );
    println!("Cash at period end: {}", reports.cash_flow.closing_cash);

    let files = reports.to_workbook().write_to_dir(&out_dir)?;
    println!("\nWrote {} sheets to {}", files.len(), out_dir.display());

    let closing = ledger.post_closing_entries(&november, date(30)?).await?;
    println!("Posted {} closing entries", closing.len());

    let integrity = ledger.validate_integrity(&november).await?;
    println!("Books valid: {}", integrity.is_valid);
    Ok(())
}
