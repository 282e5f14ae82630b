//! # Lobster Ledger
//!
//! Bookkeeping for a small lobster storefront: the shop's orders flow into a
//! double-entry journal, and the books produce the usual period reports.
//!
//! ## Features
//!
//! - **Double-entry journals**: validated posting, adjusting and closing entries
//! - **Chart of accounts**: type and normal balance inferred from the account code
//! - **Reports**: trial balance, worksheet, income statement, statement of changes
//!   in equity, balance sheet, cash flow, general ledger and inventory cards
//! - **Payment webhook**: gateway notifications post the sales journal once per order
//! - **Import and export**: spreadsheet text in, one CSV per report sheet out
//! - **Storage abstraction**: the books sit behind the async [`LedgerStorage`] trait
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobster_ledger::{Ledger, ReportPeriod, utils::MemoryStorage};
//!
//! # async fn run() -> lobster_ledger::LedgerResult<()> {
//! let mut ledger = Ledger::new(MemoryStorage::new());
//! ledger.setup_storefront_chart().await?;
//! let reports = ledger.generate_reports(&ReportPeriod::all()).await?;
//! println!("net income: {}", reports.net_income());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod gateway;
pub mod import;
pub mod ledger;
pub mod reports;
pub mod server;
pub mod storefront;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{AccountConventions, BooksConfig};
pub use ledger::*;
pub use reports::{CashFlowRules, ReportSet, Workbook};
pub use traits::*;
pub use types::*;

// Re-export journal patterns for convenience
pub use ledger::transaction::patterns;
