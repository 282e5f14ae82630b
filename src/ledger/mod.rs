//! Ledger module: chart of accounts, journal posting, the snapshot loader and
//! the derived books (trial balance, worksheet, closing, general ledger)

pub mod account;
pub mod closing;
pub mod core;
pub mod general_ledger;
pub mod loader;
pub mod transaction;
pub mod trial_balance;
pub mod worksheet;

pub use self::core::*;
pub use account::*;
pub use closing::*;
pub use general_ledger::*;
pub use loader::*;
pub use transaction::*;
pub use trial_balance::*;
pub use worksheet::*;
