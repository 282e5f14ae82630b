//! Utility modules

pub mod memory_storage;
pub mod sql_storage;
pub mod validation;

pub use memory_storage::*;
pub use sql_storage::*;
pub use validation::*;
