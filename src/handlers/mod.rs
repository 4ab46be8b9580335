//! API handlers for the credit ledger

pub mod consumer_limit;
pub mod health;
pub mod loan;
pub mod registry;
pub mod transaction;

pub use consumer_limit::*;
pub use health::health_check;
pub use loan::*;
pub use registry::*;
pub use transaction::*;
