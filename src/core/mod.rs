//! Services that sit between the conversation layer and storage.

pub mod ledger_service;
pub mod time;
pub mod utils;

pub use ledger_service::{LedgerService, SavedEntry, DEFAULT_SOURCE};
pub use time::{Clock, FixedClock, SystemClock};
