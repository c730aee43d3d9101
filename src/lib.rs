#![doc(test(attr(deny(warnings))))]

//! Cashflow Core keeps a shared, month-partitioned income/expense ledger in a flat
//! table file and drives it through a small conversational assistant.

pub mod assistant;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod session;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(build = %build.summary(), "Cashflow Core tracing initialized.");
    });
}
