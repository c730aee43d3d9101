#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use cashflow_core::{
    assistant::{Assistant, NoChart},
    core::{FixedClock, LedgerService},
    ledger::{Entry, EntryKind, Locale, MonthSegmenter},
    storage::{LedgerStore, RetryPolicy},
};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const OCTOBER: &str = "октябрь 2025";

/// Creates a unique directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn october_14() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 14).expect("valid date")
}

/// Ledger service pinned to 14 October 2025, without retries.
pub fn service_over(store: Arc<dyn LedgerStore>) -> Arc<LedgerService> {
    let segmenter = MonthSegmenter::new(Locale::Ru, Arc::new(FixedClock::new(october_14())));
    Arc::new(LedgerService::new(store, segmenter, RetryPolicy::none()))
}

pub fn assistant_over(store: Arc<dyn LedgerStore>) -> Assistant {
    Assistant::new(service_over(store), Box::new(NoChart))
}

pub fn entry(kind: EntryKind, amount: f64, author: &str, note: &str) -> Entry {
    Entry::new(14, kind, amount, "Наличка", author, note)
}
