//! Read-modify-write orchestration over a [`LedgerStore`].

use std::sync::{Arc, Mutex};

use chrono::Datelike;
use tracing::{info, warn};

use crate::errors::{LedgerError, Result};
use crate::ledger::{
    self, all_month_labels, Entry, MonthListing, MonthSegmenter, MonthTotals, Table,
};
use crate::session::Draft;
use crate::storage::{LedgerStore, RetryPolicy};

/// Default value of the source column for entries captured in chat.
pub const DEFAULT_SOURCE: &str = "Наличка";

/// Result of a successful append.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEntry {
    pub index: usize,
    pub label: String,
    pub entry: Entry,
    pub header_created: bool,
}

/// Serializes every mutation through one writer lock and retries transient locks.
///
/// The lock covers this process only; another program writing the same file between
/// our load and save is still overwritten (last writer wins).
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    segmenter: MonthSegmenter,
    retry: RetryPolicy,
    default_source: String,
    writer: Mutex<()>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, segmenter: MonthSegmenter, retry: RetryPolicy) -> Self {
        Self {
            store,
            segmenter,
            retry,
            default_source: DEFAULT_SOURCE.to_string(),
            writer: Mutex::new(()),
        }
    }

    pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
        self.default_source = source.into();
        self
    }

    pub fn segmenter(&self) -> &MonthSegmenter {
        &self.segmenter
    }

    pub fn current_label(&self) -> String {
        self.segmenter.current_label()
    }

    pub fn load(&self) -> Result<Table> {
        self.retry.run("load", || self.store.load())
    }

    /// Turns a completed draft into an entry dated today and appends it to the
    /// current month.
    pub fn record(&self, author: &str, draft: &Draft) -> Result<SavedEntry> {
        let today = self.segmenter.clock().today();
        let entry = Entry::new(
            today.day() as u8,
            draft.kind,
            draft.amount,
            self.default_source.clone(),
            author,
            draft.note.clone(),
        );
        self.append_entry(&self.current_label(), entry)
    }

    pub fn append_entry(&self, label: &str, entry: Entry) -> Result<SavedEntry> {
        let _writer = self.lock_writer()?;
        let table = self.load()?;
        let appended = ledger::append(table, label, entry.clone());
        self.persist(&appended.table)?;
        info!(
            label,
            index = appended.index,
            author = %entry.author,
            amount = entry.amount,
            "entry appended"
        );
        Ok(SavedEntry {
            index: appended.index,
            label: label.to_string(),
            entry,
            header_created: appended.header_created,
        })
    }

    /// Removes the referenced entry if `requesting_user` wrote it.
    pub fn undo(&self, index: Option<usize>, requesting_user: &str) -> Result<Entry> {
        let _writer = self.lock_writer()?;
        let table = self.load()?;
        let undone = ledger::undo(table, index, requesting_user).map_err(|err| {
            warn!(%err, user = requesting_user, "undo rejected");
            err
        })?;
        self.persist(&undone.table)?;
        info!(index = ?index, user = requesting_user, "entry removed");
        Ok(undone.removed)
    }

    pub fn totals(&self, label: &str) -> Result<MonthTotals> {
        Ok(ledger::totals(&self.load()?, label))
    }

    pub fn listing(&self, label: &str) -> Result<MonthListing> {
        Ok(ledger::listing(
            &self.load()?,
            label,
            self.segmenter.locale(),
        ))
    }

    pub fn month_labels(&self) -> Result<Vec<String>> {
        Ok(all_month_labels(&self.load()?))
    }

    fn persist(&self, table: &Table) -> Result<()> {
        self.retry
            .run("save", || self.store.save(table))
            .map_err(|err| {
                warn!(store = %self.store.describe(), %err, "ledger save failed");
                err
            })
    }

    fn lock_writer(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.writer
            .lock()
            .map_err(|_| LedgerError::Persistence("ledger writer lock poisoned".into()))
    }
}
