use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Mutex,
};

use crate::errors::{LedgerError, Result};
use crate::ledger::Table;

use super::LedgerStore;

/// Volatile store. `set_locked` simulates another program holding the file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
    locked: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(table: Table) -> Self {
        Self {
            table: Mutex::new(table),
            ..Self::default()
        }
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Table {
        self.table
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Table> {
        self.table
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| LedgerError::Persistence("memory store poisoned".into()))
    }

    fn save(&self, table: &Table) -> Result<()> {
        if self.locked.load(Ordering::SeqCst) {
            return Err(LedgerError::ResourceLocked("memory store".into()));
        }
        let mut guard = self
            .table
            .lock()
            .map_err(|_| LedgerError::Persistence("memory store poisoned".into()))?;
        *guard = table.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory ledger".to_string()
    }
}
