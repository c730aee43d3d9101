pub mod csv_backend;
pub mod memory;

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::Result;
use crate::ledger::Table;

/// Whole-table persistence for the ledger.
///
/// `load` always reflects the latest durable state; `save` replaces the resource so
/// that a later `load` never sees a partial write. A resource held by another
/// program surfaces as [`crate::errors::LedgerError::ResourceLocked`].
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Table>;
    fn save(&self, table: &Table) -> Result<()>;
    /// Human-readable location used in logs.
    fn describe(&self) -> String;
}

/// Bounded retry with exponential backoff for transiently locked resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total tries, including the first one.
    pub attempts: u32,
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Runs `op` until it succeeds, fails permanently, or the attempts run out.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.attempts.max(1);
        let mut delay = Duration::from_millis(self.backoff_ms);
        let mut attempt = 1;
        loop {
            match op() {
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(%err, attempt, what, "ledger resource busy, retrying");
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

pub use csv_backend::CsvLedgerStore;
pub use memory::MemoryStore;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;

    #[test]
    fn retries_transient_failures_until_success() {
        let policy = RetryPolicy {
            attempts: 3,
            backoff_ms: 0,
        };
        let mut calls = 0;
        let value = policy
            .run("save", || {
                calls += 1;
                if calls < 3 {
                    Err(LedgerError::ResourceLocked("busy".into()))
                } else {
                    Ok(calls)
                }
            })
            .expect("third attempt succeeds");
        assert_eq!(value, 3);
    }

    #[test]
    fn gives_up_after_the_last_attempt() {
        let policy = RetryPolicy {
            attempts: 2,
            backoff_ms: 0,
        };
        let mut calls = 0;
        let err = policy
            .run("save", || -> Result<()> {
                calls += 1;
                Err(LedgerError::ResourceLocked("busy".into()))
            })
            .expect_err("still locked");
        assert!(matches!(err, LedgerError::ResourceLocked(_)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn permanent_failures_are_not_retried() {
        let mut calls = 0;
        let _ = RetryPolicy::default().run("load", || -> Result<()> {
            calls += 1;
            Err(LedgerError::Persistence("corrupt".into()))
        });
        assert_eq!(calls, 1);
    }
}
