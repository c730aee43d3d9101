//! Append and undo over an in-memory [`Table`]. Nothing here touches storage.

use tracing::debug;

use crate::errors::{LedgerError, Result};

use super::row::{Entry, LedgerRow, Table};
use super::segment::find_segment;

/// Outcome of [`append`].
#[derive(Debug, Clone, PartialEq)]
pub struct Appended {
    pub table: Table,
    /// Absolute row index of the new entry.
    pub index: usize,
    pub header_created: bool,
}

/// Outcome of [`undo`].
#[derive(Debug, Clone, PartialEq)]
pub struct Undone {
    pub table: Table,
    pub removed: Entry,
}

/// Appends `entry` as the last row, adding a header for `month_label` first when the
/// table has none. Rows are never inserted mid-table.
pub fn append(mut table: Table, month_label: &str, entry: Entry) -> Appended {
    let header_created = find_segment(&table, month_label).is_none();
    if header_created {
        debug!(label = month_label, "adding month header");
        table.rows.push(LedgerRow::header(month_label));
    }
    table.rows.push(LedgerRow::Entry(entry));
    let index = table.len() - 1;
    Appended {
        table,
        index,
        header_created,
    }
}

/// Removes the entry at `index` when `requesting_user` authored it.
///
/// `index` is the caller's last-added reference; `None` means nothing was added.
pub fn undo(mut table: Table, index: Option<usize>, requesting_user: &str) -> Result<Undone> {
    let index = index.ok_or(LedgerError::NothingToUndo)?;
    let entry = match table.get(index) {
        Some(LedgerRow::Entry(entry)) => entry,
        _ => return Err(LedgerError::StaleReference(index)),
    };
    if entry.author != requesting_user {
        return Err(LedgerError::NotOwner {
            index,
            author: entry.author.clone(),
        });
    }
    let removed = entry.clone();
    table.rows.remove(index);
    Ok(Undone { table, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::row::EntryKind;
    use crate::ledger::segment::segments;

    fn entry(kind: EntryKind, amount: f64, author: &str) -> Entry {
        Entry::new(4, kind, amount, "Наличка", author, "—")
    }

    #[test]
    fn first_append_creates_the_header() {
        let appended = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 5000.0, "Alice"),
        );
        assert!(appended.header_created);
        assert_eq!(appended.index, 1);
        assert_eq!(appended.table.rows[0], LedgerRow::header("март 2025"));
    }

    #[test]
    fn existing_header_is_reused() {
        let first = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 1.0, "Alice"),
        );
        let second = append(
            first.table,
            "март 2025",
            entry(EntryKind::Expense, 2.0, "Alice"),
        );
        assert!(!second.header_created);
        assert_eq!(second.index, 2);
        assert_eq!(segments(&second.table).len(), 1);
    }

    #[test]
    fn undo_without_reference_is_nothing_to_undo() {
        let err = undo(Table::default(), None, "Alice").expect_err("no reference");
        assert!(matches!(err, LedgerError::NothingToUndo));
    }

    #[test]
    fn undo_past_the_end_is_stale() {
        let appended = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 1.0, "Alice"),
        );
        let err = undo(appended.table, Some(7), "Alice").expect_err("stale");
        assert!(matches!(err, LedgerError::StaleReference(7)));
    }

    #[test]
    fn undo_pointing_at_a_header_is_stale() {
        let appended = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 1.0, "Alice"),
        );
        let err = undo(appended.table, Some(0), "Alice").expect_err("header row");
        assert!(matches!(err, LedgerError::StaleReference(0)));
    }

    #[test]
    fn undo_by_someone_else_is_rejected() {
        let appended = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 1.0, "Bob"),
        );
        let err = undo(appended.table, Some(appended.index), "Alice").expect_err("not owner");
        match err {
            LedgerError::NotOwner { index, author } => {
                assert_eq!(index, 1);
                assert_eq!(author, "Bob");
            }
            other => panic!("expected NotOwner, got {other:?}"),
        }
    }

    #[test]
    fn undo_compacts_following_rows() {
        let a = append(
            Table::default(),
            "март 2025",
            entry(EntryKind::Income, 1.0, "Bob"),
        );
        let b = append(a.table, "март 2025", entry(EntryKind::Expense, 2.0, "Ann"));
        let undone = undo(b.table, Some(a.index), "Bob").expect("undo");
        assert_eq!(undone.removed.amount, 1.0);
        assert_eq!(undone.table.len(), 2);
        assert_eq!(
            undone.table.rows[1].as_entry().map(|e| e.author.as_str()),
            Some("Ann")
        );
    }
}
