use std::fmt;

use super::month::Locale;
use super::row::{cell, format_stored_amount, EntryKind, LedgerRow, Table};
use super::segment::find_segment;

/// Income and expense sums for one month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthTotals {
    pub income: f64,
    pub expense: f64,
}

impl MonthTotals {
    pub fn balance(&self) -> f64 {
        self.income - self.expense
    }
}

/// One itemized listing line, fixed column order.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub day: String,
    pub kind: String,
    pub amount: String,
    pub source: String,
    pub author: String,
    pub note: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>2} | {:<6} | {:>8} | {:<7} | {:<10} | {}",
            self.day, self.kind, self.amount, self.source, self.author, self.note
        )
    }
}

/// Listing result; the empty case records whether the month header exists at all.
#[derive(Debug, Clone, PartialEq)]
pub enum MonthListing {
    NoEntries { segment_present: bool },
    Lines(Vec<LogLine>),
}

impl MonthListing {
    pub fn lines(&self) -> &[LogLine] {
        match self {
            MonthListing::Lines(lines) => lines,
            MonthListing::NoEntries { .. } => &[],
        }
    }
}

/// Sums entries of the first segment labelled `month_label`; zero when absent or empty.
pub fn totals(table: &Table, month_label: &str) -> MonthTotals {
    let Some(segment) = find_segment(table, month_label) else {
        return MonthTotals::default();
    };
    segment
        .entries(table)
        .fold(MonthTotals::default(), |mut acc, entry| {
            match entry.kind {
                EntryKind::Income => acc.income += entry.amount,
                EntryKind::Expense => acc.expense += entry.amount,
            }
            acc
        })
}

/// Itemized lines for `month_label`. Rows inside the segment that are not well-formed
/// entries are listed with their raw cells.
pub fn listing(table: &Table, month_label: &str, locale: Locale) -> MonthListing {
    let Some(segment) = find_segment(table, month_label) else {
        return MonthListing::NoEntries {
            segment_present: false,
        };
    };
    let lines: Vec<LogLine> = table.rows[segment.start..segment.end]
        .iter()
        .filter_map(|row| log_line(row, locale))
        .collect();
    if lines.is_empty() {
        MonthListing::NoEntries {
            segment_present: true,
        }
    } else {
        MonthListing::Lines(lines)
    }
}

fn log_line(row: &LedgerRow, locale: Locale) -> Option<LogLine> {
    match row {
        LedgerRow::Entry(entry) => Some(LogLine {
            day: entry.day.to_string(),
            kind: entry.kind.label(locale).to_string(),
            amount: format_stored_amount(entry.amount),
            source: entry.source.clone(),
            author: entry.author.clone(),
            note: entry.note.clone(),
        }),
        LedgerRow::Unrecognized(cells) => Some(LogLine {
            day: cell(cells, 0).to_string(),
            kind: cell(cells, 1).to_string(),
            amount: cell(cells, 2).to_string(),
            source: cell(cells, 3).to_string(),
            author: cell(cells, 4).to_string(),
            note: cell(cells, 5).to_string(),
        }),
        LedgerRow::Header { .. } | LedgerRow::Blank => None,
    }
}
