use std::collections::HashSet;
use std::sync::Arc;

use crate::core::time::Clock;

use super::month::{compare_recent_first, has_year_token, Locale};
use super::row::{Entry, Table};

/// Row range of one month inside the flat table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub label: String,
    pub header_index: usize,
    /// First entry row (the row after the header).
    pub start: usize,
    /// Exclusive end: the next header, the first row with an empty day, or the table end.
    pub end: usize,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Well-formed entries inside the segment, in file order.
    pub fn entries<'a>(&self, table: &'a Table) -> impl Iterator<Item = &'a Entry> + 'a {
        table.rows[self.start..self.end]
            .iter()
            .filter_map(|row| row.as_entry())
    }
}

/// Scans the table in order and returns every segment, duplicates included.
pub fn segments(table: &Table) -> Vec<Segment> {
    let mut found = Vec::new();
    for (idx, row) in table.rows.iter().enumerate() {
        let Some(label) = row.header_label() else {
            continue;
        };
        let start = idx + 1;
        let end = table.rows[start..]
            .iter()
            .position(|row| row.day_is_empty())
            .map(|offset| start + offset)
            .unwrap_or(table.len());
        found.push(Segment {
            label: label.to_string(),
            header_index: idx,
            start,
            end,
        });
    }
    found
}

/// First segment whose header equals `label`.
pub fn find_segment(table: &Table, label: &str) -> Option<Segment> {
    segments(table)
        .into_iter()
        .find(|segment| segment.label == label)
}

/// Distinct header labels carrying a year, most recent first.
pub fn all_month_labels(table: &Table) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut labels: Vec<String> = table
        .rows
        .iter()
        .filter_map(|row| row.header_label())
        .filter(|label| has_year_token(label))
        .filter(|label| seen.insert(label.to_string()))
        .map(str::to_string)
        .collect();
    labels.sort_by(|a, b| compare_recent_first(a, b));
    labels
}

/// Decides which month "now" belongs to. Every report and append goes through here.
#[derive(Clone)]
pub struct MonthSegmenter {
    locale: Locale,
    clock: Arc<dyn Clock>,
}

impl MonthSegmenter {
    pub fn new(locale: Locale, clock: Arc<dyn Clock>) -> Self {
        Self { locale, clock }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn current_label(&self) -> String {
        self.locale.label_for(self.clock.today())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::FixedClock;
    use crate::ledger::row::{EntryKind, LedgerRow};
    use chrono::NaiveDate;

    fn entry(day: u8, amount: f64) -> LedgerRow {
        LedgerRow::Entry(Entry::new(
            day,
            EntryKind::Income,
            amount,
            "cash",
            "Ann",
            "",
        ))
    }

    #[test]
    fn segment_ends_at_next_header() {
        let table = Table::new(vec![
            LedgerRow::header("март 2025"),
            entry(1, 10.0),
            entry(2, 20.0),
            LedgerRow::header("апрель 2025"),
            entry(3, 30.0),
        ]);
        let found = segments(&table);
        assert_eq!(found.len(), 2);
        assert_eq!((found[0].start, found[0].end), (1, 3));
        assert_eq!((found[1].start, found[1].end), (4, 5));
    }

    #[test]
    fn blank_row_terminates_a_segment() {
        let table = Table::new(vec![
            LedgerRow::header("март 2025"),
            entry(1, 10.0),
            LedgerRow::Blank,
            entry(2, 20.0),
        ]);
        let segment = find_segment(&table, "март 2025").expect("segment");
        assert_eq!(segment.len(), 1);
    }

    #[test]
    fn header_at_table_end_is_an_empty_segment() {
        let table = Table::new(vec![LedgerRow::header("май 2025")]);
        let segment = find_segment(&table, "май 2025").expect("segment");
        assert!(segment.is_empty());
    }

    #[test]
    fn month_labels_are_deduplicated_and_recent_first() {
        let table = Table::new(vec![
            LedgerRow::header("сентябрь 2025"),
            LedgerRow::header("октябрь 2025"),
            LedgerRow::header("сентябрь 2025"),
            LedgerRow::header("август 2025"),
        ]);
        assert_eq!(
            all_month_labels(&table),
            vec!["октябрь 2025", "сентябрь 2025", "август 2025"]
        );
    }

    #[test]
    fn current_label_uses_the_clock() {
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 11, 7).unwrap());
        let segmenter = MonthSegmenter::new(Locale::Ru, Arc::new(clock));
        assert_eq!(segmenter.current_label(), "ноябрь 2025");
    }
}
