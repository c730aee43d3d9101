//! Month-partitioned ledger model: rows, segments, mutation and reporting.

pub mod month;
pub mod mutator;
pub mod report;
pub mod row;
pub mod segment;

pub use month::{parse_label, Locale, YearMonth};
pub use mutator::{append, undo, Appended, Undone};
pub use report::{listing, totals, LogLine, MonthListing, MonthTotals};
pub use row::{Entry, EntryKind, LedgerRow, RawRow, Table, COLUMN_COUNT};
pub use segment::{all_month_labels, find_segment, segments, MonthSegmenter, Segment};
